//! Interpreter-facing context.

use tracing::debug;

use crate::error::BindResult;
use crate::options::Options;
use crate::routines::RoutineTable;
use crate::table::BindingTable;

/// Owns the session options, the variable binding table, and the routine
/// table for one interpreter instance. Nothing lives in process globals;
/// hosts thread a `Runtime` through every call.
pub struct Runtime {
    pub options: Options,
    pub vars: BindingTable,
    pub routines: RoutineTable,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Runtime {
            options,
            vars: BindingTable::new(),
            routines: RoutineTable::new(),
        }
    }

    /// Rebuilds the routine table from routine header names in definition
    /// order.
    pub fn prepare_routines(&mut self, names: &[&str]) -> BindResult<()> {
        self.routines.prepare(names)
    }

    /// Routine index for a raw source reference.
    pub fn find_routine(&self, raw: &str) -> BindResult<usize> {
        self.routines.find(raw)
    }

    /// Drops every binding at `level` and deeper (subroutine exit).
    pub fn release_frame(&mut self, level: u8) {
        self.vars.delete_all(level);
    }

    /// Clears variables and routines for a fresh program. Options are
    /// session state and survive.
    pub fn clear_program(&mut self) {
        debug!("program state cleared");
        self.vars.delete_all(0);
        self.routines.clear();
    }
}
