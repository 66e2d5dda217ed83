//! Session options that govern binding behavior.

use serde::{Deserialize, Serialize};

use crate::binding::BaseType;

/// Lowest valid array subscript (OPTION BASE).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexBase {
    #[default]
    Zero,
    One,
}

impl IndexBase {
    /// The base as a bound-comparable value.
    #[inline]
    pub fn value(self) -> i64 {
        match self {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }
}

/// Interpreter options consulted during resolution. Hosts persist these
/// between sessions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// OPTION BASE 0|1: lowest valid subscript for every array.
    pub base: IndexBase,
    /// OPTION DEFAULT: type taken by suffixless names. `None` means the
    /// program must spell every type out.
    pub default_type: Option<BaseType>,
    /// OPTION EXPLICIT: variables must be declared before use.
    pub explicit: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            base: IndexBase::Zero,
            default_type: Some(BaseType::Float),
            explicit: false,
        }
    }
}
