//! Subroutine and function name table.
//!
//! A fixed bucket array maps normalized routine names to their position in
//! the program's routine definition list. The table is rebuilt once per
//! program load and read for the rest of the run. Collisions are not
//! probed: a routine whose bucket is already taken is a duplicate, and the
//! first definition wins.

use tracing::debug;

use crate::binding::{VarName, MAX_NAME};
use crate::error::{BindError, BindResult};

/// Bucket count. Bucket 0 is reserved; the hash never produces it.
pub const MAX_ROUTINES: usize = 512;

/// One routine header: normalized name and definition-list position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutineEntry {
    name: VarName,
    routine: usize,
}

impl RoutineEntry {
    #[inline]
    pub fn name(&self) -> &VarName {
        &self.name
    }

    /// Position of the routine's header in the definition list.
    #[inline]
    pub fn routine(&self) -> usize {
        self.routine
    }
}

/// Fixed-capacity routine name table.
pub struct RoutineTable {
    buckets: Box<[Option<RoutineEntry>]>,
    occupied: usize,
}

impl Default for RoutineTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutineTable {
    pub fn new() -> Self {
        RoutineTable {
            buckets: vec![None; MAX_ROUTINES].into_boxed_slice(),
            occupied: 0,
        }
    }

    /// Number of routines currently stored.
    #[inline]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Empties the table.
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            *bucket = None;
        }
        self.occupied = 0;
    }

    /// Rebuilds the table from routine header names in definition order.
    ///
    /// Later names whose bucket is already occupied are discarded, and
    /// over-long names are stored truncated; both are reported. The whole
    /// list is always processed, the first error is the one returned, and
    /// the table stays usable either way.
    pub fn prepare(&mut self, names: &[&str]) -> BindResult<()> {
        self.clear();
        let mut first_err = None;
        for (routine, raw) in names.iter().enumerate() {
            if let Err(e) = self.insert(raw, routine) {
                first_err.get_or_insert(e);
            }
        }
        debug!(routines = self.occupied, "routine table prepared");
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn insert(&mut self, raw: &str, routine: usize) -> BindResult<()> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(BindError::InvalidName {
                name: raw.to_string(),
            });
        }
        let name = VarName::new(&normalized);
        let bucket = bucket_for(name.as_bytes());
        let stored = match &self.buckets[bucket] {
            None => {
                self.buckets[bucket] = Some(RoutineEntry { name, routine });
                self.occupied += 1;
                true
            }
            Some(_) => false,
        };
        if normalized.len() > MAX_NAME {
            return Err(BindError::NameTooLong { name: normalized });
        }
        if !stored {
            return Err(BindError::DuplicateRoutine { name: normalized });
        }
        Ok(())
    }

    /// Looks a routine up by raw source text. The name ends at the first
    /// character that cannot appear in an identifier, so `"Foo ("`,
    /// `"FOO("`, and `"foo"` all resolve the same routine.
    ///
    /// An over-long name is its own error, kept distinct from a miss.
    pub fn find(&self, raw: &str) -> BindResult<usize> {
        let normalized = normalize(raw);
        if normalized.len() > MAX_NAME {
            return Err(BindError::NameTooLong { name: normalized });
        }
        match self.lookup(&normalized) {
            Some(entry) => Ok(entry.routine),
            None => Err(BindError::RoutineNotFound { name: normalized }),
        }
    }

    /// True when `normalized` (already uppercased and suffix-free) names a
    /// routine.
    pub(crate) fn contains(&self, normalized: &str) -> bool {
        self.lookup(normalized).is_some()
    }

    fn lookup(&self, normalized: &str) -> Option<&RoutineEntry> {
        if normalized.is_empty() {
            return None;
        }
        let bytes = normalized.as_bytes();
        let key = &bytes[..bytes.len().min(MAX_NAME)];
        let entry = self.buckets[bucket_for(key)].as_ref()?;
        if entry.name.as_bytes() == key {
            Some(entry)
        } else {
            None
        }
    }
}

/// Uppercased identifier prefix of `raw`: everything up to the first
/// character that cannot appear in a routine name.
fn normalize(raw: &str) -> String {
    raw.chars()
        .take_while(|&c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// FNV-1a over the significant name bytes, folded into `1..MAX_ROUTINES`.
fn bucket_for(key: &[u8]) -> usize {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for &byte in key {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    1 + (hash % (MAX_ROUTINES as u64 - 1)) as usize
}
