//! Binding records and their fixed-layout fields.

use std::fmt;

use serde::{Deserialize, Serialize};
use storage::VarStore;

/// Binding table capacity.
pub const MAX_VARS: usize = 1024;

/// Most dimensions an array may declare.
pub const MAX_DIMS: usize = 8;

/// Significant characters in a variable or routine name.
pub const MAX_NAME: usize = 32;

/// Largest declarable per-dimension bound. `DimBound` enforces it by
/// construction; resolver input is checked against it before narrowing.
pub const MAX_BOUND: i64 = i16::MAX as i64;

/// Per-dimension bound as stored in a binding.
pub type DimBound = i16;

/// Sentinel in the first dimension slot marking an array declared with no
/// shape yet.
pub const EMPTY_SHAPE: DimBound = -1;

/// Fixed-width variable name: the first 32 bytes of an identifier.
///
/// Exactly 32 significant characters fill the field with no terminator.
/// Longer input is truncated here; rejecting it is resolver policy.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VarName {
    bytes: [u8; MAX_NAME],
    len: u8,
}

impl VarName {
    pub fn new(name: &str) -> Self {
        let src = name.as_bytes();
        let len = src.len().min(MAX_NAME);
        let mut bytes = [0u8; MAX_NAME];
        bytes[..len].copy_from_slice(&src[..len]);
        VarName {
            bytes,
            len: len as u8,
        }
    }

    /// Significant bytes of the name.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// True when `key` names this binding. Keys longer than the field
    /// compare by their first 32 bytes.
    pub fn matches(&self, key: &str) -> bool {
        let key = key.as_bytes();
        let key = &key[..key.len().min(MAX_NAME)];
        self.as_bytes() == key
    }
}

impl fmt::Display for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarName({})", self)
    }
}

/// Value types a binding can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseType {
    Integer,
    Float,
    String,
}

/// A binding's type plus where it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeTag {
    pub base: BaseType,
    /// Type supplied by a declaration context rather than a name suffix.
    pub implied: bool,
}

impl TypeTag {
    #[inline]
    pub fn new(base: BaseType) -> Self {
        TypeTag {
            base,
            implied: false,
        }
    }

    #[inline]
    pub fn implied(base: BaseType) -> Self {
        TypeTag {
            base,
            implied: true,
        }
    }
}

/// How a binding holds its payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Storage {
    /// The binding owns its payload.
    Owned(VarStore),
    /// Non-owning alias of another slot's payload, used for by-reference
    /// parameters. Always points at an `Owned` slot.
    Borrowed(usize),
}

/// One live entry in the binding table.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub(crate) name: VarName,
    pub(crate) kind: TypeTag,
    pub(crate) level: u8,
    pub(crate) dims: [DimBound; MAX_DIMS],
    pub(crate) capacity: u8,
    pub(crate) storage: Storage,
}

impl Binding {
    #[inline]
    pub fn name(&self) -> &VarName {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> TypeTag {
        self.kind
    }

    /// Scope level: 0 is global, frames count up from 1.
    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Declared bounds, one per dimension. Empty for scalars.
    pub fn dims(&self) -> &[DimBound] {
        &self.dims[..self.dims_count()]
    }

    /// Number of declared dimensions (0 for scalars).
    pub fn dims_count(&self) -> usize {
        self.dims.iter().take_while(|&&d| d != 0).count()
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.dims[0] != 0
    }

    /// True for an array declared with the empty shape.
    #[inline]
    pub fn is_empty_shape(&self) -> bool {
        self.dims[0] == EMPTY_SHAPE
    }

    /// String cell capacity; 0 for numeric bindings.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Heap bytes owned by this binding's payload. Aliases own nothing.
    pub fn payload_bytes(&self) -> usize {
        match &self.storage {
            Storage::Owned(store) => store.byte_size(),
            Storage::Borrowed(_) => 0,
        }
    }
}
