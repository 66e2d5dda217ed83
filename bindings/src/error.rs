//! Error taxonomy for binding and routine lookup.

use thiserror::Error;

/// Result alias used across the crate.
pub type BindResult<T> = Result<T, BindError>;

/// Everything the binding table, resolver, and routine table can report.
///
/// Every failure is a synchronous `Err`; nothing in this crate panics on
/// user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// All binding slots are occupied.
    #[error("too many variables")]
    TableFull,

    /// Malformed dimension list: too many dimensions, a bound at or below
    /// the index base, or a misplaced empty-shape sentinel.
    #[error("invalid dimensions")]
    InvalidDimensions,

    /// More than 32 significant characters in a variable or routine name.
    #[error("name too long: {name}")]
    NameTooLong { name: String },

    /// The identifier is not a legal name.
    #[error("invalid name: {name}")]
    InvalidName { name: String },

    /// No type suffix, no declared type, and the session default is NONE.
    #[error("variable type not specified")]
    TypeNotSpecified,

    /// The reference's type disagrees with the binding, or a suffix
    /// contradicts the declaration context.
    #[error("conflicting type for {name}")]
    ConflictingType { name: String },

    /// Declaration of a name that already has a binding in scope.
    #[error("{name} is already declared")]
    AlreadyDeclared { name: String },

    /// Subscript count or scalar/array shape does not match the binding.
    #[error("array dimension mismatch for {name}")]
    ArrayDimensionMismatch { name: String },

    /// A subscript lies outside `[base, bound]` for its dimension.
    #[error("index out of bounds")]
    IndexOutOfBounds,

    /// Lookup miss in a mode that requires the binding to exist.
    #[error("cannot find {name}")]
    VariableNotFound { name: String },

    /// Implicit creation is off (explicit declarations required) and the
    /// name has no binding.
    #[error("{name} is not declared")]
    VariableNotDeclared { name: String },

    /// A variable may not share its name with a subroutine or function.
    #[error("a sub/function has the same name: {name}")]
    NameCollidesWithRoutine { name: String },

    /// Two routine headers landed in the same hash bucket.
    #[error("duplicate routine: {name}")]
    DuplicateRoutine { name: String },

    /// Routine lookup miss.
    #[error("routine not found: {name}")]
    RoutineNotFound { name: String },

    /// String capacity outside `1..=255`.
    #[error("invalid string length: {length} (valid is 1 to 255)")]
    InvalidStringLength { length: usize },

    /// A string value longer than the cell capacity.
    #[error("string too long")]
    StringTooLong,

    /// Element access through an index whose slot is vacant.
    #[error("vacant binding slot: {index}")]
    VacantSlot { index: usize },

    /// A single payload would exceed the allocation ceiling.
    #[error("not enough memory")]
    OutOfMemory,
}
