//! Variable and routine binding for the Meridian BASIC interpreter.
//!
//! Three pieces cooperate:
//!
//! - [`BindingTable`]: a fixed 1024-slot arena of variable bindings,
//!   addressed by stable index. Scalars, arrays of one to eight
//!   dimensions, and fixed-capacity string buffers.
//! - [`Runtime::resolve`]: turns raw identifiers into table slots,
//!   applying two-tier (local/global) scoping, type-suffix discipline,
//!   and the creation rules of each access mode.
//! - [`RoutineTable`]: a fixed hash table from subroutine and function
//!   names to their position in the program's definition list.
//!
//! Everything is single-threaded and keeps no global state.

pub mod binding;
pub mod error;
pub mod options;
pub mod resolver;
pub mod routines;
pub mod runtime;
pub mod table;

pub use binding::{
    BaseType, Binding, DimBound, Storage, TypeTag, VarName, EMPTY_SHAPE, MAX_BOUND, MAX_DIMS,
    MAX_NAME, MAX_VARS,
};
pub use error::{BindError, BindResult};
pub use options::{IndexBase, Options};
pub use resolver::{AccessMode, VarRequest};
pub use routines::{RoutineEntry, RoutineTable, MAX_ROUTINES};
pub use runtime::Runtime;
pub use table::{BindingTable, StorageRef};
