pub mod payload;
pub mod text;


pub use payload::VarStore;
pub use text::{TextStore, MAX_CAPACITY};

/// Dialect integer scalar.
pub type BasicInt = i64;

/// Dialect floating-point scalar.
pub type BasicFloat = f64;

/// Bytes occupied by one numeric array element.
pub const NUMERIC_WIDTH: usize = std::mem::size_of::<BasicInt>();
