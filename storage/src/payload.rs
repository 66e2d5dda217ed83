//! Binding payloads.

use crate::text::TextStore;
use crate::{BasicFloat, BasicInt, NUMERIC_WIDTH};

/// Storage owned by a single binding.
///
/// Numeric scalars live inline and cost no heap allocation. Arrays and
/// strings own exactly one allocation each. `Empty` is the payload of an
/// array declared with no shape yet.
#[derive(Clone, Debug, PartialEq)]
pub enum VarStore {
    Int(BasicInt),
    Float(BasicFloat),
    Text(TextStore),
    IntArray(Box<[BasicInt]>),
    FloatArray(Box<[BasicFloat]>),
    Empty,
}

impl VarStore {
    // --- Constructors ---

    #[inline]
    pub fn scalar_int() -> Self {
        VarStore::Int(0)
    }

    #[inline]
    pub fn scalar_float() -> Self {
        VarStore::Float(0.0)
    }

    pub fn scalar_text(capacity: usize) -> Self {
        VarStore::Text(TextStore::new(1, capacity))
    }

    pub fn int_array(elements: usize) -> Self {
        VarStore::IntArray(vec![0; elements].into_boxed_slice())
    }

    pub fn float_array(elements: usize) -> Self {
        VarStore::FloatArray(vec![0.0; elements].into_boxed_slice())
    }

    pub fn text_array(elements: usize, capacity: usize) -> Self {
        VarStore::Text(TextStore::new(elements, capacity))
    }

    #[inline]
    pub fn empty() -> Self {
        VarStore::Empty
    }

    // --- Introspection ---

    /// Heap bytes owned by this payload.
    pub fn byte_size(&self) -> usize {
        match self {
            VarStore::Int(_) | VarStore::Float(_) | VarStore::Empty => 0,
            VarStore::Text(t) => t.byte_len(),
            VarStore::IntArray(a) => a.len() * NUMERIC_WIDTH,
            VarStore::FloatArray(a) => a.len() * NUMERIC_WIDTH,
        }
    }

    /// Number of addressable elements: 1 for scalars, 0 for `Empty`.
    pub fn elements(&self) -> usize {
        match self {
            VarStore::Int(_) | VarStore::Float(_) => 1,
            VarStore::Text(t) => t.cells(),
            VarStore::IntArray(a) => a.len(),
            VarStore::FloatArray(a) => a.len(),
            VarStore::Empty => 0,
        }
    }

    /// Cell capacity, for text payloads only.
    pub fn text_capacity(&self) -> Option<usize> {
        match self {
            VarStore::Text(t) => Some(t.capacity()),
            _ => None,
        }
    }

    // --- Element access ---

    /// Integer element at flat offset `i`. Scalars answer only offset 0.
    pub fn int_at(&self, i: usize) -> Option<BasicInt> {
        match self {
            VarStore::Int(v) if i == 0 => Some(*v),
            VarStore::IntArray(a) => a.get(i).copied(),
            _ => None,
        }
    }

    pub fn set_int_at(&mut self, i: usize, value: BasicInt) -> bool {
        match self {
            VarStore::Int(v) if i == 0 => {
                *v = value;
                true
            }
            VarStore::IntArray(a) => match a.get_mut(i) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Float element at flat offset `i`. Scalars answer only offset 0.
    pub fn float_at(&self, i: usize) -> Option<BasicFloat> {
        match self {
            VarStore::Float(v) if i == 0 => Some(*v),
            VarStore::FloatArray(a) => a.get(i).copied(),
            _ => None,
        }
    }

    pub fn set_float_at(&mut self, i: usize, value: BasicFloat) -> bool {
        match self {
            VarStore::Float(v) if i == 0 => {
                *v = value;
                true
            }
            VarStore::FloatArray(a) => match a.get_mut(i) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// String content at flat cell `i`.
    pub fn text_at(&self, i: usize) -> Option<&[u8]> {
        match self {
            VarStore::Text(t) => t.cell(i),
            _ => None,
        }
    }

    /// Stores `bytes` into cell `i`. False when the payload is not text,
    /// the cell is out of range, or the content does not fit.
    pub fn set_text_at(&mut self, i: usize, bytes: &[u8]) -> bool {
        match self {
            VarStore::Text(t) => t.write_cell(i, bytes),
            _ => false,
        }
    }
}
