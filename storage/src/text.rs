//! Length-prefixed string cells.
//!
//! A string payload is one allocation holding one or more fixed-capacity
//! cells. Each cell spans `capacity + 1` bytes: the first byte is the
//! current length, the rest is content. Cell contents are raw bytes; the
//! dialect does not require UTF-8.

use std::fmt;

/// Largest usable cell capacity. The length prefix is a single byte.
pub const MAX_CAPACITY: usize = 255;

/// A block of fixed-capacity, length-prefixed string cells.
#[derive(Clone, PartialEq, Eq)]
pub struct TextStore {
    data: Box<[u8]>,
    capacity: u8,
}

impl TextStore {
    /// Allocates `cells` zeroed cells of the given capacity. Every cell
    /// starts out as the empty string.
    ///
    /// `capacity` must be in `1..=MAX_CAPACITY`; callers validate user
    /// input before allocating.
    pub fn new(cells: usize, capacity: usize) -> Self {
        debug_assert!(cells >= 1);
        debug_assert!((1..=MAX_CAPACITY).contains(&capacity));
        TextStore {
            data: vec![0u8; cells * (capacity + 1)].into_boxed_slice(),
            capacity: capacity as u8,
        }
    }

    /// Cell capacity in content bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Distance in bytes between consecutive cells.
    #[inline]
    pub fn stride(&self) -> usize {
        self.capacity as usize + 1
    }

    /// Number of cells in the block.
    #[inline]
    pub fn cells(&self) -> usize {
        self.data.len() / self.stride()
    }

    /// Total allocation size in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Content of cell `i`, or `None` when `i` is out of range.
    pub fn cell(&self, i: usize) -> Option<&[u8]> {
        let start = self.cell_start(i)?;
        let len = self.data[start] as usize;
        Some(&self.data[start + 1..start + 1 + len])
    }

    /// Stores `bytes` into cell `i`. False when `i` is out of range or the
    /// content does not fit the cell capacity.
    pub fn write_cell(&mut self, i: usize, bytes: &[u8]) -> bool {
        if bytes.len() > self.capacity as usize {
            return false;
        }
        let start = match self.cell_start(i) {
            Some(start) => start,
            None => return false,
        };
        self.data[start] = bytes.len() as u8;
        self.data[start + 1..start + 1 + bytes.len()].copy_from_slice(bytes);
        true
    }

    /// Resets cell `i` to the empty string. False when `i` is out of range.
    pub fn clear_cell(&mut self, i: usize) -> bool {
        match self.cell_start(i) {
            Some(start) => {
                self.data[start] = 0;
                true
            }
            None => false,
        }
    }

    fn cell_start(&self, i: usize) -> Option<usize> {
        let start = i.checked_mul(self.stride())?;
        if start + self.stride() <= self.data.len() {
            Some(start)
        } else {
            None
        }
    }
}

impl fmt::Debug for TextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStore")
            .field("cells", &self.cells())
            .field("capacity", &self.capacity)
            .finish()
    }
}
