//! Fixed-capacity binding table.
//!
//! Slots are handed out lowest-index-first and addressed by stable index.
//! A high-water mark bounds every scan; freed slots below the mark are
//! remembered in a min-heap so reuse is also lowest-first.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use storage::{BasicFloat, BasicInt, VarStore, MAX_CAPACITY, NUMERIC_WIDTH};
use tracing::{debug, trace};

use crate::binding::{
    BaseType, Binding, DimBound, Storage, TypeTag, VarName, EMPTY_SHAPE, MAX_DIMS, MAX_VARS,
};
use crate::error::{BindError, BindResult};
use crate::options::IndexBase;

/// Largest payload a single binding may allocate.
const MAX_PAYLOAD_BYTES: usize = 1 << 28;

/// Location of one element inside the binding table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageRef {
    pub index: usize,
    pub element: usize,
}

/// Fixed arena of variable bindings.
pub struct BindingTable {
    slots: Vec<Option<Binding>>,
    high_water: usize,
    live: usize,
    free: BinaryHeap<Reverse<u32>>,
    payload_bytes: usize,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingTable {
    pub fn new() -> Self {
        BindingTable {
            slots: vec![None; MAX_VARS],
            high_water: 0,
            live: 0,
            free: BinaryHeap::new(),
            payload_bytes: 0,
        }
    }

    // --- Bookkeeping ---

    /// One past the highest occupied slot; bounds every scan.
    #[inline]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Occupied slot count.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Heap bytes owned by all payloads together.
    #[inline]
    pub fn payload_bytes(&self) -> usize {
        self.payload_bytes
    }

    /// Binding at `index`, if that slot is occupied.
    pub fn binding(&self, index: usize) -> Option<&Binding> {
        self.slots.get(index)?.as_ref()
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Binding)> {
        self.slots[..self.high_water]
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|b| (i, b)))
    }

    // --- Creation and teardown ---

    /// Creates a binding in the lowest vacant slot and returns its index.
    ///
    /// `dims` is empty for a scalar, `[EMPTY_SHAPE]` for an array with no
    /// shape yet, and up to eight bounds otherwise. The payload is zero
    /// initialized. Validation failures leave the table untouched. The
    /// name is truncated to 32 bytes; rejecting longer names is resolver
    /// policy.
    pub fn add(
        &mut self,
        name: &str,
        kind: TypeTag,
        level: u8,
        dims: &[DimBound],
        capacity: usize,
        base: IndexBase,
    ) -> BindResult<usize> {
        validate_dims(dims, base)?;
        let capacity = match kind.base {
            BaseType::String => {
                if !(1..=MAX_CAPACITY).contains(&capacity) {
                    return Err(BindError::InvalidStringLength { length: capacity });
                }
                capacity
            }
            _ => 0,
        };
        let width = match kind.base {
            BaseType::String => capacity + 1,
            _ => NUMERIC_WIDTH,
        };
        let elements = checked_elements(dims, base, width)?;
        let index = self.claim_slot()?;

        let store = if dims.first() == Some(&EMPTY_SHAPE) {
            VarStore::empty()
        } else {
            match (kind.base, dims.is_empty()) {
                (BaseType::Integer, true) => VarStore::scalar_int(),
                (BaseType::Integer, false) => VarStore::int_array(elements),
                (BaseType::Float, true) => VarStore::scalar_float(),
                (BaseType::Float, false) => VarStore::float_array(elements),
                (BaseType::String, true) => VarStore::scalar_text(capacity),
                (BaseType::String, false) => VarStore::text_array(elements, capacity),
            }
        };

        let mut dim_field = [0 as DimBound; MAX_DIMS];
        dim_field[..dims.len()].copy_from_slice(dims);

        let binding = Binding {
            name: VarName::new(name),
            kind,
            level,
            dims: dim_field,
            capacity: capacity as u8,
            storage: Storage::Owned(store),
        };
        self.payload_bytes += binding.payload_bytes();
        self.install(index, binding);
        Ok(index)
    }

    /// Creates a non-owning alias of the binding at `target`, as used for
    /// by-reference parameters. Type, shape, and capacity are copied; the
    /// payload is shared. Aliases of aliases collapse to the root slot.
    pub fn add_alias(&mut self, name: &str, level: u8, target: usize) -> BindResult<usize> {
        let root = match self.binding(target) {
            Some(b) => match b.storage {
                Storage::Borrowed(root) => root,
                Storage::Owned(_) => target,
            },
            None => return Err(BindError::VacantSlot { index: target }),
        };
        let (kind, dims, capacity) = match self.binding(root) {
            Some(b) => (b.kind, b.dims, b.capacity),
            None => return Err(BindError::VacantSlot { index: root }),
        };
        let index = self.claim_slot()?;
        let binding = Binding {
            name: VarName::new(name),
            kind,
            level,
            dims,
            capacity,
            storage: Storage::Borrowed(root),
        };
        self.install(index, binding);
        Ok(index)
    }

    fn install(&mut self, index: usize, binding: Binding) {
        trace!(index, level = binding.level, name = %binding.name, "bind");
        self.slots[index] = Some(binding);
        self.live += 1;
        if index >= self.high_water {
            self.high_water = index + 1;
        }
    }

    /// Lowest vacant slot index. A popped entry at or above the mark means
    /// the whole heap is stale: the mark position itself is then the
    /// lowest vacancy.
    fn claim_slot(&mut self) -> BindResult<usize> {
        if let Some(&Reverse(idx)) = self.free.peek() {
            if (idx as usize) < self.high_water {
                self.free.pop();
                return Ok(idx as usize);
            }
            self.free.clear();
        }
        if self.high_water < MAX_VARS {
            Ok(self.high_water)
        } else {
            Err(BindError::TableFull)
        }
    }

    /// Vacates a slot. Owned payloads are dropped; aliases never touch
    /// their target. Vacant or out-of-range indices are a no-op.
    pub fn delete(&mut self, index: usize) {
        let binding = match self.slots.get_mut(index) {
            Some(slot) => match slot.take() {
                Some(binding) => binding,
                None => return,
            },
            None => return,
        };
        self.live -= 1;
        self.payload_bytes -= binding.payload_bytes();
        if index + 1 == self.high_water {
            let mut mark = index;
            while mark > 0 && self.slots[mark - 1].is_none() {
                mark -= 1;
            }
            self.high_water = mark;
        } else {
            self.free.push(Reverse(index as u32));
        }
    }

    /// Deletes every binding at `min_level` or deeper. `delete_all(0)`
    /// resets the table completely. Idempotent.
    pub fn delete_all(&mut self, min_level: u8) {
        if min_level == 0 {
            debug!(dropped = self.live, "binding table reset");
            for slot in &mut self.slots[..self.high_water] {
                *slot = None;
            }
            self.high_water = 0;
            self.live = 0;
            self.free.clear();
            self.payload_bytes = 0;
            return;
        }
        for index in (0..self.high_water).rev() {
            let doomed = match &self.slots[index] {
                Some(binding) => binding.level >= min_level,
                None => false,
            };
            if doomed {
                self.delete(index);
            }
        }
    }

    // --- Lookup ---

    /// Looks `name` up at `level`, also reporting any global with the same
    /// name. Keys are compared byte-exact over their first 32 bytes;
    /// callers normalize case beforehand.
    pub fn find(&self, name: &str, level: u8) -> (Option<usize>, Option<usize>) {
        let mut at_level = None;
        let mut global = None;
        for (index, binding) in self.iter() {
            if !binding.name.matches(name) {
                continue;
            }
            if binding.level == 0 && global.is_none() {
                global = Some(index);
            }
            if binding.level == level && at_level.is_none() {
                at_level = Some(index);
            }
            if at_level.is_some() && global.is_some() {
                break;
            }
        }
        (at_level, global)
    }

    // --- Element access ---

    /// Integer element read.
    pub fn int_at(&self, at: StorageRef) -> BindResult<BasicInt> {
        self.check_kind(at.index, BaseType::Integer)?;
        let root = self.root_of(at.index)?;
        match self.owned_store(root)?.int_at(at.element) {
            Some(value) => Ok(value),
            None => Err(BindError::IndexOutOfBounds),
        }
    }

    pub fn set_int(&mut self, at: StorageRef, value: BasicInt) -> BindResult<()> {
        self.check_kind(at.index, BaseType::Integer)?;
        let root = self.root_of(at.index)?;
        if self.owned_store_mut(root)?.set_int_at(at.element, value) {
            Ok(())
        } else {
            Err(BindError::IndexOutOfBounds)
        }
    }

    /// Float element read.
    pub fn float_at(&self, at: StorageRef) -> BindResult<BasicFloat> {
        self.check_kind(at.index, BaseType::Float)?;
        let root = self.root_of(at.index)?;
        match self.owned_store(root)?.float_at(at.element) {
            Some(value) => Ok(value),
            None => Err(BindError::IndexOutOfBounds),
        }
    }

    pub fn set_float(&mut self, at: StorageRef, value: BasicFloat) -> BindResult<()> {
        self.check_kind(at.index, BaseType::Float)?;
        let root = self.root_of(at.index)?;
        if self.owned_store_mut(root)?.set_float_at(at.element, value) {
            Ok(())
        } else {
            Err(BindError::IndexOutOfBounds)
        }
    }

    /// String element read.
    pub fn text_at(&self, at: StorageRef) -> BindResult<&[u8]> {
        self.check_kind(at.index, BaseType::String)?;
        let root = self.root_of(at.index)?;
        match self.owned_store(root)?.text_at(at.element) {
            Some(bytes) => Ok(bytes),
            None => Err(BindError::IndexOutOfBounds),
        }
    }

    pub fn set_text(&mut self, at: StorageRef, bytes: &[u8]) -> BindResult<()> {
        self.check_kind(at.index, BaseType::String)?;
        let root = self.root_of(at.index)?;
        let capacity = match self.binding(root) {
            Some(binding) => binding.capacity as usize,
            None => return Err(BindError::VacantSlot { index: root }),
        };
        if bytes.len() > capacity {
            return Err(BindError::StringTooLong);
        }
        if self.owned_store_mut(root)?.set_text_at(at.element, bytes) {
            Ok(())
        } else {
            Err(BindError::IndexOutOfBounds)
        }
    }

    fn check_kind(&self, index: usize, want: BaseType) -> BindResult<()> {
        match self.binding(index) {
            Some(binding) if binding.kind.base == want => Ok(()),
            Some(binding) => Err(BindError::ConflictingType {
                name: binding.name.to_string(),
            }),
            None => Err(BindError::VacantSlot { index }),
        }
    }

    /// Follows an alias to the slot that owns the payload.
    fn root_of(&self, index: usize) -> BindResult<usize> {
        match self.binding(index) {
            Some(binding) => match binding.storage {
                Storage::Borrowed(root) => Ok(root),
                Storage::Owned(_) => Ok(index),
            },
            None => Err(BindError::VacantSlot { index }),
        }
    }

    fn owned_store(&self, root: usize) -> BindResult<&VarStore> {
        match self.binding(root) {
            Some(binding) => match &binding.storage {
                Storage::Owned(store) => Ok(store),
                Storage::Borrowed(_) => Err(BindError::VacantSlot { index: root }),
            },
            None => Err(BindError::VacantSlot { index: root }),
        }
    }

    fn owned_store_mut(&mut self, root: usize) -> BindResult<&mut VarStore> {
        match self.slots.get_mut(root).and_then(Option::as_mut) {
            Some(binding) => match &mut binding.storage {
                Storage::Owned(store) => Ok(store),
                Storage::Borrowed(_) => Err(BindError::VacantSlot { index: root }),
            },
            None => Err(BindError::VacantSlot { index: root }),
        }
    }
}

/// Checks a declared dimension list: at most eight entries, the empty
/// shape sentinel only as the sole entry, every bound above the index
/// base. The `DimBound` type itself caps bounds at 32767.
fn validate_dims(dims: &[DimBound], base: IndexBase) -> BindResult<()> {
    if dims.len() > MAX_DIMS {
        return Err(BindError::InvalidDimensions);
    }
    if dims.first() == Some(&EMPTY_SHAPE) {
        return if dims.len() == 1 {
            Ok(())
        } else {
            Err(BindError::InvalidDimensions)
        };
    }
    for &bound in dims {
        if (bound as i64) <= base.value() {
            return Err(BindError::InvalidDimensions);
        }
    }
    Ok(())
}

/// Element count for a validated dimension list, guarding the product and
/// the resulting allocation size.
fn checked_elements(dims: &[DimBound], base: IndexBase, width: usize) -> BindResult<usize> {
    if dims.first() == Some(&EMPTY_SHAPE) {
        return Ok(0);
    }
    let mut elements: usize = 1;
    for &bound in dims {
        let per_dim = (bound as i64 - base.value() + 1) as usize;
        elements = match elements.checked_mul(per_dim) {
            Some(elements) => elements,
            None => return Err(BindError::OutOfMemory),
        };
    }
    match elements.checked_mul(width) {
        Some(bytes) if bytes <= MAX_PAYLOAD_BYTES => Ok(elements),
        _ => Err(BindError::OutOfMemory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_validation() {
        let base = IndexBase::Zero;
        assert!(validate_dims(&[], base).is_ok());
        assert!(validate_dims(&[10], base).is_ok());
        assert!(validate_dims(&[EMPTY_SHAPE], base).is_ok());
        assert_eq!(
            validate_dims(&[EMPTY_SHAPE, 5], base),
            Err(BindError::InvalidDimensions)
        );
        assert_eq!(validate_dims(&[0], base), Err(BindError::InvalidDimensions));
        assert_eq!(
            validate_dims(&[5, -3], base),
            Err(BindError::InvalidDimensions)
        );
        assert_eq!(
            validate_dims(&[1; 9], base),
            Err(BindError::InvalidDimensions)
        );
        assert_eq!(
            validate_dims(&[1], IndexBase::One),
            Err(BindError::InvalidDimensions)
        );
        assert!(validate_dims(&[2], IndexBase::One).is_ok());
    }

    #[test]
    fn element_counts_respect_base() {
        assert_eq!(checked_elements(&[10], IndexBase::Zero, 8), Ok(11));
        assert_eq!(checked_elements(&[10], IndexBase::One, 8), Ok(10));
        assert_eq!(checked_elements(&[2, 4], IndexBase::Zero, 8), Ok(15));
        assert_eq!(checked_elements(&[EMPTY_SHAPE], IndexBase::Zero, 8), Ok(0));
        assert_eq!(checked_elements(&[], IndexBase::Zero, 8), Ok(1));
    }

    #[test]
    fn oversized_payloads_are_rejected() {
        let dims = [32767; 8];
        assert_eq!(
            checked_elements(&dims, IndexBase::Zero, 8),
            Err(BindError::OutOfMemory)
        );
    }
}
