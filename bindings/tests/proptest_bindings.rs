//! Property-based tests for the binding engine.
//!
//! Random operation sequences exercise the slot allocator's bookkeeping,
//! the subscript-to-offset math, and name normalization against small
//! independent models. These catch ordering and boundary mistakes that
//! fixed scenarios miss.

use std::collections::BTreeSet;

use bindings::{
    BaseType, BindError, BindingTable, IndexBase, Options, RoutineTable, Runtime, TypeTag,
    VarRequest, MAX_VARS,
};
use proptest::prelude::*;

// ============================================================================
// Helpers
// ============================================================================

fn int_tag() -> TypeTag {
    TypeTag::new(BaseType::Integer)
}

/// Checks every bookkeeping invariant the table promises.
fn check_bookkeeping(table: &BindingTable) {
    assert!(table.live() <= table.high_water());
    assert!(table.high_water() <= MAX_VARS);
    assert_eq!(table.iter().count(), table.live());
    if table.high_water() > 0 {
        assert!(table.binding(table.high_water() - 1).is_some());
    }
    assert!(table.binding(table.high_water()).is_none());

    let owned: usize = table.iter().map(|(_, b)| b.payload_bytes()).sum();
    assert_eq!(table.payload_bytes(), owned);
}

/// Strategy: distinct valid identifiers, already uppercase.
fn name_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[A-Z][A-Z0-9_]{0,12}", 1..40)
        .prop_map(|set| set.into_iter().collect())
}

#[derive(Clone, Debug)]
enum Op {
    Add,
    Delete(usize),
}

/// Strategy: a churn of adds and deletes over a small slot range.
fn op_sequence() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            2 => Just(Op::Add),
            1 => (0usize..80).prop_map(Op::Delete),
        ],
        1..120,
    )
}

/// Strategy: a random array shape plus one in-range point within it.
fn shape_and_point() -> impl Strategy<Value = (bool, Vec<i64>, Vec<i64>)> {
    (prop::bool::ANY, prop::collection::vec(2i64..9, 1..=4)).prop_flat_map(|(base_one, dims)| {
        let base = if base_one { 1 } else { 0 };
        let point: Vec<_> = dims.iter().map(|&bound| base..=bound).collect();
        (Just(base_one), Just(dims), point)
    })
}

// ============================================================================
// Slot allocator properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_added_names_are_found(names in name_set()) {
        let mut table = BindingTable::new();
        let mut indices = Vec::new();
        for name in &names {
            indices.push(
                table.add(name, int_tag(), 0, &[], 0, IndexBase::Zero).unwrap(),
            );
        }
        for (name, &index) in names.iter().zip(&indices) {
            assert_eq!(table.find(name, 0), (Some(index), Some(index)));
            assert_eq!(
                table.binding(index).unwrap().name().as_bytes(),
                name.as_bytes(),
            );
        }
        check_bookkeeping(&table);
    }

    #[test]
    fn prop_allocation_reuses_the_lowest_vacancy(
        adds in 2usize..50,
        deletions in prop::collection::hash_set(0usize..50, 1..10),
    ) {
        let mut table = BindingTable::new();
        for i in 0..adds {
            table
                .add(&format!("V{}", i), int_tag(), 0, &[], 0, IndexBase::Zero)
                .unwrap();
        }
        let mut live: BTreeSet<usize> = (0..adds).collect();
        for &index in &deletions {
            table.delete(index);
            live.remove(&index);
        }

        let expected = (0..).find(|i| !live.contains(i)).unwrap();
        let got = table
            .add("NEXT", int_tag(), 0, &[], 0, IndexBase::Zero)
            .unwrap();
        assert_eq!(got, expected);
        check_bookkeeping(&table);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_bookkeeping_survives_any_op_sequence(ops in op_sequence()) {
        let mut table = BindingTable::new();
        let mut counter = 0;
        for op in ops {
            match op {
                Op::Add => {
                    table
                        .add(&format!("V{}", counter), int_tag(), 0, &[], 0, IndexBase::Zero)
                        .unwrap();
                    counter += 1;
                }
                Op::Delete(index) => table.delete(index),
            }
            check_bookkeeping(&table);
        }
    }

    #[test]
    fn prop_delete_all_partitions_by_level(
        levels in prop::collection::vec(0u8..6, 1..80),
        cut in 1u8..6,
    ) {
        let mut table = BindingTable::new();
        for (i, &level) in levels.iter().enumerate() {
            table
                .add(&format!("V{}", i), int_tag(), level, &[], 0, IndexBase::Zero)
                .unwrap();
        }
        table.delete_all(cut);

        let expected = levels.iter().filter(|&&l| l < cut).count();
        assert_eq!(table.live(), expected);
        assert!(table.iter().all(|(_, b)| b.level() < cut));
        check_bookkeeping(&table);
    }
}

// ============================================================================
// Resolution properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_subscripts_map_into_the_allocation((base_one, dims, point) in shape_and_point()) {
        let base = if base_one { IndexBase::One } else { IndexBase::Zero };
        let mut rt = Runtime::with_options(Options { base, ..Options::default() });
        rt.resolve(&VarRequest {
            indices: Some(&dims),
            ..VarRequest::declare("a", 0)
        })
        .unwrap();

        let elements: usize = dims
            .iter()
            .map(|&bound| (bound - base.value() + 1) as usize)
            .product();

        let slot = rt
            .resolve(&VarRequest { indices: Some(&point), ..VarRequest::find("a", 0) })
            .unwrap()
            .unwrap();
        assert!(slot.element < elements);

        // the two corners pin the ends of the allocation
        let low: Vec<i64> = dims.iter().map(|_| base.value()).collect();
        let slot = rt
            .resolve(&VarRequest { indices: Some(&low), ..VarRequest::find("a", 0) })
            .unwrap()
            .unwrap();
        assert_eq!(slot.element, 0);

        let slot = rt
            .resolve(&VarRequest { indices: Some(&dims), ..VarRequest::find("a", 0) })
            .unwrap()
            .unwrap();
        assert_eq!(slot.element, elements - 1);
    }

    #[test]
    fn prop_resolution_uppercases_names(raw in "[a-z_][a-z0-9_.]{0,28}") {
        let mut rt = Runtime::new();
        let slot = rt.resolve(&VarRequest::find(&raw, 0)).unwrap().unwrap();
        let stored = rt.vars.binding(slot.index).unwrap().name().to_string();
        assert_eq!(stored, raw.to_ascii_uppercase());

        // the uppercase spelling resolves to the same slot
        let again = rt.resolve(&VarRequest::find(&stored, 0)).unwrap().unwrap();
        assert_eq!(again, slot);
    }

    #[test]
    fn prop_text_writes_round_trip_through_the_table(
        content in prop::collection::vec(any::<u8>(), 0..=40),
        capacity in 40usize..=255,
    ) {
        let mut rt = Runtime::new();
        let req = VarRequest {
            capacity: Some(capacity),
            ..VarRequest::find("s$", 0)
        };
        let slot = rt.resolve(&req).unwrap().unwrap();
        rt.vars.set_text(slot, &content).unwrap();
        assert_eq!(rt.vars.text_at(slot), Ok(&content[..]));
    }
}

// ============================================================================
// Routine table properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_prepared_routines_resolve_or_miss(names in name_set()) {
        let mut table = RoutineTable::new();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let _ = table.prepare(&refs);

        // every stored name maps to its own definition; bucket-collision
        // losers miss cleanly rather than aliasing another routine
        let mut hits = 0;
        for (i, name) in names.iter().enumerate() {
            match table.find(name) {
                Ok(routine) => {
                    assert_eq!(routine, i);
                    hits += 1;
                }
                Err(BindError::RoutineNotFound { .. }) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(hits, table.occupied());
    }
}
