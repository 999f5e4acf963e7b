//! Integration test: dense and lite backends are observably identical.
//!
//! The scripted run compares every query result, the live state, memory
//! accounting and the post-reset state. The property test drives both
//! backends through arbitrary operation sequences, invalid ones included,
//! and compares every outcome.

use proptest::prelude::*;
use tessera_core::{AttrValue, FrameError};
use tessera_frame::{BackendKind, Frame, SnapshotQuery};
use tessera_test_utils::fixtures::{dump_live, storage_frame, Consumer, Storage};
use tessera_test_utils::run_script;

#[test]
fn scripted_run_matches() {
    let dense = run_script(BackendKind::Dense).unwrap();
    let lite = run_script(BackendKind::Lite).unwrap();
    assert_eq!(dense, lite);
}

#[test]
fn scripted_run_values() {
    let trace = run_script(BackendKind::Lite).unwrap();
    assert_eq!(trace.held_ticks, vec![2, 3, 4, 5]);

    let i = AttrValue::Int32;
    let u16v = AttrValue::UInt16;
    let u32v = AttrValue::UInt32;
    let f64v = AttrValue::Float64;

    // consumer, ticks [5, 4], indices [1, 0], attrs [orders, demand, price]
    assert_eq!(
        trace.results[1].values(),
        &[
            u32v(0), u32v(2), u32v(4), u16v(15), f64v(0.0),
            u16v(12), f64v(6.25),
            u32v(0), u32v(2), u32v(4), u16v(9), f64v(0.0),
            u16v(12), f64v(5.0),
        ]
    );
    // storage, tick 2, index 1, product_number
    assert_eq!(trace.results[2].values(), &[i(1)]);
    // storage over every held tick: 4 ticks x 3 instances x 3 attributes
    assert_eq!(trace.results[0].counts().count(), 36);

    assert!(trace.after_reset.iter().flatten().all(|v| v.to_f64() == 0.0));
    assert!(trace.live.len() == trace.after_reset.len());
}

#[derive(Clone, Debug)]
enum Op {
    SetCapacity(usize, i64),
    SetPosition(usize, usize, f32),
    Append(usize, i32),
    AppendFloat(usize, f64),
    SetList(usize, Vec<i32>),
    ClearList(usize),
    SetDemand(usize, u32),
    SetFacility(usize, i64),
    Seal(usize),
    Snapshot(u64),
    Restore(u64),
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    // Index 3 is out of range for storage, 2 and 3 for consumer.
    let index = 0usize..4;
    prop_oneof![
        (index.clone(), any::<i64>()).prop_map(|(i, v)| Op::SetCapacity(i, v)),
        (index.clone(), 0usize..3, -100.0f32..100.0).prop_map(|(i, s, v)| Op::SetPosition(i, s, v)),
        (index.clone(), any::<i32>()).prop_map(|(i, v)| Op::Append(i, v)),
        (index.clone(), -4.0f64..4.0).prop_map(|(i, v)| Op::AppendFloat(i, v)),
        (index.clone(), prop::collection::vec(any::<i32>(), 0..5)).prop_map(|(i, v)| Op::SetList(i, v)),
        index.clone().prop_map(Op::ClearList),
        (index.clone(), 0u32..70_000).prop_map(|(i, v)| Op::SetDemand(i, v)),
        (index.clone(), any::<i64>()).prop_map(|(i, v)| Op::SetFacility(i, v)),
        index.prop_map(Op::Seal),
        (0u64..6).prop_map(Op::Snapshot),
        (0u64..6).prop_map(Op::Restore),
        Just(Op::Reset),
    ]
}

fn apply(frame: &mut Frame, op: &Op) -> Result<(), FrameError> {
    let s = Storage::NAME;
    match op {
        Op::SetCapacity(i, v) => frame.set(s, *i, "capacity", *v),
        Op::SetPosition(i, slot, v) => frame.set_slot(s, *i, "position", *slot, *v),
        Op::Append(i, v) => frame.append(s, *i, "product_number", *v),
        Op::AppendFloat(i, v) => frame.append(s, *i, "product_number", *v),
        Op::SetList(i, v) => {
            let values: Vec<AttrValue> = v.iter().map(|&x| x.into()).collect();
            frame.set_list(s, *i, "product_number", &values)
        }
        Op::ClearList(i) => frame.clear_list(s, *i, "product_number"),
        Op::SetDemand(i, v) => frame.set(Consumer::NAME, *i, "demand", *v),
        Op::SetFacility(i, v) => frame.set(s, *i, "facility_id", *v),
        Op::Seal(i) => frame.seal(s, *i),
        Op::Snapshot(t) => frame.take_snapshot(*t),
        Op::Restore(t) => frame.restore_snapshot(*t),
        Op::Reset => frame.reset(),
    }
}

fn history(frame: &Frame) -> Vec<Result<Vec<AttrValue>, FrameError>> {
    let query = |schema: &str, attrs: &[&str]| {
        frame
            .query(&SnapshotQuery::new(schema).attrs(attrs.iter().copied()))
            .map(|r| r.into_values())
    };
    vec![
        query(
            Storage::NAME,
            &["capacity", "product_number", "position", "facility_id"],
        ),
        query(Consumer::NAME, &["demand", "price", "orders"]),
    ]
}

proptest! {
    #[test]
    fn arbitrary_sequences_match(ops in prop::collection::vec(op(), 0..40)) {
        let mut dense = storage_frame(BackendKind::Dense, Some(3));
        let mut lite = storage_frame(BackendKind::Lite, Some(3));
        for op in &ops {
            let a = apply(&mut dense, op);
            let b = apply(&mut lite, op);
            prop_assert_eq!(a, b, "outcome differs for {:?}", op);
        }
        prop_assert_eq!(dump_live(&dense).unwrap(), dump_live(&lite).unwrap());
        prop_assert_eq!(history(&dense), history(&lite));
        prop_assert_eq!(
            dense.snapshots().unwrap().ticks(),
            lite.snapshots().unwrap().ticks()
        );
        prop_assert_eq!(dense.memory_bytes(), lite.memory_bytes());
    }
}
