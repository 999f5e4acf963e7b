//! Frame-level conformance checks.
//!
//! Each function builds its own frame on the given backend and panics on
//! the first contract violation. [`run_full_conformance`] runs them all.

use tessera_core::{AttrValue, ErrorKind, FrameError, TickId};
use tessera_frame::{BackendKind, SnapshotQuery};

use crate::fixtures::{
    dump_live, storage_frame, Consumer, Storage, CONSUMER_INSTANCES, STORAGE_INSTANCES,
};

fn int(v: i32) -> AttrValue {
    AttrValue::Int32(v)
}

/// Fresh pools read zero, lists start empty.
pub fn assert_zero_initialized(kind: BackendKind) {
    let frame = storage_frame(kind, None);
    assert_eq!(frame.instance_count(Storage::NAME), Ok(STORAGE_INSTANCES));
    assert_eq!(frame.instance_count(Consumer::NAME), Ok(CONSUMER_INSTANCES));
    for index in 0..STORAGE_INSTANCES {
        assert_eq!(frame.get(Storage::NAME, index, "capacity"), Ok(int(0)));
        assert_eq!(
            frame.get_slots(Storage::NAME, index, "position"),
            Ok(vec![AttrValue::Float32(0.0); 2])
        );
        assert_eq!(frame.get_list(Storage::NAME, index, "product_number"), Ok(vec![]));
        assert_eq!(frame.list_len(Storage::NAME, index, "product_number"), Ok(0));
    }
    assert_eq!(frame.get(Consumer::NAME, 1, "price"), Ok(AttrValue::Float64(0.0)));
}

/// Writes land on exactly one `(index, attribute, slot)` and convert
/// losslessly to the declared type.
pub fn assert_fixed_round_trip(kind: BackendKind) {
    let mut frame = storage_frame(kind, None);
    frame.set(Storage::NAME, 1, "capacity", 100).unwrap();
    assert_eq!(frame.get(Storage::NAME, 1, "capacity"), Ok(int(100)));
    assert_eq!(frame.get(Storage::NAME, 0, "capacity"), Ok(int(0)));
    assert_eq!(frame.get(Storage::NAME, 2, "capacity"), Ok(int(0)));

    // Narrower integers widen to the declared type.
    frame.set(Storage::NAME, 2, "capacity", 7u8).unwrap();
    assert_eq!(frame.get(Storage::NAME, 2, "capacity"), Ok(int(7)));

    frame.set_slot(Storage::NAME, 0, "position", 1, 2.5f32).unwrap();
    assert_eq!(
        frame.get_slots(Storage::NAME, 0, "position"),
        Ok(vec![AttrValue::Float32(0.0), AttrValue::Float32(2.5)])
    );
    frame
        .set_slots_at(
            Storage::NAME,
            0,
            "position",
            &[1, 0],
            &[AttrValue::Float32(22.0), AttrValue::Float32(11.0)],
        )
        .unwrap();
    assert_eq!(
        frame.get_slots(Storage::NAME, 0, "position"),
        Ok(vec![AttrValue::Float32(11.0), AttrValue::Float32(22.0)])
    );
}

/// Append, replace and clear keep element order and leave other instances
/// alone.
pub fn assert_list_ops(kind: BackendKind) {
    let mut frame = storage_frame(kind, None);
    frame.append(Storage::NAME, 1, "product_number", 5).unwrap();
    frame.append(Storage::NAME, 1, "product_number", 7).unwrap();
    assert_eq!(
        frame.get_list(Storage::NAME, 1, "product_number"),
        Ok(vec![int(5), int(7)])
    );
    assert_eq!(frame.list_len(Storage::NAME, 1, "product_number"), Ok(2));
    assert_eq!(frame.list_len(Storage::NAME, 0, "product_number"), Ok(0));

    frame
        .set_list(Storage::NAME, 1, "product_number", &[int(1), int(2), int(3)])
        .unwrap();
    assert_eq!(frame.list_len(Storage::NAME, 1, "product_number"), Ok(3));
    frame
        .set_list(Storage::NAME, 1, "product_number", &[int(9)])
        .unwrap();
    assert_eq!(
        frame.get_list(Storage::NAME, 1, "product_number"),
        Ok(vec![int(9)])
    );
    frame.clear_list(Storage::NAME, 1, "product_number").unwrap();
    assert_eq!(frame.get_list(Storage::NAME, 1, "product_number"), Ok(vec![]));
}

/// Every failure class is reported with the right kind and changes
/// nothing.
pub fn assert_errors_are_local(kind: BackendKind) {
    let mut frame = storage_frame(kind, None);
    frame.set(Storage::NAME, 0, "capacity", 42).unwrap();
    frame.append(Storage::NAME, 0, "product_number", 1).unwrap();
    let before = dump_live(&frame).unwrap();

    let kind_of = |r: Result<(), FrameError>| r.unwrap_err().kind();
    assert_eq!(kind_of(frame.set("depot", 0, "capacity", 1)), ErrorKind::Schema);
    assert_eq!(kind_of(frame.set(Storage::NAME, 0, "volume", 1)), ErrorKind::Schema);
    assert_eq!(
        kind_of(frame.set(Storage::NAME, STORAGE_INSTANCES, "capacity", 1)),
        ErrorKind::IndexOutOfRange
    );
    assert_eq!(
        kind_of(frame.set_slot(Storage::NAME, 0, "position", 2, 1.0f32)),
        ErrorKind::IndexOutOfRange
    );
    assert_eq!(
        kind_of(frame.set(Storage::NAME, 0, "capacity", 1.5f64)),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind_of(frame.set(Storage::NAME, 0, "capacity", i64::MAX)),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind_of(frame.set(Storage::NAME, 0, "product_number", 1)),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind_of(frame.append(Storage::NAME, 0, "capacity", 1)),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind_of(frame.append(Storage::NAME, 0, "product_number", 0.5f32)),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind_of(frame.set_slots(Storage::NAME, 0, "position", &[AttrValue::Float32(1.0)])),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind_of(frame.set_list(
            Storage::NAME,
            0,
            "product_number",
            &[int(3), AttrValue::Float64(0.5)]
        )),
        ErrorKind::TypeMismatch
    );
    assert_eq!(kind_of(frame.take_snapshot(0u64)), ErrorKind::SnapshotDisabled);

    assert_eq!(dump_live(&frame).unwrap(), before);
}

/// A zero-instance pool exists but rejects every index.
pub fn assert_empty_pool(kind: BackendKind) {
    let frame = tessera_frame::FrameBuilder::new()
        .backend(kind)
        .node::<Storage>(0)
        .and_then(|b| b.build())
        .unwrap();
    assert_eq!(frame.instance_count(Storage::NAME), Ok(0));
    assert_eq!(
        frame.get(Storage::NAME, 0, "capacity").unwrap_err().kind(),
        ErrorKind::IndexOutOfRange
    );
}

/// A captured tick keeps its values after later live writes.
pub fn assert_snapshot_isolation(kind: BackendKind) {
    let mut frame = storage_frame(kind, Some(4));
    frame.set(Storage::NAME, 1, "capacity", 100).unwrap();
    frame.append(Storage::NAME, 1, "product_number", 5).unwrap();
    frame.take_snapshot(0u64).unwrap();
    frame.set(Storage::NAME, 1, "capacity", 50).unwrap();
    frame.append(Storage::NAME, 1, "product_number", 6).unwrap();

    let query = SnapshotQuery::new(Storage::NAME)
        .tick(0u64)
        .index(1)
        .attrs(["capacity", "product_number"]);
    assert_eq!(frame.query(&query).unwrap().values(), &[int(100), int(5)]);
    assert_eq!(frame.get(Storage::NAME, 1, "capacity"), Ok(int(50)));
}

/// Capacity `c` plus one capture evicts the earliest tick only.
pub fn assert_ring_eviction(kind: BackendKind) {
    let capacity = 3;
    let mut frame = storage_frame(kind, Some(capacity));
    for tick in 0..=capacity as u64 {
        frame.set(Storage::NAME, 0, "capacity", tick as i32).unwrap();
        frame.take_snapshot(tick).unwrap();
    }
    let oldest = SnapshotQuery::new(Storage::NAME).tick(0u64).attr("capacity");
    assert_eq!(
        frame.query(&oldest),
        Err(FrameError::TickNotFound { tick: TickId(0) })
    );
    let ring = frame.snapshots().unwrap();
    assert_eq!(ring.len(), capacity);
    assert_eq!(ring.ticks(), vec![TickId(1), TickId(2), TickId(3)]);
    for tick in 1..=capacity as u64 {
        let query = SnapshotQuery::new(Storage::NAME)
            .tick(tick)
            .index(0)
            .attr("capacity");
        assert_eq!(frame.query(&query).unwrap().values(), &[int(tick as i32)]);
    }
}

/// Values come out ordered `tick → index → attribute → slot`, lists
/// contributing their captured length.
pub fn assert_query_ordering(kind: BackendKind) {
    let mut frame = storage_frame(kind, Some(4));
    for tick in 0..2u64 {
        for index in 0..2 {
            let base = (tick * 10 + index as u64) as i32;
            frame.set(Storage::NAME, index, "capacity", base).unwrap();
            frame
                .set_slots(
                    Storage::NAME,
                    index,
                    "position",
                    &[AttrValue::Float32(base as f32), AttrValue::Float32(-base as f32)],
                )
                .unwrap();
        }
        frame.append(Storage::NAME, 1, "product_number", tick as i32).unwrap();
        frame.take_snapshot(tick).unwrap();
    }

    let result = frame
        .query(
            &SnapshotQuery::new(Storage::NAME)
                .ticks([1u64, 0])
                .indices([1, 0])
                .attrs(["position", "product_number", "capacity"]),
        )
        .unwrap();
    let f = AttrValue::Float32;
    assert_eq!(
        result.values(),
        &[
            // tick 1, index 1
            f(11.0), f(-11.0), int(0), int(1), int(11),
            // tick 1, index 0
            f(10.0), f(-10.0), int(10),
            // tick 0, index 1
            f(1.0), f(-1.0), int(0), int(1),
            // tick 0, index 0
            f(0.0), f(-0.0), int(0),
        ]
    );
    assert_eq!(
        result.counts().collect::<Vec<_>>(),
        vec![2, 2, 1, 2, 0, 1, 2, 1, 1, 2, 0, 1]
    );
    assert_eq!(result.ticks(), &[TickId(1), TickId(0)]);
    assert_eq!(result.cell(0, 0, 1), Some(&[int(0), int(1)][..]));
    assert_eq!(result.to_f64_vec().len(), result.len());

    // Missing ticks fail the whole query.
    let partial = SnapshotQuery::new(Storage::NAME).ticks([0u64, 9]).attr("capacity");
    assert_eq!(
        frame.query(&partial),
        Err(FrameError::TickNotFound { tick: TickId(9) })
    );
    // Bad indices fail before any tick lookup.
    let bad_index = SnapshotQuery::new(Storage::NAME).tick(9u64).index(7).attr("capacity");
    assert_eq!(
        frame.query(&bad_index).unwrap_err().kind(),
        ErrorKind::IndexOutOfRange
    );
}

/// Reset zeroes everything, drops snapshots and seals, keeps pool sizes.
pub fn assert_reset(kind: BackendKind) {
    let mut frame = storage_frame(kind, Some(2));
    let pristine = dump_live(&frame).unwrap();
    frame.set(Storage::NAME, 2, "capacity", 3).unwrap();
    frame.append(Storage::NAME, 2, "product_number", 4).unwrap();
    frame.set(Consumer::NAME, 1, "price", 9.5).unwrap();
    frame.seal_all();
    frame.take_snapshot(0u64).unwrap();

    frame.reset().unwrap();
    assert_eq!(dump_live(&frame).unwrap(), pristine);
    assert_eq!(frame.instance_count(Storage::NAME), Ok(STORAGE_INSTANCES));
    assert!(frame.snapshots().unwrap().is_empty());
    assert_eq!(
        frame.query(&SnapshotQuery::new(Storage::NAME).tick(0u64).attr("capacity")),
        Err(FrameError::TickNotFound { tick: TickId(0) })
    );
    assert_eq!(frame.is_sealed(Storage::NAME, 0), Ok(false));

    frame.reset().unwrap();
    assert_eq!(dump_live(&frame).unwrap(), pristine);
}

/// Const attributes accept writes until their instance is sealed.
pub fn assert_const_sealing(kind: BackendKind) {
    let mut frame = storage_frame(kind, None);
    frame.set(Storage::NAME, 0, "facility_id", 77i64).unwrap();
    frame.seal(Storage::NAME, 0).unwrap();
    assert_eq!(
        frame
            .set(Storage::NAME, 0, "facility_id", 78i64)
            .unwrap_err()
            .kind(),
        ErrorKind::ConstAttributeWrite
    );
    assert_eq!(
        frame.get(Storage::NAME, 0, "facility_id"),
        Ok(AttrValue::Int64(77))
    );
    frame.set(Storage::NAME, 1, "facility_id", 78i64).unwrap();
    frame.set(Storage::NAME, 0, "capacity", 1).unwrap();
}

/// Restoring a tick brings back exactly the captured live state.
pub fn assert_restore(kind: BackendKind) {
    let mut frame = storage_frame(kind, Some(2));
    frame.set(Storage::NAME, 0, "capacity", 12).unwrap();
    frame.append(Storage::NAME, 2, "product_number", 8).unwrap();
    frame.append(Consumer::NAME, 0, "orders", 3u32).unwrap();
    let captured = dump_live(&frame).unwrap();
    frame.take_snapshot(4u64).unwrap();

    frame.set(Storage::NAME, 0, "capacity", 13).unwrap();
    frame.clear_list(Storage::NAME, 2, "product_number").unwrap();
    frame.append(Consumer::NAME, 0, "orders", 4u32).unwrap();
    frame.restore_snapshot(4u64).unwrap();
    assert_eq!(dump_live(&frame).unwrap(), captured);
}

/// Run every conformance check against `kind`.
pub fn run_full_conformance(kind: BackendKind) {
    assert_zero_initialized(kind);
    assert_fixed_round_trip(kind);
    assert_list_ops(kind);
    assert_errors_are_local(kind);
    assert_empty_pool(kind);
    assert_snapshot_isolation(kind);
    assert_ring_eviction(kind);
    assert_query_ordering(kind);
    assert_reset(kind);
    assert_const_sealing(kind);
    assert_restore(kind);
}
