//! Standard node types, frames and a deterministic mutation script.
//!
//! - [`Storage`]: warehouse node with a scalar, a list, a two-slot vector
//!   and a const attribute.
//! - [`Consumer`]: demand node with an unsigned, a float and a list
//!   attribute.
//! - [`apply_script`]: six ticks of writes and captures touching every
//!   attribute shape.

use tessera_core::{AttrValue, FrameError};
use tessera_frame::{node_schema, BackendKind, Frame, FrameBuilder, QueryResult, SnapshotQuery};

node_schema! {
    /// A warehouse.
    pub struct Storage = "storage" {
        CAPACITY: i32 => "capacity";
        PRODUCTS: i32 => "product_number".list();
        POSITION: f32 => "position".slots(2);
        FACILITY: i64 => "facility_id".constant();
    }
}

node_schema! {
    /// A demand point.
    pub struct Consumer = "consumer" {
        DEMAND: u16 => "demand";
        PRICE: f64 => "price";
        ORDERS: u32 => "orders".list();
    }
}

pub const STORAGE_INSTANCES: usize = 3;
pub const CONSUMER_INSTANCES: usize = 2;

/// Ticks `0..SCRIPT_TICKS` are captured by [`apply_script`].
pub const SCRIPT_TICKS: u64 = 6;

/// Snapshot capacity used by [`run_script`]; smaller than
/// [`SCRIPT_TICKS`] so the script exercises eviction.
pub const SCRIPT_CAPACITY: usize = 4;

/// Storage ×3 and consumer ×2 on `kind`.
pub fn storage_frame(kind: BackendKind, snapshot_capacity: Option<usize>) -> Frame {
    let mut builder = FrameBuilder::new().backend(kind);
    if let Some(capacity) = snapshot_capacity {
        builder = builder.snapshots(capacity);
    }
    builder
        .node::<Storage>(STORAGE_INSTANCES)
        .and_then(|b| b.node::<Consumer>(CONSUMER_INSTANCES))
        .and_then(FrameBuilder::build)
        .expect("fixture frame builds")
}

/// Initialize and seal the const attributes, then run and capture
/// [`SCRIPT_TICKS`] ticks of writes.
pub fn apply_script(frame: &mut Frame) -> Result<(), FrameError> {
    for index in 0..STORAGE_INSTANCES {
        frame.set(Storage::NAME, index, "facility_id", 1000 + index as i64)?;
    }
    frame.seal_schema(Storage::NAME)?;

    for t in 0..SCRIPT_TICKS {
        let tick = t as i32;
        for index in 0..STORAGE_INSTANCES {
            frame.set(Storage::NAME, index, "capacity", 100 - 10 * tick + index as i32)?;
        }
        frame.append(
            Storage::NAME,
            t as usize % STORAGE_INSTANCES,
            "product_number",
            tick,
        )?;
        frame.set_slots(
            Storage::NAME,
            0,
            "position",
            &[AttrValue::Float32(t as f32 * 0.5), AttrValue::Float32(-(t as f32))],
        )?;
        frame.set(
            Consumer::NAME,
            t as usize % CONSUMER_INSTANCES,
            "demand",
            (t * 3) as u16,
        )?;
        frame.set(Consumer::NAME, 0, "price", 1.25 * t as f64)?;
        if t % 2 == 0 {
            frame.append(Consumer::NAME, 1, "orders", t as u32)?;
        }
        frame.take_snapshot(t)?;
        if t == 3 {
            frame.clear_list(Storage::NAME, 0, "product_number")?;
        }
    }
    Ok(())
}

/// Queries covering every selector form and mixed attribute shapes.
pub fn script_queries() -> Vec<SnapshotQuery> {
    vec![
        SnapshotQuery::new(Storage::NAME).attrs(["capacity", "product_number", "position"]),
        SnapshotQuery::new(Consumer::NAME)
            .ticks([5u64, 4])
            .indices([1, 0])
            .attrs(["orders", "demand", "price"]),
        SnapshotQuery::new(Storage::NAME)
            .tick(2u64)
            .index(1)
            .attr("product_number"),
    ]
}

/// Every live value of `frame`: one entry per `(schema, index, attribute)`
/// in declaration order, lists as their elements and fixed attributes as
/// their slots.
pub fn dump_live(frame: &Frame) -> Result<Vec<Vec<AttrValue>>, FrameError> {
    let mut out = Vec::new();
    for schema in frame.schemas() {
        let count = frame.instance_count(schema.name())?;
        for index in 0..count {
            for attr in schema.attributes() {
                let values = if attr.is_list() {
                    frame.get_list(schema.name(), index, attr.name())?
                } else {
                    frame.get_slots(schema.name(), index, attr.name())?
                };
                out.push(values);
            }
        }
    }
    Ok(out)
}

/// Everything observable from one run of the script.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptTrace {
    /// Results of [`script_queries`], in order.
    pub results: Vec<QueryResult>,
    /// Held ticks after the script.
    pub held_ticks: Vec<u64>,
    /// [`dump_live`] after the script.
    pub live: Vec<Vec<AttrValue>>,
    /// [`Frame::memory_bytes`] after the script.
    pub memory_bytes: usize,
    /// [`dump_live`] after a reset.
    pub after_reset: Vec<Vec<AttrValue>>,
}

/// Build a frame on `kind`, run the script and the standard queries, then
/// reset.
pub fn run_script(kind: BackendKind) -> Result<ScriptTrace, FrameError> {
    let mut frame = storage_frame(kind, Some(SCRIPT_CAPACITY));
    apply_script(&mut frame)?;
    let results = script_queries()
        .iter()
        .map(|q| frame.query(q))
        .collect::<Result<Vec<_>, _>>()?;
    let held_ticks = frame.snapshots()?.ticks().into_iter().map(|t| t.0).collect();
    let live = dump_live(&frame)?;
    let memory_bytes = frame.memory_bytes();
    frame.reset()?;
    let after_reset = dump_live(&frame)?;
    Ok(ScriptTrace {
        results,
        held_ticks,
        live,
        memory_bytes,
        after_reset,
    })
}
