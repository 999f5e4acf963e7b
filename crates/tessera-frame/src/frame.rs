//! The live attribute store: every node pool of a scenario behind one
//! backend, plus the optional snapshot ring.

use std::sync::Arc;

use indexmap::IndexMap;
use tessera_core::{
    AttrCoord, AttrId, AttrValue, Backend, FrameError, InstanceSet, NodeSchema, SchemaId, TickId,
};
use tracing::{debug, trace};

use crate::accessor::{NodeMut, NodeRef};
use crate::info::{AttributeInfo, FrameInfo, SchemaInfo};
use crate::query::{QueryResult, SnapshotQuery};
use crate::ring::{FrameSnapshot, SnapshotRing};

/// A resolved `(schema, attribute)` pair for name-free access.
///
/// Obtained from [`Frame::attr_handle`] and valid for the frame that
/// issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttrHandle {
    schema: SchemaId,
    attr: AttrId,
}

impl AttrHandle {
    /// The schema.
    pub fn schema(self) -> SchemaId {
        self.schema
    }

    /// The attribute.
    pub fn attr(self) -> AttrId {
        self.attr
    }

    /// The coordinate of this attribute on instance `index`.
    pub fn at(self, index: usize) -> AttrCoord {
        AttrCoord::new(self.schema, index, self.attr)
    }
}

/// The live aggregate store holding current-tick values for every instance
/// of every node schema.
///
/// Built once by [`FrameBuilder`](crate::FrameBuilder) or
/// [`build_frame`](crate::build_frame). Schemas and instance counts are
/// fixed for the frame's lifetime. Writes go straight to the live pools;
/// nothing is captured until [`take_snapshot`](Frame::take_snapshot).
///
/// Every failing call returns an error and leaves all state unchanged.
pub struct Frame {
    schemas: IndexMap<String, NodeSchema>,
    backend: Box<dyn Backend>,
    sealed: Vec<InstanceSet>,
    ring: Option<SnapshotRing>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("backend", &self.backend.name())
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("snapshots", &self.ring.as_ref().map(SnapshotRing::len))
            .finish()
    }
}

impl Frame {
    /// Allocate one pool per schema on `backend`.
    pub(crate) fn assemble(
        schemas: Vec<(NodeSchema, usize)>,
        mut backend: Box<dyn Backend>,
        ring: Option<SnapshotRing>,
    ) -> Result<Self, FrameError> {
        let mut by_name = IndexMap::with_capacity(schemas.len());
        for (schema, instance_count) in schemas {
            backend.allocate_pool(&schema, instance_count)?;
            by_name.insert(schema.name().to_string(), schema);
        }
        let sealed = vec![InstanceSet::empty(); by_name.len()];
        Ok(Self {
            schemas: by_name,
            backend,
            sealed,
            ring,
        })
    }

    // ── Introspection ──────────────────────────────────────────

    /// Name of the backend holding the pools.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Look up a schema by name.
    pub fn schema(&self, name: &str) -> Option<&NodeSchema> {
        self.schemas.get(name)
    }

    /// Look up a schema by ID.
    pub fn schema_by_id(&self, id: SchemaId) -> Option<&NodeSchema> {
        self.schemas.get_index(id.index()).map(|(_, s)| s)
    }

    /// Schemas in declaration order.
    pub fn schemas(&self) -> impl Iterator<Item = &NodeSchema> {
        self.schemas.values()
    }

    /// Instance count of a schema's pool.
    pub fn instance_count(&self, schema: &str) -> Result<usize, FrameError> {
        let id = self.schema_named(schema)?.id();
        Ok(self.count_of(id))
    }

    /// Whether snapshots were enabled at build time.
    pub fn snapshots_enabled(&self) -> bool {
        self.ring.is_some()
    }

    /// Name, instance count, footprint and attribute list of every schema.
    pub fn info(&self) -> FrameInfo {
        let schemas = self
            .schemas()
            .map(|schema| SchemaInfo {
                name: schema.name().to_string(),
                instance_count: self.count_of(schema.id()),
                footprint_bytes: schema.footprint_bytes(),
                attributes: schema
                    .attributes()
                    .map(|a| AttributeInfo {
                        name: a.name().to_string(),
                        attr_type: a.attr_type(),
                        slots: a.slots(),
                        is_list: a.is_list(),
                        is_const: a.is_const(),
                    })
                    .collect(),
            })
            .collect();
        FrameInfo {
            backend: self.backend.name(),
            snapshot_capacity: self.ring.as_ref().map(SnapshotRing::capacity),
            schemas,
        }
    }

    /// Bytes held by live values plus every captured snapshot.
    pub fn memory_bytes(&self) -> usize {
        self.backend.memory_bytes() + self.ring.as_ref().map_or(0, SnapshotRing::memory_bytes)
    }

    // ── Resolution ─────────────────────────────────────────────

    fn schema_named(&self, name: &str) -> Result<&NodeSchema, FrameError> {
        self.schemas.get(name).ok_or_else(|| FrameError::UnknownSchema {
            schema: name.to_string(),
        })
    }

    fn count_of(&self, schema: SchemaId) -> usize {
        self.backend.instance_count(schema).unwrap_or(0)
    }

    /// Resolve a `(schema, attribute)` name pair once for repeated access.
    pub fn attr_handle(&self, schema: &str, attr: &str) -> Result<AttrHandle, FrameError> {
        let schema = self.schema_named(schema)?;
        let attr = schema.resolve(attr)?.id();
        Ok(AttrHandle {
            schema: schema.id(),
            attr,
        })
    }

    fn coord(&self, schema: &str, index: usize, attr: &str) -> Result<AttrCoord, FrameError> {
        let schema = self.schema_named(schema)?;
        let attr = schema.resolve(attr)?.id();
        Ok(AttrCoord::new(schema.id(), index, attr))
    }

    pub(crate) fn coord_in(
        &self,
        schema: SchemaId,
        index: usize,
        attr: &str,
    ) -> Result<AttrCoord, FrameError> {
        let schema = self
            .schema_by_id(schema)
            .ok_or_else(|| tessera_core::traits::unknown_pool(schema))?;
        let attr = schema.resolve(attr)?.id();
        Ok(AttrCoord::new(schema.id(), index, attr))
    }

    fn check_index(&self, schema: SchemaId, index: usize) -> Result<(), FrameError> {
        let instance_count = self.count_of(schema);
        if index >= instance_count {
            let name = self.schema_by_id(schema).map_or("", NodeSchema::name);
            return Err(FrameError::IndexOutOfRange {
                schema: name.to_string(),
                index,
                instance_count,
            });
        }
        Ok(())
    }

    fn check_writable(&self, at: AttrCoord) -> Result<(), FrameError> {
        let sealed = self
            .sealed
            .get(at.schema.index())
            .is_some_and(|set| set.contains(at.index));
        if !sealed {
            return Ok(());
        }
        let Some(schema) = self.schema_by_id(at.schema) else {
            return Ok(());
        };
        match schema.attribute_by_id(at.attr) {
            Some(desc) if desc.is_const() => Err(FrameError::ConstAttributeWrite {
                schema: schema.name().to_string(),
                attr: desc.name().to_string(),
                index: at.index,
            }),
            _ => Ok(()),
        }
    }

    // ── Coordinate-level access ────────────────────────────────

    pub(crate) fn read_slot(&self, at: AttrCoord, slot: usize) -> Result<AttrValue, FrameError> {
        self.backend.get(at, slot)
    }

    pub(crate) fn read_slots(&self, at: AttrCoord) -> Result<Vec<AttrValue>, FrameError> {
        let mut out = Vec::new();
        self.backend.read_fixed(at, &mut out)?;
        Ok(out)
    }

    pub(crate) fn write_slot(
        &mut self,
        at: AttrCoord,
        slot: usize,
        value: AttrValue,
    ) -> Result<(), FrameError> {
        self.check_writable(at)?;
        self.backend.set(at, slot, value)
    }

    pub(crate) fn write_slots(&mut self, at: AttrCoord, values: &[AttrValue]) -> Result<(), FrameError> {
        self.check_writable(at)?;
        self.backend.write_fixed(at, values)
    }

    pub(crate) fn write_slots_at(
        &mut self,
        at: AttrCoord,
        slots: &[usize],
        values: &[AttrValue],
    ) -> Result<(), FrameError> {
        self.check_writable(at)?;
        let mut current = self.read_slots(at)?;
        let schema = self
            .schema_by_id(at.schema)
            .ok_or_else(|| tessera_core::traits::unknown_pool(at.schema))?;
        let desc = schema.resolve_id(at.attr)?;
        if slots.len() != values.len() {
            return Err(FrameError::SlotCountMismatch {
                schema: schema.name().to_string(),
                attr: desc.name().to_string(),
                expected: slots.len(),
                actual: values.len(),
            });
        }
        for (&slot, &value) in slots.iter().zip(values) {
            tessera_core::traits::check_slot(schema, desc, slot)?;
            current[slot] = value;
        }
        self.backend.write_fixed(at, &current)
    }

    pub(crate) fn read_list(&self, at: AttrCoord) -> Result<Vec<AttrValue>, FrameError> {
        let mut out = Vec::new();
        self.backend.read_list(at, &mut out)?;
        Ok(out)
    }

    pub(crate) fn list_length(&self, at: AttrCoord) -> Result<usize, FrameError> {
        self.backend.list_len(at)
    }

    pub(crate) fn push_list(&mut self, at: AttrCoord, value: AttrValue) -> Result<(), FrameError> {
        self.check_writable(at)?;
        self.backend.push_list(at, value)
    }

    pub(crate) fn replace_list(&mut self, at: AttrCoord, values: &[AttrValue]) -> Result<(), FrameError> {
        self.check_writable(at)?;
        self.backend.replace_list(at, values)
    }

    // ── Fixed attributes ───────────────────────────────────────

    /// Read slot 0 of a fixed attribute.
    pub fn get(&self, schema: &str, index: usize, attr: &str) -> Result<AttrValue, FrameError> {
        self.read_slot(self.coord(schema, index, attr)?, 0)
    }

    /// Read one slot of a fixed attribute.
    pub fn get_slot(
        &self,
        schema: &str,
        index: usize,
        attr: &str,
        slot: usize,
    ) -> Result<AttrValue, FrameError> {
        self.read_slot(self.coord(schema, index, attr)?, slot)
    }

    /// Read every slot of a fixed attribute.
    pub fn get_slots(
        &self,
        schema: &str,
        index: usize,
        attr: &str,
    ) -> Result<Vec<AttrValue>, FrameError> {
        self.read_slots(self.coord(schema, index, attr)?)
    }

    /// Write slot 0 of a fixed attribute.
    pub fn set(
        &mut self,
        schema: &str,
        index: usize,
        attr: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), FrameError> {
        let at = self.coord(schema, index, attr)?;
        self.write_slot(at, 0, value.into())
    }

    /// Write one slot of a fixed attribute.
    pub fn set_slot(
        &mut self,
        schema: &str,
        index: usize,
        attr: &str,
        slot: usize,
        value: impl Into<AttrValue>,
    ) -> Result<(), FrameError> {
        let at = self.coord(schema, index, attr)?;
        self.write_slot(at, slot, value.into())
    }

    /// Write every slot of a fixed attribute.
    ///
    /// `values.len()` must equal the declared slot count; anything else
    /// fails with `SlotCountMismatch`.
    pub fn set_slots(
        &mut self,
        schema: &str,
        index: usize,
        attr: &str,
        values: &[AttrValue],
    ) -> Result<(), FrameError> {
        let at = self.coord(schema, index, attr)?;
        self.write_slots(at, values)
    }

    /// Write an explicit list of slots: `slots[k]` receives `values[k]`.
    ///
    /// All-or-nothing: every slot and value is checked before any is
    /// written.
    pub fn set_slots_at(
        &mut self,
        schema: &str,
        index: usize,
        attr: &str,
        slots: &[usize],
        values: &[AttrValue],
    ) -> Result<(), FrameError> {
        let at = self.coord(schema, index, attr)?;
        self.write_slots_at(at, slots, values)
    }

    // ── List attributes ────────────────────────────────────────

    /// Read a list attribute in element order.
    pub fn get_list(
        &self,
        schema: &str,
        index: usize,
        attr: &str,
    ) -> Result<Vec<AttrValue>, FrameError> {
        self.read_list(self.coord(schema, index, attr)?)
    }

    /// Current length of a list attribute.
    pub fn list_len(&self, schema: &str, index: usize, attr: &str) -> Result<usize, FrameError> {
        self.list_length(self.coord(schema, index, attr)?)
    }

    /// Append one element to a list attribute.
    pub fn append(
        &mut self,
        schema: &str,
        index: usize,
        attr: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), FrameError> {
        let at = self.coord(schema, index, attr)?;
        self.push_list(at, value.into())
    }

    /// Remove every element of a list attribute.
    pub fn clear_list(&mut self, schema: &str, index: usize, attr: &str) -> Result<(), FrameError> {
        let at = self.coord(schema, index, attr)?;
        self.replace_list(at, &[])
    }

    /// Replace a list attribute's elements, truncating or extending.
    pub fn set_list(
        &mut self,
        schema: &str,
        index: usize,
        attr: &str,
        values: &[AttrValue],
    ) -> Result<(), FrameError> {
        let at = self.coord(schema, index, attr)?;
        self.replace_list(at, values)
    }

    // ── Handle-based access ────────────────────────────────────

    /// [`get_slot`](Self::get_slot) through a handle.
    pub fn get_by(&self, handle: AttrHandle, index: usize, slot: usize) -> Result<AttrValue, FrameError> {
        self.read_slot(handle.at(index), slot)
    }

    /// [`get_slots`](Self::get_slots) through a handle.
    pub fn get_slots_by(&self, handle: AttrHandle, index: usize) -> Result<Vec<AttrValue>, FrameError> {
        self.read_slots(handle.at(index))
    }

    /// [`set_slot`](Self::set_slot) through a handle.
    pub fn set_by(
        &mut self,
        handle: AttrHandle,
        index: usize,
        slot: usize,
        value: impl Into<AttrValue>,
    ) -> Result<(), FrameError> {
        self.write_slot(handle.at(index), slot, value.into())
    }

    /// [`get_list`](Self::get_list) through a handle, appending into `out`.
    pub fn get_list_by(
        &self,
        handle: AttrHandle,
        index: usize,
        out: &mut Vec<AttrValue>,
    ) -> Result<(), FrameError> {
        self.backend.read_list(handle.at(index), out)
    }

    /// [`append`](Self::append) through a handle.
    pub fn append_by(
        &mut self,
        handle: AttrHandle,
        index: usize,
        value: impl Into<AttrValue>,
    ) -> Result<(), FrameError> {
        self.push_list(handle.at(index), value.into())
    }

    /// [`list_len`](Self::list_len) through a handle.
    pub fn list_len_by(&self, handle: AttrHandle, index: usize) -> Result<usize, FrameError> {
        self.list_length(handle.at(index))
    }

    // ── Sealing ────────────────────────────────────────────────

    /// Mark the end of an instance's initialize phase. Const attributes of
    /// a sealed instance reject writes with `ConstAttributeWrite`.
    pub fn seal(&mut self, schema: &str, index: usize) -> Result<(), FrameError> {
        let id = self.schema_named(schema)?.id();
        self.seal_id(id, index)
    }

    pub(crate) fn seal_id(&mut self, schema: SchemaId, index: usize) -> Result<(), FrameError> {
        self.check_index(schema, index)?;
        if let Some(set) = self.sealed.get_mut(schema.index()) {
            if set.insert(index) {
                debug!(schema = %schema, index, "instance sealed");
            }
        }
        Ok(())
    }

    /// Seal every instance of one schema.
    pub fn seal_schema(&mut self, schema: &str) -> Result<(), FrameError> {
        let id = self.schema_named(schema)?.id();
        let count = self.count_of(id);
        if let Some(set) = self.sealed.get_mut(id.index()) {
            set.insert_all(count);
        }
        debug!(schema, instances = count, "schema sealed");
        Ok(())
    }

    /// Seal every instance of every schema.
    pub fn seal_all(&mut self) {
        for id in 0..self.sealed.len() {
            let count = self.count_of(SchemaId(id as u32));
            self.sealed[id].insert_all(count);
        }
        debug!(schemas = self.sealed.len(), "all instances sealed");
    }

    /// Whether an instance has been sealed.
    pub fn is_sealed(&self, schema: &str, index: usize) -> Result<bool, FrameError> {
        let id = self.schema_named(schema)?.id();
        self.check_index(id, index)?;
        Ok(self.is_sealed_id(id, index))
    }

    pub(crate) fn is_sealed_id(&self, schema: SchemaId, index: usize) -> bool {
        self.sealed
            .get(schema.index())
            .is_some_and(|set| set.contains(index))
    }

    // ── Reset ──────────────────────────────────────────────────

    /// Restore every fixed attribute to zero and every list to empty,
    /// clear all seals, and discard every snapshot.
    ///
    /// Schemas and instance counts are unchanged. Idempotent.
    pub fn reset(&mut self) -> Result<(), FrameError> {
        self.backend.reset_all()?;
        self.sealed.iter_mut().for_each(InstanceSet::clear);
        if let Some(ring) = &mut self.ring {
            ring.clear();
        }
        debug!(backend = self.backend.name(), "frame reset");
        Ok(())
    }

    // ── Snapshots ──────────────────────────────────────────────

    /// The snapshot ring.
    pub fn snapshots(&self) -> Result<&SnapshotRing, FrameError> {
        self.ring.as_ref().ok_or(FrameError::SnapshotDisabled)
    }

    /// Capture the live values of every pool as `tick`.
    ///
    /// Re-capturing a held tick replaces it without growing the ring. When
    /// the ring is full, the oldest captured tick is evicted.
    pub fn take_snapshot(&mut self, tick: impl Into<TickId>) -> Result<(), FrameError> {
        let tick = tick.into();
        if self.ring.is_none() {
            return Err(FrameError::SnapshotDisabled);
        }
        let pools = (0..self.schemas.len())
            .map(|id| self.backend.snapshot_pool(SchemaId(id as u32)))
            .collect::<Result<Vec<_>, _>>()?;
        let ring = self.ring.as_mut().ok_or(FrameError::SnapshotDisabled)?;
        let displaced = ring.push(FrameSnapshot::new(tick, pools));
        trace!(tick = %tick, held = ring.len(), "snapshot captured");
        if let Some(old) = displaced.filter(|old| old.tick() != tick) {
            trace!(evicted = %old.tick(), "snapshot evicted");
        }
        Ok(())
    }

    /// The snapshot captured at `tick`.
    pub fn snapshot(&self, tick: impl Into<TickId>) -> Result<Arc<FrameSnapshot>, FrameError> {
        let tick = tick.into();
        self.snapshots()?
            .get(tick)
            .ok_or(FrameError::TickNotFound { tick })
    }

    /// Copy a captured tick back into the live pools.
    ///
    /// Seals are kept. The ring is unchanged.
    pub fn restore_snapshot(&mut self, tick: impl Into<TickId>) -> Result<(), FrameError> {
        let snapshot = self.snapshot(tick)?;
        for (id, image) in snapshot.pools().iter().enumerate() {
            self.backend.restore_pool(SchemaId(id as u32), image)?;
        }
        debug!(tick = %snapshot.tick(), "snapshot restored");
        Ok(())
    }

    /// Run a snapshot query.
    ///
    /// Fails with `SnapshotDisabled` first, then schema and index errors,
    /// then `TickNotFound`.
    pub fn query(&self, query: &SnapshotQuery) -> Result<QueryResult, FrameError> {
        let ring = self.snapshots()?;
        let schema = self.schema_named(query.schema())?;
        let plan = query.compile(schema, self.count_of(schema.id()))?;
        plan.execute(ring)
    }

    // ── Accessors ──────────────────────────────────────────────

    /// A read-only view of one instance.
    pub fn node(&self, schema: &str, index: usize) -> Result<NodeRef<'_>, FrameError> {
        let id = self.schema_named(schema)?.id();
        self.check_index(id, index)?;
        Ok(NodeRef::new(self, id, index))
    }

    /// A read-write view of one instance.
    pub fn node_mut(&mut self, schema: &str, index: usize) -> Result<NodeMut<'_>, FrameError> {
        let id = self.schema_named(schema)?.id();
        self.check_index(id, index)?;
        Ok(NodeMut::new(self, id, index))
    }
}
