//! Fixed-capacity ring of captured frame states.
//!
//! [`SnapshotRing`] stores `Arc<FrameSnapshot>` slots indexed by tick. The
//! write position is monotonically increasing; the slot for a new tick is
//! `write_pos % capacity`, so once the ring is full every new capture
//! evicts the oldest captured tick (FIFO by capture order, not by tick
//! value).

use std::sync::Arc;

use indexmap::IndexMap;
use tessera_core::{AttrId, AttrValue, PoolImage, SchemaId, TickId};

use crate::config::ConfigError;

/// An immutable copy of every pool's live values at one tick.
///
/// Shared through `Arc`, so captured slots can be handed to readers on
/// other threads while the simulation keeps writing the live pools.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSnapshot {
    tick: TickId,
    pools: Vec<PoolImage>,
}

impl FrameSnapshot {
    /// Assemble a snapshot from per-schema pool images in schema ID order.
    pub fn new(tick: TickId, pools: Vec<PoolImage>) -> Self {
        Self { tick, pools }
    }

    /// The tick this snapshot was captured at.
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// The captured pool for `schema`.
    pub fn pool(&self, schema: SchemaId) -> Option<&PoolImage> {
        self.pools.get(schema.index())
    }

    /// Every captured pool, in schema ID order.
    pub fn pools(&self) -> &[PoolImage] {
        &self.pools
    }

    /// Append the captured values of one attribute to `out`, returning how
    /// many were appended.
    pub fn extend_values(
        &self,
        schema: SchemaId,
        index: usize,
        attr: AttrId,
        out: &mut Vec<AttrValue>,
    ) -> Option<usize> {
        self.pool(schema)?.extend_values(index, attr, out)
    }

    /// Bytes held by the captured values.
    pub fn memory_bytes(&self) -> usize {
        self.pools.iter().map(PoolImage::memory_bytes).sum()
    }
}

/// A bounded history of [`FrameSnapshot`]s keyed by tick.
#[derive(Debug)]
pub struct SnapshotRing {
    slots: Vec<Option<Arc<FrameSnapshot>>>,
    tick_index: IndexMap<TickId, usize>,
    write_pos: u64,
    capacity: usize,
}

// Compile-time assertion: captured snapshots and the ring must be shareable.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FrameSnapshot>();
    assert::<SnapshotRing>();
};

impl SnapshotRing {
    /// Create an empty ring holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroSnapshotCapacity);
        }
        Ok(Self {
            slots: vec![None; capacity],
            tick_index: IndexMap::with_capacity(capacity),
            write_pos: 0,
            capacity,
        })
    }

    /// Insert a snapshot.
    ///
    /// If its tick is already held, the slot is replaced in place and keeps
    /// its eviction position. Otherwise the snapshot takes the next slot,
    /// evicting the oldest captured tick when the ring is full.
    ///
    /// Returns the snapshot that was displaced, if any.
    pub fn push(&mut self, snapshot: FrameSnapshot) -> Option<Arc<FrameSnapshot>> {
        let tick = snapshot.tick();
        let snapshot = Arc::new(snapshot);

        if let Some(&slot_idx) = self.tick_index.get(&tick) {
            return self.slots[slot_idx].replace(snapshot);
        }

        let slot_idx = (self.write_pos % self.capacity as u64) as usize;
        let evicted = self.slots[slot_idx].replace(snapshot);
        if let Some(old) = &evicted {
            self.tick_index.swap_remove(&old.tick());
        }
        self.tick_index.insert(tick, slot_idx);
        self.write_pos += 1;
        evicted
    }

    /// The snapshot captured at `tick`.
    pub fn get(&self, tick: TickId) -> Option<Arc<FrameSnapshot>> {
        let slot_idx = *self.tick_index.get(&tick)?;
        self.slots[slot_idx].clone()
    }

    /// Whether `tick` is held.
    pub fn contains(&self, tick: TickId) -> bool {
        self.tick_index.contains_key(&tick)
    }

    /// The most recently inserted tick's snapshot.
    pub fn latest(&self) -> Option<Arc<FrameSnapshot>> {
        if self.write_pos == 0 {
            return None;
        }
        let slot_idx = ((self.write_pos - 1) % self.capacity as u64) as usize;
        self.slots[slot_idx].clone()
    }

    /// Held snapshots in capture order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<FrameSnapshot>> {
        let start = if self.len() < self.capacity {
            0
        } else {
            (self.write_pos % self.capacity as u64) as usize
        };
        (0..self.capacity)
            .map(move |offset| (start + offset) % self.capacity)
            .filter_map(|slot_idx| self.slots[slot_idx].as_ref())
    }

    /// Held ticks in capture order, oldest first.
    pub fn ticks(&self) -> Vec<TickId> {
        self.iter().map(|s| s.tick()).collect()
    }

    /// Discard every snapshot.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.tick_index.clear();
        self.write_pos = 0;
    }

    /// Number of snapshots held (up to `capacity`).
    pub fn len(&self) -> usize {
        self.tick_index.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.tick_index.is_empty()
    }

    /// Maximum number of snapshots held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes held by every captured snapshot.
    pub fn memory_bytes(&self) -> usize {
        self.iter().map(|s| s.memory_bytes()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tessera_core::{ColumnData, ImageColumn};

    fn snap(tick: u64) -> FrameSnapshot {
        let column = ImageColumn::Fixed {
            slots: 1,
            data: ColumnData::from(vec![tick as i64]),
        };
        FrameSnapshot::new(TickId(tick), vec![PoolImage::new(1, vec![column])])
    }

    fn value(ring: &SnapshotRing, tick: u64) -> Option<AttrValue> {
        let mut out = Vec::new();
        ring.get(TickId(tick))?
            .extend_values(SchemaId(0), 0, AttrId(0), &mut out)?;
        out.first().copied()
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(
            SnapshotRing::new(0).unwrap_err(),
            ConfigError::ZeroSnapshotCapacity
        );
    }

    #[test]
    fn new_ring_is_empty() {
        let ring = SnapshotRing::new(4).unwrap();
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 4);
        assert!(ring.latest().is_none());
        assert!(ring.ticks().is_empty());
    }

    #[test]
    fn evicts_oldest_captured_tick() {
        let mut ring = SnapshotRing::new(3).unwrap();
        for tick in [10, 2, 7] {
            assert!(ring.push(snap(tick)).is_none());
        }
        let evicted = ring.push(snap(1)).unwrap();
        assert_eq!(evicted.tick(), TickId(10));
        assert!(!ring.contains(TickId(10)));
        assert_eq!(ring.ticks(), vec![TickId(2), TickId(7), TickId(1)]);
        assert_eq!(ring.latest().unwrap().tick(), TickId(1));
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn recapture_replaces_in_place() {
        let mut ring = SnapshotRing::new(2).unwrap();
        ring.push(snap(0));
        ring.push(snap(1));

        let replacement = FrameSnapshot::new(
            TickId(0),
            vec![PoolImage::new(
                1,
                vec![ImageColumn::Fixed {
                    slots: 1,
                    data: ColumnData::from(vec![99i64]),
                }],
            )],
        );
        let displaced = ring.push(replacement).unwrap();
        assert_eq!(displaced.tick(), TickId(0));
        assert_eq!(ring.len(), 2);
        assert_eq!(value(&ring, 0), Some(AttrValue::Int64(99)));

        // Tick 0 kept its eviction position: it is still the oldest.
        ring.push(snap(2));
        assert!(!ring.contains(TickId(0)));
        assert_eq!(ring.ticks(), vec![TickId(1), TickId(2)]);
    }

    #[test]
    fn clear_empties_ring() {
        let mut ring = SnapshotRing::new(2).unwrap();
        ring.push(snap(0));
        ring.push(snap(1));
        ring.push(snap(2));
        ring.clear();
        assert!(ring.is_empty());
        assert!(ring.get(TickId(2)).is_none());
        assert!(ring.latest().is_none());
        ring.push(snap(5));
        assert_eq!(ring.ticks(), vec![TickId(5)]);
    }

    #[test]
    fn snapshot_arc_outlives_eviction() {
        let mut ring = SnapshotRing::new(1).unwrap();
        ring.push(snap(0));
        let held = ring.get(TickId(0)).unwrap();
        ring.push(snap(1));
        assert_eq!(held.tick(), TickId(0));
        assert!(ring.get(TickId(0)).is_none());
    }

    proptest! {
        #[test]
        fn holds_last_capacity_distinct_ticks(
            capacity in 1usize..8,
            count in 0u64..40,
        ) {
            let mut ring = SnapshotRing::new(capacity).unwrap();
            for tick in 0..count {
                ring.push(snap(tick));
            }
            let first = count.saturating_sub(capacity as u64);
            let expected: Vec<TickId> = (first..count).map(TickId).collect();
            prop_assert_eq!(ring.ticks(), expected);
            for tick in 0..first {
                prop_assert!(ring.get(TickId(tick)).is_none());
            }
            for tick in first..count {
                prop_assert_eq!(value(&ring, tick), Some(AttrValue::Int64(tick as i64)));
            }
        }
    }
}
