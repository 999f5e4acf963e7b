//! Pool layout: `AttrId` → storage shape and sizing.
//!
//! A [`PoolLayout`] is computed once per pool at allocation time from the
//! schema and instance count. Both backends size their storage from it,
//! and the frame reports per-instance footprints through it.

use indexmap::IndexMap;
use tessera_core::{AttrId, AttributeType, FrameError, NodeSchema};

/// How one attribute is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrStorage {
    /// Fixed slots per instance.
    Fixed {
        /// Slots per instance.
        slots: usize,
        /// Total values in the pool: `instance_count * slots`.
        total_len: usize,
    },
    /// Variable-length list per instance, stored out of line.
    List,
}

/// Layout of one attribute within a pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrLayout {
    /// Attribute name (for diagnostics).
    pub name: String,
    /// Element type.
    pub attr_type: AttributeType,
    /// Storage shape.
    pub storage: AttrStorage,
}

impl AttrLayout {
    /// Bytes per instance in fixed storage.
    pub fn footprint_bytes(&self) -> usize {
        match self.storage {
            AttrStorage::Fixed { slots, .. } => slots * self.attr_type.width(),
            AttrStorage::List => 0,
        }
    }
}

/// Layout of every attribute of one pool, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolLayout {
    instance_count: usize,
    entries: IndexMap<AttrId, AttrLayout>,
}

impl PoolLayout {
    /// Compute the layout for `instance_count` instances of `schema`.
    ///
    /// Fails with `InvalidConfig` if a fixed attribute's total length
    /// overflows `usize`.
    pub fn from_schema(schema: &NodeSchema, instance_count: usize) -> Result<Self, FrameError> {
        let mut entries = IndexMap::with_capacity(schema.len());
        for desc in schema.attributes() {
            let storage = match desc.fixed_slots() {
                Some(slots) => {
                    let total_len = instance_count.checked_mul(slots).ok_or_else(|| {
                        FrameError::InvalidConfig {
                            reason: format!(
                                "instance_count ({instance_count}) * slots ({slots}) overflows for attribute '{}' of schema '{}'",
                                desc.name(),
                                schema.name(),
                            ),
                        }
                    })?;
                    AttrStorage::Fixed { slots, total_len }
                }
                None => AttrStorage::List,
            };
            entries.insert(
                desc.id(),
                AttrLayout {
                    name: desc.name().to_string(),
                    attr_type: desc.attr_type(),
                    storage,
                },
            );
        }
        Ok(Self {
            instance_count,
            entries,
        })
    }

    /// Number of instances the pool holds.
    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Look up an attribute's layout.
    pub fn get(&self, attr: AttrId) -> Option<&AttrLayout> {
        self.entries.get(&attr)
    }

    /// Iterate over all entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttrId, &AttrLayout)> {
        self.entries.iter()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool has no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fixed-storage bytes per instance.
    pub fn footprint_bytes(&self) -> usize {
        self.entries.values().map(AttrLayout::footprint_bytes).sum()
    }

    /// Fixed-storage bytes for the whole pool.
    pub fn fixed_bytes(&self) -> usize {
        self.footprint_bytes() * self.instance_count
    }
}

/// Require pools to be allocated in schema ID order.
pub(crate) fn check_allocation_order(schema: &NodeSchema, pool_count: usize) -> Result<(), FrameError> {
    if schema.id().index() != pool_count {
        return Err(FrameError::InvalidConfig {
            reason: format!(
                "schema '{}' has id {} but {pool_count} pools are allocated",
                schema.name(),
                schema.id(),
            ),
        });
    }
    Ok(())
}
