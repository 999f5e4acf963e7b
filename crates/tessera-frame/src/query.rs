//! Snapshot queries: selector spec, compiled plan, flat result.
//!
//! A [`SnapshotQuery`] names a schema, a tick selection, an instance
//! selection and a list of attributes. It is compiled against the schema
//! into a [`QueryPlan`] (resolving names and checking indices) before the
//! ring is consulted, then executed into a [`QueryResult`].
//!
//! # Ordering
//!
//! Values are emitted row-major over `tick → index → attribute → slot`:
//!
//! ```text
//! for tick in ticks
//!   for index in indices
//!     for attr in attrs
//!       for value in captured(tick, index, attr)   // slots, or list elements
//! ```
//!
//! A fixed attribute contributes its declared slot count per cell; a list
//! attribute contributes its captured length. [`QueryResult::cell`]
//! decodes one `(tick, index, attr)` cell without manual offset math.

use std::ops::Range;

use tessera_core::{AttrId, AttrValue, FrameError, NodeSchema, SchemaId, TickId};

use crate::ring::SnapshotRing;

/// Which ticks a query reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TickSelector {
    /// A single tick.
    At(TickId),
    /// An explicit ordered list (duplicates are repeated in the output).
    List(Vec<TickId>),
    /// Every held tick, in capture order.
    #[default]
    All,
}

/// Which instances a query reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IndexSelector {
    /// A single instance.
    At(usize),
    /// An explicit ordered list (duplicates are repeated in the output).
    List(Vec<usize>),
    /// Every instance, ascending.
    #[default]
    All,
}

/// A snapshot query over one schema.
///
/// Defaults to every held tick and every instance; attributes must be
/// named explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotQuery {
    schema: String,
    ticks: TickSelector,
    indices: IndexSelector,
    attrs: Vec<String>,
}

impl SnapshotQuery {
    /// Start a query over `schema`.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ticks: TickSelector::All,
            indices: IndexSelector::All,
            attrs: Vec::new(),
        }
    }

    /// Read a single tick.
    pub fn tick(mut self, tick: impl Into<TickId>) -> Self {
        self.ticks = TickSelector::At(tick.into());
        self
    }

    /// Read an explicit list of ticks, in the given order.
    pub fn ticks<T: Into<TickId>>(mut self, ticks: impl IntoIterator<Item = T>) -> Self {
        self.ticks = TickSelector::List(ticks.into_iter().map(Into::into).collect());
        self
    }

    /// Read every held tick (the default).
    pub fn all_ticks(mut self) -> Self {
        self.ticks = TickSelector::All;
        self
    }

    /// Read a single instance.
    pub fn index(mut self, index: usize) -> Self {
        self.indices = IndexSelector::At(index);
        self
    }

    /// Read an explicit list of instances, in the given order.
    pub fn indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.indices = IndexSelector::List(indices.into_iter().collect());
        self
    }

    /// Read every instance (the default).
    pub fn all_indices(mut self) -> Self {
        self.indices = IndexSelector::All;
        self
    }

    /// Append one attribute.
    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(name.into());
        self
    }

    /// Append several attributes, in the given order.
    pub fn attrs<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.attrs.extend(names.into_iter().map(Into::into));
        self
    }

    /// The queried schema name.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Resolve attribute names and instance indices against `schema`.
    ///
    /// Fails with `UnknownAttribute` or `IndexOutOfRange`; never touches
    /// the snapshot ring.
    pub fn compile(&self, schema: &NodeSchema, instance_count: usize) -> Result<QueryPlan, FrameError> {
        let attrs = self
            .attrs
            .iter()
            .map(|name| schema.resolve(name).map(|d| (d.id(), d.name().to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let indices = match &self.indices {
            IndexSelector::At(index) => vec![*index],
            IndexSelector::List(indices) => indices.clone(),
            IndexSelector::All => (0..instance_count).collect(),
        };
        if let Some(&index) = indices.iter().find(|&&i| i >= instance_count) {
            return Err(FrameError::IndexOutOfRange {
                schema: schema.name().to_string(),
                index,
                instance_count,
            });
        }

        Ok(QueryPlan {
            schema: schema.id(),
            ticks: self.ticks.clone(),
            indices,
            attrs,
        })
    }
}

/// A query resolved against a schema, ready to run against a ring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryPlan {
    schema: SchemaId,
    ticks: TickSelector,
    indices: Vec<usize>,
    attrs: Vec<(AttrId, String)>,
}

impl QueryPlan {
    /// The resolved schema.
    pub fn schema(&self) -> SchemaId {
        self.schema
    }

    /// Resolved instance indices, in output order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Run the plan.
    ///
    /// Every requested tick is looked up before any value is copied; a
    /// missing tick fails with `TickNotFound` and produces no output.
    pub fn execute(&self, ring: &SnapshotRing) -> Result<QueryResult, FrameError> {
        let ticks = match &self.ticks {
            TickSelector::At(tick) => vec![*tick],
            TickSelector::List(ticks) => ticks.clone(),
            TickSelector::All => ring.ticks(),
        };
        let snapshots = ticks
            .iter()
            .map(|&tick| ring.get(tick).ok_or(FrameError::TickNotFound { tick }))
            .collect::<Result<Vec<_>, _>>()?;

        let cells = ticks.len() * self.indices.len() * self.attrs.len();
        let mut offsets = Vec::with_capacity(cells + 1);
        let mut values = Vec::new();
        offsets.push(0);
        for snapshot in &snapshots {
            for &index in &self.indices {
                for (attr, name) in &self.attrs {
                    snapshot
                        .extend_values(self.schema, index, *attr, &mut values)
                        .ok_or_else(|| FrameError::ImageMismatch {
                            schema: format!("#{}", self.schema),
                            reason: format!(
                                "tick {} holds no values for instance {index} attribute '{name}'",
                                snapshot.tick()
                            ),
                        })?;
                    offsets.push(values.len());
                }
            }
        }

        Ok(QueryResult {
            ticks,
            indices: self.indices.clone(),
            attrs: self.attrs.iter().map(|(_, name)| name.clone()).collect(),
            offsets,
            values,
        })
    }
}

/// The flat output of a snapshot query plus the shape needed to decode it.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    ticks: Vec<TickId>,
    indices: Vec<usize>,
    attrs: Vec<String>,
    offsets: Vec<usize>,
    values: Vec<AttrValue>,
}

impl QueryResult {
    /// Resolved ticks, in output order.
    pub fn ticks(&self) -> &[TickId] {
        &self.ticks
    }

    /// Resolved instance indices, in output order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Attribute names, in output order.
    pub fn attributes(&self) -> &[String] {
        &self.attrs
    }

    /// The flat values, ordered `tick → index → attribute → slot`.
    pub fn values(&self) -> &[AttrValue] {
        &self.values
    }

    /// Consume the result, keeping only the flat values.
    pub fn into_values(self) -> Vec<AttrValue> {
        self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the result holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value count of every `(tick, index, attr)` cell, in output order.
    pub fn counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets.windows(2).map(|w| w[1] - w[0])
    }

    fn cell_range(&self, tick: usize, index: usize, attr: usize) -> Option<Range<usize>> {
        if tick >= self.ticks.len() || index >= self.indices.len() || attr >= self.attrs.len() {
            return None;
        }
        let cell = (tick * self.indices.len() + index) * self.attrs.len() + attr;
        Some(self.offsets[cell]..self.offsets[cell + 1])
    }

    /// The values of one cell, addressed by position within
    /// [`ticks`](Self::ticks), [`indices`](Self::indices) and
    /// [`attributes`](Self::attributes).
    pub fn cell(&self, tick: usize, index: usize, attr: usize) -> Option<&[AttrValue]> {
        self.cell_range(tick, index, attr)
            .map(|range| &self.values[range])
    }

    /// Every value widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.to_f64()).collect()
    }

    /// Every value narrowed to `f32`, for observation vectors.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values.iter().map(|v| v.to_f64() as f32).collect()
    }
}
