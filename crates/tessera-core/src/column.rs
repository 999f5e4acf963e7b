//! Typed columns and the backend-neutral captured pool image.
//!
//! [`ColumnData`] is a homogeneous vector of one attribute type. Backends
//! use it as working storage and every backend captures its pools into the
//! same [`PoolImage`] layout, so snapshots taken from one backend read
//! identically to snapshots taken from another.

use std::ops::Range;

use crate::attr::{AttrPrimitive, AttrValue, AttributeType};
use crate::error::FrameError;
use crate::id::AttrId;
use crate::schema::NodeSchema;

/// A homogeneous, typed vector of attribute values.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    /// `int8` values.
    Int8(Vec<i8>),
    /// `int16` values.
    Int16(Vec<i16>),
    /// `int32` values.
    Int32(Vec<i32>),
    /// `int64` values.
    Int64(Vec<i64>),
    /// `uint8` values.
    UInt8(Vec<u8>),
    /// `uint16` values.
    UInt16(Vec<u16>),
    /// `uint32` values.
    UInt32(Vec<u32>),
    /// `uint64` values.
    UInt64(Vec<u64>),
    /// `float32` values.
    Float32(Vec<f32>),
    /// `float64` values.
    Float64(Vec<f64>),
}

macro_rules! each_column {
    ($column:expr, $v:ident => $body:expr) => {
        match $column {
            ColumnData::Int8($v) => $body,
            ColumnData::Int16($v) => $body,
            ColumnData::Int32($v) => $body,
            ColumnData::Int64($v) => $body,
            ColumnData::UInt8($v) => $body,
            ColumnData::UInt16($v) => $body,
            ColumnData::UInt32($v) => $body,
            ColumnData::UInt64($v) => $body,
            ColumnData::Float32($v) => $body,
            ColumnData::Float64($v) => $body,
        }
    };
}

macro_rules! for_type {
    ($ty:expr, $make:expr) => {
        match $ty {
            AttributeType::Int8 => ColumnData::Int8($make),
            AttributeType::Int16 => ColumnData::Int16($make),
            AttributeType::Int32 => ColumnData::Int32($make),
            AttributeType::Int64 => ColumnData::Int64($make),
            AttributeType::UInt8 => ColumnData::UInt8($make),
            AttributeType::UInt16 => ColumnData::UInt16($make),
            AttributeType::UInt32 => ColumnData::UInt32($make),
            AttributeType::UInt64 => ColumnData::UInt64($make),
            AttributeType::Float32 => ColumnData::Float32($make),
            AttributeType::Float64 => ColumnData::Float64($make),
        }
    };
}

fn store<T: AttrPrimitive>(slot: Option<&mut T>, value: AttrValue) -> bool {
    match (slot, T::try_from(value)) {
        (Some(slot), Ok(v)) => {
            *slot = v;
            true
        }
        _ => false,
    }
}

fn append<T: AttrPrimitive>(column: &mut Vec<T>, value: AttrValue) -> bool {
    match T::try_from(value) {
        Ok(v) => {
            column.push(v);
            true
        }
        Err(_) => false,
    }
}

fn read_range<T: AttrPrimitive>(column: &[T], range: Range<usize>, out: &mut Vec<AttrValue>) -> bool {
    match column.get(range) {
        Some(values) => {
            out.extend(values.iter().map(|&v| v.into()));
            true
        }
        None => false,
    }
}

impl ColumnData {
    /// A column of `len` zero values.
    pub fn zeroed(ty: AttributeType, len: usize) -> Self {
        for_type!(ty, vec![Default::default(); len])
    }

    /// An empty column with room for `capacity` values.
    pub fn with_capacity(ty: AttributeType, capacity: usize) -> Self {
        for_type!(ty, Vec::with_capacity(capacity))
    }

    /// The element type.
    pub fn attr_type(&self) -> AttributeType {
        match self {
            Self::Int8(_) => AttributeType::Int8,
            Self::Int16(_) => AttributeType::Int16,
            Self::Int32(_) => AttributeType::Int32,
            Self::Int64(_) => AttributeType::Int64,
            Self::UInt8(_) => AttributeType::UInt8,
            Self::UInt16(_) => AttributeType::UInt16,
            Self::UInt32(_) => AttributeType::UInt32,
            Self::UInt64(_) => AttributeType::UInt64,
            Self::Float32(_) => AttributeType::Float32,
            Self::Float64(_) => AttributeType::Float64,
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        each_column!(self, v => v.len())
    }

    /// Whether the column holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value at `i`, or `None` if out of range.
    pub fn get(&self, i: usize) -> Option<AttrValue> {
        each_column!(self, v => v.get(i).map(|&x| x.into()))
    }

    /// Overwrite the value at `i`, converting losslessly.
    ///
    /// Returns `false` (leaving the column unchanged) if `i` is out of
    /// range or the value cannot be represented in the column type.
    pub fn set(&mut self, i: usize, value: AttrValue) -> bool {
        each_column!(self, v => store(v.get_mut(i), value))
    }

    /// Append a value, converting losslessly. Returns `false` on mismatch.
    pub fn push(&mut self, value: AttrValue) -> bool {
        each_column!(self, v => append(v, value))
    }

    /// Shorten to `len` values.
    pub fn truncate(&mut self, len: usize) {
        each_column!(self, v => v.truncate(len))
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        each_column!(self, v => v.clear())
    }

    /// Set every value to zero, keeping the length.
    pub fn fill_zero(&mut self) {
        each_column!(self, v => v.fill(Default::default()))
    }

    /// Append the values in `range` to `out`. Returns `false` if the
    /// range is out of bounds.
    pub fn extend_into(&self, range: Range<usize>, out: &mut Vec<AttrValue>) -> bool {
        each_column!(self, v => read_range(v, range, out))
    }

    /// Append every value of `other`. Returns `false` if the element types
    /// differ.
    pub fn extend_from_column(&mut self, other: &ColumnData) -> bool {
        match (self, other) {
            (Self::Int8(a), Self::Int8(b)) => a.extend_from_slice(b),
            (Self::Int16(a), Self::Int16(b)) => a.extend_from_slice(b),
            (Self::Int32(a), Self::Int32(b)) => a.extend_from_slice(b),
            (Self::Int64(a), Self::Int64(b)) => a.extend_from_slice(b),
            (Self::UInt8(a), Self::UInt8(b)) => a.extend_from_slice(b),
            (Self::UInt16(a), Self::UInt16(b)) => a.extend_from_slice(b),
            (Self::UInt32(a), Self::UInt32(b)) => a.extend_from_slice(b),
            (Self::UInt64(a), Self::UInt64(b)) => a.extend_from_slice(b),
            (Self::Float32(a), Self::Float32(b)) => a.extend_from_slice(b),
            (Self::Float64(a), Self::Float64(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }

    /// Copy the values in `range` into a new column.
    pub fn slice_to_column(&self, range: Range<usize>) -> Option<ColumnData> {
        each_column!(self, v => v.get(range).map(|s| ColumnData::from(s.to_vec())))
    }

    /// Heap bytes held by the values (length, not capacity).
    pub fn memory_bytes(&self) -> usize {
        self.len() * self.attr_type().width()
    }
}

macro_rules! column_from_vec {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$t>> for ColumnData {
                fn from(v: Vec<$t>) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

column_from_vec! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

// ── Captured images ─────────────────────────────────────────────

/// One attribute of a captured pool.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageColumn {
    /// `instance_count * slots` values, instance-major.
    Fixed {
        /// Slots per instance.
        slots: usize,
        /// Instance-major values.
        data: ColumnData,
    },
    /// Concatenated list elements with CSR offsets.
    ///
    /// `offsets` has `instance_count + 1` entries; instance `i` owns
    /// `data[offsets[i]..offsets[i + 1]]`.
    List {
        /// Start offset of each instance's elements, plus the end.
        offsets: Vec<usize>,
        /// Concatenated elements.
        data: ColumnData,
    },
}

impl ImageColumn {
    /// An empty list column ready for [`ImageColumn::push_list_column`] or
    /// [`ImageColumn::push_list_values`].
    pub fn empty_list(ty: AttributeType) -> Self {
        Self::List {
            offsets: vec![0],
            data: ColumnData::with_capacity(ty, 0),
        }
    }

    /// Append one instance's list from a typed column.
    ///
    /// Returns `false` if this is not a list column or the types differ.
    pub fn push_list_column(&mut self, values: &ColumnData) -> bool {
        match self {
            Self::List { offsets, data } => {
                if !data.extend_from_column(values) {
                    return false;
                }
                offsets.push(data.len());
                true
            }
            Self::Fixed { .. } => false,
        }
    }

    /// Append one instance's list from tagged values.
    ///
    /// Returns `false` if this is not a list column or a value cannot be
    /// represented; on failure the column is unchanged.
    pub fn push_list_values(&mut self, values: &[AttrValue]) -> bool {
        match self {
            Self::List { offsets, data } => {
                let start = data.len();
                if !values.iter().all(|&v| data.push(v)) {
                    data.truncate(start);
                    return false;
                }
                offsets.push(data.len());
                true
            }
            Self::Fixed { .. } => false,
        }
    }

    /// The underlying values.
    pub fn data(&self) -> &ColumnData {
        match self {
            Self::Fixed { data, .. } | Self::List { data, .. } => data,
        }
    }

    /// Range of `data` owned by instance `index`.
    pub fn range(&self, index: usize) -> Option<Range<usize>> {
        match self {
            Self::Fixed { slots, data } => {
                let start = index.checked_mul(*slots)?;
                let end = start.checked_add(*slots)?;
                (end <= data.len()).then_some(start..end)
            }
            Self::List { offsets, .. } => {
                let start = *offsets.get(index)?;
                let end = *offsets.get(index + 1)?;
                Some(start..end)
            }
        }
    }

    /// Number of instances this column covers.
    pub fn instance_count(&self) -> usize {
        match self {
            Self::Fixed { slots, data } => data.len().checked_div(*slots).unwrap_or(0),
            Self::List { offsets, .. } => offsets.len().saturating_sub(1),
        }
    }

    /// Heap bytes held by values and offsets.
    pub fn memory_bytes(&self) -> usize {
        match self {
            Self::Fixed { data, .. } => data.memory_bytes(),
            Self::List { offsets, data } => {
                data.memory_bytes() + offsets.len() * std::mem::size_of::<usize>()
            }
        }
    }
}

/// A captured pool: one [`ImageColumn`] per attribute, indexed by
/// [`AttrId`].
#[derive(Clone, Debug, PartialEq)]
pub struct PoolImage {
    instance_count: usize,
    columns: Vec<ImageColumn>,
}

impl PoolImage {
    /// Assemble an image from per-attribute columns in declaration order.
    pub fn new(instance_count: usize, columns: Vec<ImageColumn>) -> Self {
        Self {
            instance_count,
            columns,
        }
    }

    /// Number of instances captured.
    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Columns in attribute declaration order.
    pub fn columns(&self) -> &[ImageColumn] {
        &self.columns
    }

    /// The column for `attr`.
    pub fn column(&self, attr: AttrId) -> Option<&ImageColumn> {
        self.columns.get(attr.index())
    }

    /// Append the values of (`index`, `attr`) to `out`, returning how many
    /// were appended. `None` if either is out of range.
    pub fn extend_values(&self, index: usize, attr: AttrId, out: &mut Vec<AttrValue>) -> Option<usize> {
        if index >= self.instance_count {
            return None;
        }
        let column = self.column(attr)?;
        let range = column.range(index)?;
        let n = range.len();
        column.data().extend_into(range, out).then_some(n)
    }

    /// Number of values held for (`index`, `attr`).
    pub fn value_count(&self, index: usize, attr: AttrId) -> Option<usize> {
        if index >= self.instance_count {
            return None;
        }
        self.column(attr)?.range(index).map(|r| r.len())
    }

    /// Heap bytes held by every column.
    pub fn memory_bytes(&self) -> usize {
        self.columns.iter().map(ImageColumn::memory_bytes).sum()
    }

    /// Verify the image fits `schema` with `instance_count` instances.
    pub fn check(&self, schema: &NodeSchema, instance_count: usize) -> Result<(), FrameError> {
        let mismatch = |reason: String| FrameError::ImageMismatch {
            schema: schema.name().to_string(),
            reason,
        };
        if self.instance_count != instance_count {
            return Err(mismatch(format!(
                "image holds {} instances, pool holds {instance_count}",
                self.instance_count
            )));
        }
        if self.columns.len() != schema.len() {
            return Err(mismatch(format!(
                "image holds {} attributes, schema declares {}",
                self.columns.len(),
                schema.len()
            )));
        }
        for (desc, column) in schema.attributes().zip(&self.columns) {
            if column.data().attr_type() != desc.attr_type() {
                return Err(mismatch(format!(
                    "attribute '{}' captured as {}, declared {}",
                    desc.name(),
                    column.data().attr_type(),
                    desc.attr_type()
                )));
            }
            let fits = match (column, desc.fixed_slots()) {
                (ImageColumn::Fixed { slots, data }, Some(declared)) => {
                    *slots == declared && data.len() == declared * instance_count
                }
                (ImageColumn::List { offsets, data }, None) => {
                    offsets.len() == instance_count + 1
                        && offsets.first() == Some(&0)
                        && offsets.last() == Some(&data.len())
                        && offsets.windows(2).all(|w| w[0] <= w[1])
                }
                _ => false,
            };
            if !fits {
                return Err(mismatch(format!(
                    "attribute '{}' has the wrong shape or length",
                    desc.name()
                )));
            }
        }
        Ok(())
    }
}
