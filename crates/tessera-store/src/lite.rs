//! Lightweight record backend.
//!
//! Every instance owns a growable record of tagged values, one field per
//! attribute in declaration order. No columnar layout; captures are
//! assembled field by field.

use smallvec::SmallVec;
use tessera_core::traits::{
    check_slot, check_slot_count, coerce, coerce_all, resolve, unknown_pool,
};
use tessera_core::{
    AttrCoord, AttrShape, AttrValue, Backend, ColumnData, FrameError, ImageColumn, NodeSchema,
    PoolImage, SchemaId,
};
use tracing::trace;

use crate::layout::{check_allocation_order, AttrStorage, PoolLayout};

/// Inline capacity for fixed fields; most attributes have few slots.
type Slots = SmallVec<[AttrValue; 4]>;

#[derive(Clone, Debug, PartialEq)]
enum Field {
    Fixed(Slots),
    List(Vec<AttrValue>),
}

type Record = Vec<Field>;

#[derive(Clone, Debug)]
struct LitePool {
    schema: NodeSchema,
    layout: PoolLayout,
    records: Vec<Record>,
}

impl LitePool {
    fn blank_record(layout: &PoolLayout) -> Record {
        layout
            .iter()
            .map(|(_, attr)| match attr.storage {
                AttrStorage::Fixed { slots, .. } => {
                    Field::Fixed(SmallVec::from_elem(attr.attr_type.zero(), slots))
                }
                AttrStorage::List => Field::List(Vec::new()),
            })
            .collect()
    }

    fn field(&self, at: AttrCoord, shape: AttrShape) -> Result<&Field, FrameError> {
        resolve(&self.schema, self.layout.instance_count(), at, shape)?;
        self.records
            .get(at.index)
            .and_then(|record| record.get(at.attr.index()))
            .ok_or_else(|| self.missing(at))
    }

    fn field_mut(&mut self, at: AttrCoord, shape: AttrShape) -> Result<&mut Field, FrameError> {
        resolve(&self.schema, self.layout.instance_count(), at, shape)?;
        let err = self.missing(at);
        self.records
            .get_mut(at.index)
            .and_then(|record| record.get_mut(at.attr.index()))
            .ok_or(err)
    }

    fn missing(&self, at: AttrCoord) -> FrameError {
        FrameError::IndexOutOfRange {
            schema: self.schema.name().to_string(),
            index: at.index,
            instance_count: self.records.len(),
        }
    }
}

/// Lightweight backend: one growable record per instance.
#[derive(Clone, Debug, Default)]
pub struct LiteBackend {
    pools: Vec<LitePool>,
}

impl LiteBackend {
    /// Create a backend with no pools.
    pub fn new() -> Self {
        Self::default()
    }

    fn pool(&self, schema: SchemaId) -> Result<&LitePool, FrameError> {
        self.pools.get(schema.index()).ok_or_else(|| unknown_pool(schema))
    }

    fn pool_mut(&mut self, schema: SchemaId) -> Result<&mut LitePool, FrameError> {
        self.pools
            .get_mut(schema.index())
            .ok_or_else(|| unknown_pool(schema))
    }
}

impl Backend for LiteBackend {
    fn name(&self) -> &'static str {
        "lite"
    }

    fn allocate_pool(
        &mut self,
        schema: &NodeSchema,
        instance_count: usize,
    ) -> Result<(), FrameError> {
        check_allocation_order(schema, self.pools.len())?;
        let layout = PoolLayout::from_schema(schema, instance_count)?;
        trace!(
            backend = "lite",
            schema = schema.name(),
            instances = instance_count,
            fixed_bytes = layout.fixed_bytes(),
            "pool allocated"
        );
        let blank = LitePool::blank_record(&layout);
        self.pools.push(LitePool {
            schema: schema.clone(),
            records: vec![blank; instance_count],
            layout,
        });
        Ok(())
    }

    fn pool_count(&self) -> usize {
        self.pools.len()
    }

    fn instance_count(&self, schema: SchemaId) -> Option<usize> {
        self.pools.get(schema.index()).map(|p| p.records.len())
    }

    fn get(&self, at: AttrCoord, slot: usize) -> Result<AttrValue, FrameError> {
        let pool = self.pool(at.schema)?;
        let field = pool.field(at, AttrShape::Fixed)?;
        let desc = pool.schema.resolve_id(at.attr)?;
        check_slot(&pool.schema, desc, slot)?;
        match field {
            Field::Fixed(values) => values.get(slot).copied().ok_or_else(|| pool.missing(at)),
            Field::List(_) => Err(pool.missing(at)),
        }
    }

    fn set(&mut self, at: AttrCoord, slot: usize, value: AttrValue) -> Result<(), FrameError> {
        let pool = self.pool_mut(at.schema)?;
        pool.field(at, AttrShape::Fixed)?;
        let desc = pool.schema.resolve_id(at.attr)?;
        check_slot(&pool.schema, desc, slot)?;
        let value = coerce(&pool.schema, desc, value)?;
        if let Field::Fixed(values) = pool.field_mut(at, AttrShape::Fixed)? {
            if let Some(target) = values.get_mut(slot) {
                *target = value;
            }
        }
        Ok(())
    }

    fn read_fixed(&self, at: AttrCoord, out: &mut Vec<AttrValue>) -> Result<(), FrameError> {
        let pool = self.pool(at.schema)?;
        if let Field::Fixed(values) = pool.field(at, AttrShape::Fixed)? {
            out.extend_from_slice(values);
        }
        Ok(())
    }

    fn write_fixed(&mut self, at: AttrCoord, values: &[AttrValue]) -> Result<(), FrameError> {
        let pool = self.pool_mut(at.schema)?;
        pool.field(at, AttrShape::Fixed)?;
        let desc = pool.schema.resolve_id(at.attr)?;
        check_slot_count(&pool.schema, desc, values.len())?;
        let values = coerce_all(&pool.schema, desc, values)?;
        if let Field::Fixed(slots) = pool.field_mut(at, AttrShape::Fixed)? {
            *slots = SmallVec::from_vec(values);
        }
        Ok(())
    }

    fn list_len(&self, at: AttrCoord) -> Result<usize, FrameError> {
        match self.pool(at.schema)?.field(at, AttrShape::List)? {
            Field::List(values) => Ok(values.len()),
            Field::Fixed(_) => Ok(0),
        }
    }

    fn read_list(&self, at: AttrCoord, out: &mut Vec<AttrValue>) -> Result<(), FrameError> {
        if let Field::List(values) = self.pool(at.schema)?.field(at, AttrShape::List)? {
            out.extend_from_slice(values);
        }
        Ok(())
    }

    fn push_list(&mut self, at: AttrCoord, value: AttrValue) -> Result<(), FrameError> {
        let pool = self.pool_mut(at.schema)?;
        pool.field(at, AttrShape::List)?;
        let desc = pool.schema.resolve_id(at.attr)?;
        let value = coerce(&pool.schema, desc, value)?;
        if let Field::List(values) = pool.field_mut(at, AttrShape::List)? {
            values.push(value);
        }
        Ok(())
    }

    fn replace_list(&mut self, at: AttrCoord, values: &[AttrValue]) -> Result<(), FrameError> {
        let pool = self.pool_mut(at.schema)?;
        pool.field(at, AttrShape::List)?;
        let desc = pool.schema.resolve_id(at.attr)?;
        let values = coerce_all(&pool.schema, desc, values)?;
        if let Field::List(list) = pool.field_mut(at, AttrShape::List)? {
            *list = values;
        }
        Ok(())
    }

    fn reset_pool(&mut self, schema: SchemaId) -> Result<(), FrameError> {
        let pool = self.pool_mut(schema)?;
        let blank = LitePool::blank_record(&pool.layout);
        for record in &mut pool.records {
            record.clone_from(&blank);
        }
        Ok(())
    }

    fn snapshot_pool(&self, schema: SchemaId) -> Result<PoolImage, FrameError> {
        let pool = self.pool(schema)?;
        let count = pool.records.len();
        let mut columns = Vec::with_capacity(pool.layout.len());
        for (position, (_, attr)) in pool.layout.iter().enumerate() {
            let mismatch = || FrameError::ImageMismatch {
                schema: pool.schema.name().to_string(),
                reason: format!("record field '{}' does not match its layout", attr.name),
            };
            let column = match attr.storage {
                AttrStorage::Fixed { slots, total_len } => {
                    let mut data = ColumnData::with_capacity(attr.attr_type, total_len);
                    for record in &pool.records {
                        let Some(Field::Fixed(values)) = record.get(position) else {
                            return Err(mismatch());
                        };
                        for &value in values {
                            data.push(value);
                        }
                    }
                    ImageColumn::Fixed { slots, data }
                }
                AttrStorage::List => {
                    let mut column = ImageColumn::empty_list(attr.attr_type);
                    for record in &pool.records {
                        let Some(Field::List(values)) = record.get(position) else {
                            return Err(mismatch());
                        };
                        column.push_list_values(values);
                    }
                    column
                }
            };
            columns.push(column);
        }
        Ok(PoolImage::new(count, columns))
    }

    fn restore_pool(&mut self, schema: SchemaId, image: &PoolImage) -> Result<(), FrameError> {
        let pool = self.pool_mut(schema)?;
        let count = pool.records.len();
        image.check(&pool.schema, count)?;
        let mut records = Vec::with_capacity(count);
        let mut scratch = Vec::new();
        for index in 0..count {
            let mut record = Record::with_capacity(image.columns().len());
            for desc in pool.schema.attributes() {
                scratch.clear();
                image.extend_values(index, desc.id(), &mut scratch).ok_or_else(|| {
                    FrameError::ImageMismatch {
                        schema: pool.schema.name().to_string(),
                        reason: format!("no values for instance {index} attribute '{}'", desc.name()),
                    }
                })?;
                record.push(if desc.is_list() {
                    Field::List(scratch.clone())
                } else {
                    Field::Fixed(SmallVec::from_slice(&scratch))
                });
            }
            records.push(record);
        }
        pool.records = records;
        Ok(())
    }

    fn memory_bytes(&self) -> usize {
        let mut bytes = 0;
        for pool in &self.pools {
            for record in &pool.records {
                for (field, (_, attr)) in record.iter().zip(pool.layout.iter()) {
                    let len = match field {
                        Field::Fixed(values) => values.len(),
                        Field::List(values) => values.len(),
                    };
                    bytes += len * attr.attr_type.width();
                }
            }
        }
        bytes
    }
}
