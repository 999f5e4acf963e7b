//! Dense fixed-layout backend.
//!
//! Each fixed attribute is one contiguous typed column of
//! `instance_count * slots` values, instance-major, so instance `i` slot `s`
//! lives at `i * slots + s`. Each list attribute keeps one typed column per
//! instance.

use tessera_core::traits::{
    check_slot, check_slot_count, coerce, coerce_all, resolve, unknown_pool,
};
use tessera_core::{
    AttrCoord, AttrShape, AttrValue, Backend, ColumnData, FrameError, ImageColumn, NodeSchema,
    PoolImage, SchemaId,
};
use tracing::trace;

use crate::layout::{check_allocation_order, AttrStorage, PoolLayout};

#[derive(Clone, Debug)]
enum DenseColumn {
    Fixed { slots: usize, data: ColumnData },
    List(Vec<ColumnData>),
}

#[derive(Clone, Debug)]
struct DensePool {
    schema: NodeSchema,
    layout: PoolLayout,
    columns: Vec<DenseColumn>,
}

impl DensePool {
    fn fixed(&self, at: AttrCoord) -> Result<(usize, &ColumnData), FrameError> {
        resolve(&self.schema, self.layout.instance_count(), at, AttrShape::Fixed)?;
        match self.columns.get(at.attr.index()) {
            Some(DenseColumn::Fixed { slots, data }) => Ok((*slots, data)),
            _ => Err(self.shape_error(at, AttrShape::Fixed)),
        }
    }

    fn fixed_mut(&mut self, at: AttrCoord) -> Result<(usize, &mut ColumnData), FrameError> {
        resolve(&self.schema, self.layout.instance_count(), at, AttrShape::Fixed)?;
        let err = self.shape_error(at, AttrShape::Fixed);
        match self.columns.get_mut(at.attr.index()) {
            Some(DenseColumn::Fixed { slots, data }) => Ok((*slots, data)),
            _ => Err(err),
        }
    }

    fn list(&self, at: AttrCoord) -> Result<&ColumnData, FrameError> {
        resolve(&self.schema, self.layout.instance_count(), at, AttrShape::List)?;
        match self.columns.get(at.attr.index()) {
            Some(DenseColumn::List(lists)) => lists
                .get(at.index)
                .ok_or_else(|| self.shape_error(at, AttrShape::List)),
            _ => Err(self.shape_error(at, AttrShape::List)),
        }
    }

    fn list_mut(&mut self, at: AttrCoord) -> Result<&mut ColumnData, FrameError> {
        resolve(&self.schema, self.layout.instance_count(), at, AttrShape::List)?;
        let err = self.shape_error(at, AttrShape::List);
        match self.columns.get_mut(at.attr.index()) {
            Some(DenseColumn::List(lists)) => lists.get_mut(at.index).ok_or(err),
            _ => Err(err),
        }
    }

    /// Storage disagrees with the schema. Only reachable if a column was
    /// built for a different layout.
    fn shape_error(&self, at: AttrCoord, expected: AttrShape) -> FrameError {
        let actual = match expected {
            AttrShape::Fixed => AttrShape::List,
            AttrShape::List => AttrShape::Fixed,
        };
        FrameError::ShapeMismatch {
            schema: self.schema.name().to_string(),
            attr: format!("#{}", at.attr),
            expected,
            actual,
        }
    }

    fn build_columns(layout: &PoolLayout) -> Vec<DenseColumn> {
        layout
            .iter()
            .map(|(_, attr)| match attr.storage {
                AttrStorage::Fixed { slots, total_len } => DenseColumn::Fixed {
                    slots,
                    data: ColumnData::zeroed(attr.attr_type, total_len),
                },
                AttrStorage::List => DenseColumn::List(
                    (0..layout.instance_count())
                        .map(|_| ColumnData::with_capacity(attr.attr_type, 0))
                        .collect(),
                ),
            })
            .collect()
    }
}

/// Dense fixed-layout backend: contiguous typed arrays per attribute.
#[derive(Clone, Debug, Default)]
pub struct DenseBackend {
    pools: Vec<DensePool>,
}

impl DenseBackend {
    /// Create a backend with no pools.
    pub fn new() -> Self {
        Self::default()
    }

    fn pool(&self, schema: SchemaId) -> Result<&DensePool, FrameError> {
        self.pools.get(schema.index()).ok_or_else(|| unknown_pool(schema))
    }

    fn pool_mut(&mut self, schema: SchemaId) -> Result<&mut DensePool, FrameError> {
        self.pools
            .get_mut(schema.index())
            .ok_or_else(|| unknown_pool(schema))
    }
}

impl Backend for DenseBackend {
    fn name(&self) -> &'static str {
        "dense"
    }

    fn allocate_pool(
        &mut self,
        schema: &NodeSchema,
        instance_count: usize,
    ) -> Result<(), FrameError> {
        check_allocation_order(schema, self.pools.len())?;
        let layout = PoolLayout::from_schema(schema, instance_count)?;
        trace!(
            backend = "dense",
            schema = schema.name(),
            instances = instance_count,
            fixed_bytes = layout.fixed_bytes(),
            "pool allocated"
        );
        let columns = DensePool::build_columns(&layout);
        self.pools.push(DensePool {
            schema: schema.clone(),
            layout,
            columns,
        });
        Ok(())
    }

    fn pool_count(&self) -> usize {
        self.pools.len()
    }

    fn instance_count(&self, schema: SchemaId) -> Option<usize> {
        self.pools
            .get(schema.index())
            .map(|p| p.layout.instance_count())
    }

    fn get(&self, at: AttrCoord, slot: usize) -> Result<AttrValue, FrameError> {
        let pool = self.pool(at.schema)?;
        let desc = pool.schema.resolve_id(at.attr)?;
        let (slots, data) = pool.fixed(at)?;
        check_slot(&pool.schema, desc, slot)?;
        data.get(at.index * slots + slot)
            .ok_or_else(|| pool.shape_error(at, AttrShape::Fixed))
    }

    fn set(&mut self, at: AttrCoord, slot: usize, value: AttrValue) -> Result<(), FrameError> {
        let pool = self.pool_mut(at.schema)?;
        let desc = pool.schema.resolve_id(at.attr)?.clone();
        pool.fixed(at)?;
        check_slot(&pool.schema, &desc, slot)?;
        let value = coerce(&pool.schema, &desc, value)?;
        let (slots, data) = pool.fixed_mut(at)?;
        data.set(at.index * slots + slot, value);
        Ok(())
    }

    fn read_fixed(&self, at: AttrCoord, out: &mut Vec<AttrValue>) -> Result<(), FrameError> {
        let pool = self.pool(at.schema)?;
        let (slots, data) = pool.fixed(at)?;
        let start = at.index * slots;
        if !data.extend_into(start..start + slots, out) {
            return Err(pool.shape_error(at, AttrShape::Fixed));
        }
        Ok(())
    }

    fn write_fixed(&mut self, at: AttrCoord, values: &[AttrValue]) -> Result<(), FrameError> {
        let pool = self.pool_mut(at.schema)?;
        let desc = pool.schema.resolve_id(at.attr)?.clone();
        pool.fixed(at)?;
        check_slot_count(&pool.schema, &desc, values.len())?;
        let values = coerce_all(&pool.schema, &desc, values)?;
        let (slots, data) = pool.fixed_mut(at)?;
        let start = at.index * slots;
        for (offset, value) in values.into_iter().enumerate() {
            data.set(start + offset, value);
        }
        Ok(())
    }

    fn list_len(&self, at: AttrCoord) -> Result<usize, FrameError> {
        Ok(self.pool(at.schema)?.list(at)?.len())
    }

    fn read_list(&self, at: AttrCoord, out: &mut Vec<AttrValue>) -> Result<(), FrameError> {
        let list = self.pool(at.schema)?.list(at)?;
        list.extend_into(0..list.len(), out);
        Ok(())
    }

    fn push_list(&mut self, at: AttrCoord, value: AttrValue) -> Result<(), FrameError> {
        let pool = self.pool_mut(at.schema)?;
        pool.list(at)?;
        let desc = pool.schema.resolve_id(at.attr)?;
        let value = coerce(&pool.schema, desc, value)?;
        pool.list_mut(at)?.push(value);
        Ok(())
    }

    fn replace_list(&mut self, at: AttrCoord, values: &[AttrValue]) -> Result<(), FrameError> {
        let pool = self.pool_mut(at.schema)?;
        pool.list(at)?;
        let desc = pool.schema.resolve_id(at.attr)?;
        let values = coerce_all(&pool.schema, desc, values)?;
        let list = pool.list_mut(at)?;
        list.clear();
        for value in values {
            list.push(value);
        }
        Ok(())
    }

    fn reset_pool(&mut self, schema: SchemaId) -> Result<(), FrameError> {
        let pool = self.pool_mut(schema)?;
        for column in &mut pool.columns {
            match column {
                DenseColumn::Fixed { data, .. } => data.fill_zero(),
                DenseColumn::List(lists) => lists.iter_mut().for_each(ColumnData::clear),
            }
        }
        Ok(())
    }

    fn snapshot_pool(&self, schema: SchemaId) -> Result<PoolImage, FrameError> {
        let pool = self.pool(schema)?;
        let columns = pool
            .columns
            .iter()
            .zip(pool.schema.attributes())
            .map(|(column, desc)| match column {
                DenseColumn::Fixed { slots, data } => ImageColumn::Fixed {
                    slots: *slots,
                    data: data.clone(),
                },
                DenseColumn::List(lists) => {
                    let mut image = ImageColumn::empty_list(desc.attr_type());
                    for list in lists {
                        image.push_list_column(list);
                    }
                    image
                }
            })
            .collect();
        Ok(PoolImage::new(pool.layout.instance_count(), columns))
    }

    fn restore_pool(&mut self, schema: SchemaId, image: &PoolImage) -> Result<(), FrameError> {
        let pool = self.pool_mut(schema)?;
        let instance_count = pool.layout.instance_count();
        image.check(&pool.schema, instance_count)?;
        let mut columns = Vec::with_capacity(image.columns().len());
        for column in image.columns() {
            let restored = match column {
                ImageColumn::Fixed { slots, data } => DenseColumn::Fixed {
                    slots: *slots,
                    data: data.clone(),
                },
                ImageColumn::List { data, .. } => {
                    let mut lists = Vec::with_capacity(instance_count);
                    for index in 0..instance_count {
                        let list = column
                            .range(index)
                            .and_then(|range| data.slice_to_column(range))
                            .ok_or_else(|| FrameError::ImageMismatch {
                                schema: pool.schema.name().to_string(),
                                reason: format!("list offsets for instance {index} are out of bounds"),
                            })?;
                        lists.push(list);
                    }
                    DenseColumn::List(lists)
                }
            };
            columns.push(restored);
        }
        pool.columns = columns;
        Ok(())
    }

    fn memory_bytes(&self) -> usize {
        self.pools
            .iter()
            .flat_map(|pool| &pool.columns)
            .map(|column| match column {
                DenseColumn::Fixed { data, .. } => data.memory_bytes(),
                DenseColumn::List(lists) => lists.iter().map(ColumnData::memory_bytes).sum(),
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance;
    use tessera_core::{AttrId, AttributeSpec, AttributeType};

    fn backend_with(schema: NodeSchema, count: usize) -> DenseBackend {
        let mut backend = DenseBackend::new();
        backend.allocate_pool(&schema, count).unwrap();
        backend
    }

    #[test]
    fn fixed_column_is_instance_major() {
        let schema = NodeSchema::new("unit")
            .and_then(|s| s.with_attribute(AttributeSpec::of::<i64>("pos").slots(2)))
            .unwrap();
        let mut backend = backend_with(schema, 3);
        let at = AttrCoord::new(SchemaId(0), 1, AttrId(0));
        backend.set(at, 0, AttrValue::Int64(10)).unwrap();
        backend.set(at, 1, AttrValue::Int64(11)).unwrap();

        let image = backend.snapshot_pool(SchemaId(0)).unwrap();
        assert_eq!(
            image.column(AttrId(0)).unwrap().data(),
            &ColumnData::from(vec![0i64, 0, 10, 11, 0, 0])
        );
    }

    #[test]
    fn memory_counts_fixed_and_list_values() {
        let schema = NodeSchema::new("unit")
            .and_then(|s| s.with_attribute(AttributeSpec::new("a", AttributeType::Int32).slots(2)))
            .and_then(|s| s.with_attribute(AttributeSpec::new("b", AttributeType::UInt16).list()))
            .unwrap();
        let mut backend = backend_with(schema, 4);
        assert_eq!(backend.memory_bytes(), 4 * 2 * 4);
        backend
            .replace_list(
                AttrCoord::new(SchemaId(0), 0, AttrId(1)),
                &[AttrValue::UInt16(1), AttrValue::UInt16(2)],
            )
            .unwrap();
        assert_eq!(backend.memory_bytes(), 32 + 4);
    }

    #[test]
    fn out_of_order_allocation_rejected() {
        let mut reg = tessera_core::SchemaRegistry::new();
        reg.declare_schema("a").unwrap();
        let b = reg.declare_schema("b").unwrap();
        let mut backend = DenseBackend::new();
        let err = backend.allocate_pool(reg.get(b).unwrap(), 1).unwrap_err();
        assert!(matches!(err, FrameError::InvalidConfig { .. }));
    }

    #[test]
    fn compliance_dense() {
        compliance::run_full_compliance(DenseBackend::new);
    }
}
