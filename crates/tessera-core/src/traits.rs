//! The storage backend contract and the coordinate checks every backend
//! shares.

use crate::attr::AttrValue;
use crate::column::PoolImage;
use crate::error::{AttrShape, FrameError};
use crate::id::{AttrId, SchemaId};
use crate::schema::{AttributeDescriptor, NodeSchema};

/// Addresses one attribute of one instance: `(schema, index, attr)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttrCoord {
    /// The node schema.
    pub schema: SchemaId,
    /// Instance index within the schema's pool.
    pub index: usize,
    /// The attribute within the schema.
    pub attr: AttrId,
}

impl AttrCoord {
    /// Construct a coordinate.
    pub fn new(schema: SchemaId, index: usize, attr: AttrId) -> Self {
        Self {
            schema,
            index,
            attr,
        }
    }
}

/// Storage and access strategy for the node pools of one frame.
///
/// A backend owns the live values of every pool. All implementations must
/// be observably identical: same values, same errors, same captured
/// images. The free functions in this module ([`resolve`], [`check_slot`],
/// [`coerce`]) perform the coordinate and value checks in a fixed order,
/// and backends call them rather than validating on their own.
///
/// Failed calls must leave every pool unchanged.
pub trait Backend: Send {
    /// Stable backend name (`"dense"`, `"lite"`, ...).
    fn name(&self) -> &'static str;

    /// Allocate a pool for `schema` with `instance_count` instances.
    ///
    /// Pools must be allocated in schema ID order. Fixed attributes start
    /// at their type's zero value, lists start empty.
    fn allocate_pool(&mut self, schema: &NodeSchema, instance_count: usize)
        -> Result<(), FrameError>;

    /// Number of allocated pools.
    fn pool_count(&self) -> usize;

    /// Instance count of a pool, `None` if no such pool.
    fn instance_count(&self, schema: SchemaId) -> Option<usize>;

    /// Read one slot of a fixed attribute.
    fn get(&self, at: AttrCoord, slot: usize) -> Result<AttrValue, FrameError>;

    /// Write one slot of a fixed attribute.
    fn set(&mut self, at: AttrCoord, slot: usize, value: AttrValue) -> Result<(), FrameError>;

    /// Append every slot of a fixed attribute to `out`.
    fn read_fixed(&self, at: AttrCoord, out: &mut Vec<AttrValue>) -> Result<(), FrameError>;

    /// Overwrite every slot of a fixed attribute. `values.len()` must equal
    /// the declared slot count.
    fn write_fixed(&mut self, at: AttrCoord, values: &[AttrValue]) -> Result<(), FrameError>;

    /// Current length of a list attribute.
    fn list_len(&self, at: AttrCoord) -> Result<usize, FrameError>;

    /// Append the elements of a list attribute to `out`.
    fn read_list(&self, at: AttrCoord, out: &mut Vec<AttrValue>) -> Result<(), FrameError>;

    /// Append one element to a list attribute.
    fn push_list(&mut self, at: AttrCoord, value: AttrValue) -> Result<(), FrameError>;

    /// Replace a list attribute's elements, truncating or extending.
    fn replace_list(&mut self, at: AttrCoord, values: &[AttrValue]) -> Result<(), FrameError>;

    /// Restore one pool to zero values and empty lists.
    fn reset_pool(&mut self, schema: SchemaId) -> Result<(), FrameError>;

    /// Capture one pool's live values.
    fn snapshot_pool(&self, schema: SchemaId) -> Result<PoolImage, FrameError>;

    /// Overwrite one pool's live values from a captured image.
    fn restore_pool(&mut self, schema: SchemaId, image: &PoolImage) -> Result<(), FrameError>;

    /// Bytes of live values at their declared widths.
    fn memory_bytes(&self) -> usize;

    /// Reset every pool.
    fn reset_all(&mut self) -> Result<(), FrameError> {
        for id in 0..self.pool_count() {
            self.reset_pool(SchemaId(id as u32))?;
        }
        Ok(())
    }
}

// ── Shared checks ──────────────────────────────────────────────

/// Resolve `at` against `schema` and require `shape`.
///
/// Checks, in order: the attribute exists, the index is below
/// `instance_count`, and the attribute has the required shape.
pub fn resolve(
    schema: &NodeSchema,
    instance_count: usize,
    at: AttrCoord,
    shape: AttrShape,
) -> Result<&AttributeDescriptor, FrameError> {
    let desc = schema.resolve_id(at.attr)?;
    if at.index >= instance_count {
        return Err(FrameError::IndexOutOfRange {
            schema: schema.name().to_string(),
            index: at.index,
            instance_count,
        });
    }
    if desc.shape() != shape {
        return Err(FrameError::ShapeMismatch {
            schema: schema.name().to_string(),
            attr: desc.name().to_string(),
            expected: shape,
            actual: desc.shape(),
        });
    }
    Ok(desc)
}

/// Require `slot` to be below the declared slot count of a fixed attribute.
pub fn check_slot(
    schema: &NodeSchema,
    desc: &AttributeDescriptor,
    slot: usize,
) -> Result<(), FrameError> {
    let slots = desc.fixed_slots().unwrap_or(0);
    if slot >= slots {
        return Err(FrameError::SlotOutOfRange {
            schema: schema.name().to_string(),
            attr: desc.name().to_string(),
            slot,
            slots,
        });
    }
    Ok(())
}

/// Require a full-length write for a fixed attribute.
pub fn check_slot_count(
    schema: &NodeSchema,
    desc: &AttributeDescriptor,
    actual: usize,
) -> Result<(), FrameError> {
    let expected = desc.fixed_slots().unwrap_or(0);
    if actual != expected {
        return Err(FrameError::SlotCountMismatch {
            schema: schema.name().to_string(),
            attr: desc.name().to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Convert `value` to the attribute's declared type, losslessly.
pub fn coerce(
    schema: &NodeSchema,
    desc: &AttributeDescriptor,
    value: AttrValue,
) -> Result<AttrValue, FrameError> {
    value
        .convert_to(desc.attr_type())
        .ok_or_else(|| FrameError::TypeMismatch {
            schema: schema.name().to_string(),
            attr: desc.name().to_string(),
            expected: desc.attr_type(),
            value,
        })
}

/// Convert every value, failing on the first that does not fit.
pub fn coerce_all(
    schema: &NodeSchema,
    desc: &AttributeDescriptor,
    values: &[AttrValue],
) -> Result<Vec<AttrValue>, FrameError> {
    values.iter().map(|&v| coerce(schema, desc, v)).collect()
}

/// Error for a schema ID with no allocated pool.
pub fn unknown_pool(schema: SchemaId) -> FrameError {
    FrameError::UnknownSchema {
        schema: format!("#{schema}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttributeType;
    use crate::error::ErrorKind;
    use crate::schema::AttributeSpec;

    fn storage() -> NodeSchema {
        NodeSchema::new("storage")
            .and_then(|s| s.with_attribute(AttributeSpec::of::<i32>("capacity").slots(2)))
            .and_then(|s| s.with_attribute(AttributeSpec::of::<i32>("product_number").list()))
            .unwrap()
    }

    #[test]
    fn resolve_checks_attribute_before_index() {
        let schema = storage();
        let err = resolve(&schema, 3, AttrCoord::new(SchemaId(0), 9, AttrId(7)), AttrShape::Fixed)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);

        let err = resolve(&schema, 3, AttrCoord::new(SchemaId(0), 3, AttrId(0)), AttrShape::Fixed)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
    }

    #[test]
    fn resolve_rejects_wrong_shape() {
        let schema = storage();
        let err = resolve(&schema, 3, AttrCoord::new(SchemaId(0), 0, AttrId(1)), AttrShape::Fixed)
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::ShapeMismatch {
                expected: AttrShape::Fixed,
                actual: AttrShape::List,
                ..
            }
        ));
    }

    #[test]
    fn slot_and_count_checks() {
        let schema = storage();
        let desc = schema.resolve("capacity").unwrap();
        assert!(check_slot(&schema, desc, 1).is_ok());
        assert_eq!(
            check_slot(&schema, desc, 2).unwrap_err().kind(),
            ErrorKind::IndexOutOfRange
        );
        assert!(check_slot_count(&schema, desc, 2).is_ok());
        assert!(matches!(
            check_slot_count(&schema, desc, 1),
            Err(FrameError::SlotCountMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn coerce_reports_type_mismatch() {
        let schema = storage();
        let desc = schema.resolve("capacity").unwrap();
        assert_eq!(
            coerce(&schema, desc, AttrValue::UInt8(3)),
            Ok(AttrValue::Int32(3))
        );
        let err = coerce(&schema, desc, AttrValue::Float32(1.0)).unwrap_err();
        assert!(matches!(
            err,
            FrameError::TypeMismatch {
                expected: AttributeType::Int32,
                ..
            }
        ));
    }
}
