//! Per-instance views over a [`Frame`] and typed attribute keys.
//!
//! [`NodeRef`] and [`NodeMut`] bind `(schema, index)` once so entity code
//! can read and write attributes by name alone. [`AttrKey`] adds the
//! attribute's Rust type, generated by [`node_schema!`](crate::node_schema).

use std::marker::PhantomData;

use tessera_core::{AttrPrimitive, AttrValue, FrameError, NodeSchema, SchemaId};

use crate::frame::Frame;

/// A typed attribute name.
///
/// The schema name travels with the key so a key from one node type is
/// rejected by a view of another.
pub struct AttrKey<T> {
    schema: &'static str,
    attr: &'static str,
    _ty: PhantomData<fn() -> T>,
}

impl<T> AttrKey<T> {
    /// Key for attribute `attr` of schema `schema`.
    pub const fn new(schema: &'static str, attr: &'static str) -> Self {
        Self {
            schema,
            attr,
            _ty: PhantomData,
        }
    }

    /// Schema name.
    pub const fn schema(&self) -> &'static str {
        self.schema
    }

    /// Attribute name.
    pub const fn attr(&self) -> &'static str {
        self.attr
    }
}

impl<T> Clone for AttrKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttrKey<T> {}

impl<T> std::fmt::Debug for AttrKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AttrKey({}.{})", self.schema, self.attr)
    }
}

fn typed<T: AttrPrimitive>(
    schema: &NodeSchema,
    attr: &str,
    value: AttrValue,
) -> Result<T, FrameError> {
    T::try_from(value).map_err(|value| FrameError::TypeMismatch {
        schema: schema.name().to_string(),
        attr: attr.to_string(),
        expected: T::TYPE,
        value,
    })
}

fn check_key<T>(schema: &NodeSchema, key: AttrKey<T>) -> Result<(), FrameError> {
    if key.schema != schema.name() {
        return Err(FrameError::UnknownAttribute {
            schema: schema.name().to_string(),
            attr: format!("{}.{}", key.schema, key.attr),
        });
    }
    Ok(())
}

// ── NodeRef ────────────────────────────────────────────────────

/// A read-only view of one instance.
#[derive(Clone, Copy)]
pub struct NodeRef<'f> {
    frame: &'f Frame,
    schema: SchemaId,
    index: usize,
}

impl<'f> NodeRef<'f> {
    pub(crate) fn new(frame: &'f Frame, schema: SchemaId, index: usize) -> Self {
        Self {
            frame,
            schema,
            index,
        }
    }

    fn node_schema(&self) -> Result<&'f NodeSchema, FrameError> {
        self.frame
            .schema_by_id(self.schema)
            .ok_or_else(|| tessera_core::traits::unknown_pool(self.schema))
    }

    /// The instance's schema.
    pub fn schema(&self) -> SchemaId {
        self.schema
    }

    /// The instance index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the instance has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.frame.is_sealed_id(self.schema, self.index)
    }

    /// Slot 0 of a fixed attribute.
    pub fn get(&self, attr: &str) -> Result<AttrValue, FrameError> {
        self.get_slot(attr, 0)
    }

    /// One slot of a fixed attribute.
    pub fn get_slot(&self, attr: &str, slot: usize) -> Result<AttrValue, FrameError> {
        let at = self.frame.coord_in(self.schema, self.index, attr)?;
        self.frame.read_slot(at, slot)
    }

    /// Every slot of a fixed attribute.
    pub fn get_slots(&self, attr: &str) -> Result<Vec<AttrValue>, FrameError> {
        let at = self.frame.coord_in(self.schema, self.index, attr)?;
        self.frame.read_slots(at)
    }

    /// A list attribute in element order.
    pub fn get_list(&self, attr: &str) -> Result<Vec<AttrValue>, FrameError> {
        let at = self.frame.coord_in(self.schema, self.index, attr)?;
        self.frame.read_list(at)
    }

    /// Length of a list attribute.
    pub fn list_len(&self, attr: &str) -> Result<usize, FrameError> {
        let at = self.frame.coord_in(self.schema, self.index, attr)?;
        self.frame.list_length(at)
    }

    /// Slot 0 of a fixed attribute as `T`.
    pub fn read<T: AttrPrimitive>(&self, key: AttrKey<T>) -> Result<T, FrameError> {
        let schema = self.node_schema()?;
        check_key(schema, key)?;
        typed(schema, key.attr, self.get(key.attr)?)
    }

    /// Every slot of a fixed attribute as `T`.
    pub fn read_slots<T: AttrPrimitive>(&self, key: AttrKey<T>) -> Result<Vec<T>, FrameError> {
        let schema = self.node_schema()?;
        check_key(schema, key)?;
        self.get_slots(key.attr)?
            .into_iter()
            .map(|v| typed(schema, key.attr, v))
            .collect()
    }

    /// A list attribute as `T`.
    pub fn read_list<T: AttrPrimitive>(&self, key: AttrKey<T>) -> Result<Vec<T>, FrameError> {
        let schema = self.node_schema()?;
        check_key(schema, key)?;
        self.get_list(key.attr)?
            .into_iter()
            .map(|v| typed(schema, key.attr, v))
            .collect()
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("schema", &self.schema)
            .field("index", &self.index)
            .finish()
    }
}

// ── NodeMut ────────────────────────────────────────────────────

/// A read-write view of one instance.
pub struct NodeMut<'f> {
    frame: &'f mut Frame,
    schema: SchemaId,
    index: usize,
}

impl<'f> NodeMut<'f> {
    pub(crate) fn new(frame: &'f mut Frame, schema: SchemaId, index: usize) -> Self {
        Self {
            frame,
            schema,
            index,
        }
    }

    /// Reborrow as a read-only view.
    pub fn view(&self) -> NodeRef<'_> {
        NodeRef::new(self.frame, self.schema, self.index)
    }

    /// The instance index.
    pub fn index(&self) -> usize {
        self.index
    }

    fn schema_name(&self) -> Result<String, FrameError> {
        self.frame
            .schema_by_id(self.schema)
            .map(|s| s.name().to_string())
            .ok_or_else(|| tessera_core::traits::unknown_pool(self.schema))
    }

    fn check_key<T>(&self, key: AttrKey<T>) -> Result<(), FrameError> {
        let schema = self
            .frame
            .schema_by_id(self.schema)
            .ok_or_else(|| tessera_core::traits::unknown_pool(self.schema))?;
        check_key(schema, key)
    }

    /// Write slot 0 of a fixed attribute.
    pub fn set(&mut self, attr: &str, value: impl Into<AttrValue>) -> Result<(), FrameError> {
        self.set_slot(attr, 0, value)
    }

    /// Write one slot of a fixed attribute.
    pub fn set_slot(
        &mut self,
        attr: &str,
        slot: usize,
        value: impl Into<AttrValue>,
    ) -> Result<(), FrameError> {
        let at = self.frame.coord_in(self.schema, self.index, attr)?;
        self.frame.write_slot(at, slot, value.into())
    }

    /// Write every slot of a fixed attribute.
    pub fn set_slots(&mut self, attr: &str, values: &[AttrValue]) -> Result<(), FrameError> {
        let at = self.frame.coord_in(self.schema, self.index, attr)?;
        self.frame.write_slots(at, values)
    }

    /// Append one element to a list attribute.
    pub fn append(&mut self, attr: &str, value: impl Into<AttrValue>) -> Result<(), FrameError> {
        let at = self.frame.coord_in(self.schema, self.index, attr)?;
        self.frame.push_list(at, value.into())
    }

    /// Replace a list attribute's elements.
    pub fn set_list(&mut self, attr: &str, values: &[AttrValue]) -> Result<(), FrameError> {
        let at = self.frame.coord_in(self.schema, self.index, attr)?;
        self.frame.replace_list(at, values)
    }

    /// Remove every element of a list attribute.
    pub fn clear_list(&mut self, attr: &str) -> Result<(), FrameError> {
        self.set_list(attr, &[])
    }

    /// Slot 0 of a fixed attribute as `T`.
    pub fn read<T: AttrPrimitive>(&self, key: AttrKey<T>) -> Result<T, FrameError> {
        self.view().read(key)
    }

    /// A list attribute as `T`.
    pub fn read_list<T: AttrPrimitive>(&self, key: AttrKey<T>) -> Result<Vec<T>, FrameError> {
        self.view().read_list(key)
    }

    /// Write slot 0 of a fixed attribute from `T`.
    pub fn write<T: AttrPrimitive>(&mut self, key: AttrKey<T>, value: T) -> Result<(), FrameError> {
        self.check_key(key)?;
        self.set(key.attr, value)
    }

    /// Write every slot of a fixed attribute from `T`s.
    pub fn write_slots<T: AttrPrimitive>(
        &mut self,
        key: AttrKey<T>,
        values: &[T],
    ) -> Result<(), FrameError> {
        self.check_key(key)?;
        let values: Vec<AttrValue> = values.iter().map(|&v| v.into()).collect();
        self.set_slots(key.attr, &values)
    }

    /// Append a `T` to a list attribute.
    pub fn push<T: AttrPrimitive>(&mut self, key: AttrKey<T>, value: T) -> Result<(), FrameError> {
        self.check_key(key)?;
        self.append(key.attr, value)
    }

    /// Seal this instance.
    pub fn seal(&mut self) -> Result<(), FrameError> {
        self.frame.seal_id(self.schema, self.index)
    }

    /// Whether the instance has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.frame.is_sealed_id(self.schema, self.index)
    }
}

impl std::fmt::Debug for NodeMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeMut")
            .field("schema", &self.schema_name().unwrap_or_default())
            .field("index", &self.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FrameBuilder;
    use tessera_core::{AttributeSpec, ErrorKind};

    const CAPACITY: AttrKey<i32> = AttrKey::new("storage", "capacity");
    const PRODUCTS: AttrKey<i32> = AttrKey::new("storage", "product_number");
    const POSITION: AttrKey<f32> = AttrKey::new("storage", "position");
    const WRONG_TYPE: AttrKey<u8> = AttrKey::new("storage", "capacity");
    const OTHER_SCHEMA: AttrKey<u16> = AttrKey::new("consumer", "demand");

    fn frame() -> Frame {
        FrameBuilder::new()
            .declare_schema_with(
                "storage",
                [
                    AttributeSpec::of::<i32>("capacity"),
                    AttributeSpec::of::<i32>("product_number").list(),
                    AttributeSpec::of::<f32>("position").slots(2),
                ],
                2,
            )
            .unwrap()
            .declare_schema_with("consumer", [AttributeSpec::of::<u16>("demand")], 1)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn typed_round_trip() {
        let mut f = frame();
        let mut node = f.node_mut("storage", 1).unwrap();
        node.write(CAPACITY, 100).unwrap();
        node.push(PRODUCTS, 5).unwrap();
        node.push(PRODUCTS, 7).unwrap();
        node.write_slots(POSITION, &[1.5, -2.0]).unwrap();

        let node = f.node("storage", 1).unwrap();
        assert_eq!(node.read(CAPACITY), Ok(100));
        assert_eq!(node.read_list(PRODUCTS), Ok(vec![5, 7]));
        assert_eq!(node.read_slots(POSITION), Ok(vec![1.5, -2.0]));
        assert_eq!(node.list_len("product_number"), Ok(2));
        assert_eq!(f.get("storage", 0, "capacity"), Ok(AttrValue::Int32(0)));
    }

    #[test]
    fn wrong_rust_type_is_type_mismatch() {
        let mut f = frame();
        f.set("storage", 0, "capacity", -3).unwrap();
        let err = f.node("storage", 0).unwrap().read(WRONG_TYPE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn key_from_other_schema_rejected() {
        let mut f = frame();
        let mut node = f.node_mut("storage", 0).unwrap();
        assert_eq!(
            node.write(OTHER_SCHEMA, 1).unwrap_err().kind(),
            ErrorKind::Schema
        );
    }

    #[test]
    fn sealing_through_view() {
        let mut f = frame();
        let mut node = f.node_mut("consumer", 0).unwrap();
        assert!(!node.is_sealed());
        node.seal().unwrap();
        assert!(node.is_sealed());
        assert!(f.is_sealed("consumer", 0).unwrap());
    }

    #[test]
    fn view_index_checked_up_front() {
        let mut f = frame();
        assert_eq!(
            f.node_mut("consumer", 1).unwrap_err().kind(),
            ErrorKind::IndexOutOfRange
        );
    }
}
