//! Attribute descriptors, node schemas, and the pending schema table.
//!
//! Schemas are declared once during scenario setup through a
//! [`SchemaRegistry`] and frozen when the frame is built. Nothing is
//! allocated here: the registry only records names, types and shapes.

use indexmap::IndexMap;

use crate::attr::{AttrPrimitive, AttributeType};
use crate::error::{AttrShape, FrameError};
use crate::id::{AttrId, SchemaId};

/// Declaration input for one attribute.
///
/// Built with [`AttributeSpec::new`] (or [`AttributeSpec::of`]) and refined
/// with the chainable modifiers. Validated when declared on a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSpec {
    /// Attribute name, unique within its schema.
    pub name: String,
    /// Storage type of every slot or list element.
    pub attr_type: AttributeType,
    /// Slot count for fixed attributes. Ignored for lists.
    pub slots: u32,
    /// Variable-length list attribute.
    pub is_list: bool,
    /// Must not change after the owning instance is sealed.
    pub is_const: bool,
}

impl AttributeSpec {
    /// A single-slot, mutable, fixed attribute.
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            slots: 1,
            is_list: false,
            is_const: false,
        }
    }

    /// Like [`AttributeSpec::new`], with the type taken from a Rust primitive.
    pub fn of<T: AttrPrimitive>(name: impl Into<String>) -> Self {
        Self::new(name, T::TYPE)
    }

    /// Set the fixed slot count.
    pub fn slots(mut self, slots: u32) -> Self {
        self.slots = slots;
        self
    }

    /// Make this a variable-length list attribute.
    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    /// Mark this attribute const after initialization.
    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }
}

/// A declared attribute of a node schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDescriptor {
    id: AttrId,
    name: String,
    attr_type: AttributeType,
    slots: u32,
    is_list: bool,
    is_const: bool,
}

impl AttributeDescriptor {
    /// Position of this attribute in declaration order.
    pub fn id(&self) -> AttrId {
        self.id
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage type.
    pub fn attr_type(&self) -> AttributeType {
        self.attr_type
    }

    /// Declared slot count. Lists report the value they were declared
    /// with, which plays no part in storage sizing.
    pub fn slots(&self) -> u32 {
        self.slots
    }

    /// Whether this is a variable-length list attribute.
    pub fn is_list(&self) -> bool {
        self.is_list
    }

    /// Whether this attribute is const after initialization.
    pub fn is_const(&self) -> bool {
        self.is_const
    }

    /// Fixed or list.
    pub fn shape(&self) -> AttrShape {
        if self.is_list {
            AttrShape::List
        } else {
            AttrShape::Fixed
        }
    }

    /// Slot count of a fixed attribute, `None` for lists.
    pub fn fixed_slots(&self) -> Option<usize> {
        (!self.is_list).then_some(self.slots as usize)
    }

    /// Bytes this attribute occupies per instance in fixed storage.
    ///
    /// Lists are stored out of line and contribute zero.
    pub fn footprint_bytes(&self) -> usize {
        match self.fixed_slots() {
            Some(slots) => slots * self.attr_type.width(),
            None => 0,
        }
    }
}

/// A named record type: an ordered collection of attribute descriptors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSchema {
    id: SchemaId,
    name: String,
    attributes: IndexMap<String, AttributeDescriptor>,
}

impl NodeSchema {
    /// Create an empty schema.
    ///
    /// The schema ID is assigned when the schema is registered; until
    /// then it is `SchemaId(0)`.
    pub fn new(name: impl Into<String>) -> Result<Self, FrameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(FrameError::InvalidName {
                reason: "schema name must not be empty".into(),
            });
        }
        Ok(Self {
            id: SchemaId(0),
            name,
            attributes: IndexMap::new(),
        })
    }

    /// Declare an attribute on this schema.
    ///
    /// Fails with `DuplicateAttribute` if the name repeats, `InvalidName`
    /// for an empty name and `InvalidSlots` for a fixed attribute with zero
    /// slots. On failure the schema is unchanged.
    pub fn declare_attribute(&mut self, spec: AttributeSpec) -> Result<AttrId, FrameError> {
        if spec.name.is_empty() {
            return Err(FrameError::InvalidName {
                reason: format!("attribute name on schema '{}' must not be empty", self.name),
            });
        }
        if self.attributes.contains_key(&spec.name) {
            return Err(FrameError::DuplicateAttribute {
                schema: self.name.clone(),
                attr: spec.name,
            });
        }
        if !spec.is_list && spec.slots == 0 {
            return Err(FrameError::InvalidSlots {
                schema: self.name.clone(),
                attr: spec.name,
            });
        }
        let id = AttrId(self.attributes.len() as u32);
        let descriptor = AttributeDescriptor {
            id,
            name: spec.name.clone(),
            attr_type: spec.attr_type,
            slots: spec.slots,
            is_list: spec.is_list,
            is_const: spec.is_const,
        };
        self.attributes.insert(spec.name, descriptor);
        Ok(id)
    }

    /// Builder form of [`NodeSchema::declare_attribute`].
    pub fn with_attribute(mut self, spec: AttributeSpec) -> Result<Self, FrameError> {
        self.declare_attribute(spec)?;
        Ok(self)
    }

    /// The schema ID assigned at registration.
    pub fn id(&self) -> SchemaId {
        self.id
    }

    /// Schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the schema has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.values()
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.get(name)
    }

    /// Look up an attribute by ID.
    pub fn attribute_by_id(&self, id: AttrId) -> Option<&AttributeDescriptor> {
        self.attributes.get_index(id.index()).map(|(_, d)| d)
    }

    /// Look up an attribute by name, failing with `UnknownAttribute`.
    pub fn resolve(&self, name: &str) -> Result<&AttributeDescriptor, FrameError> {
        self.attribute(name).ok_or_else(|| FrameError::UnknownAttribute {
            schema: self.name.clone(),
            attr: name.to_string(),
        })
    }

    /// Look up an attribute by ID, failing with `UnknownAttribute`.
    pub fn resolve_id(&self, id: AttrId) -> Result<&AttributeDescriptor, FrameError> {
        self.attribute_by_id(id)
            .ok_or_else(|| FrameError::UnknownAttribute {
                schema: self.name.clone(),
                attr: format!("#{id}"),
            })
    }

    /// Fixed-storage bytes per instance (sum over fixed attributes).
    pub fn footprint_bytes(&self) -> usize {
        self.attributes().map(AttributeDescriptor::footprint_bytes).sum()
    }
}

/// The pending schema table for one frame build.
///
/// Assigns sequential [`SchemaId`]s and rejects duplicate names. Consumed
/// by the frame builder; schemas are immutable afterwards.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, NodeSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new, empty schema.
    pub fn declare_schema(&mut self, name: impl Into<String>) -> Result<SchemaId, FrameError> {
        self.register(NodeSchema::new(name)?)
    }

    /// Declare a schema together with all of its attributes.
    ///
    /// Either every attribute is accepted and the schema is registered, or
    /// nothing is registered.
    pub fn declare_schema_with(
        &mut self,
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = AttributeSpec>,
    ) -> Result<SchemaId, FrameError> {
        let mut schema = NodeSchema::new(name)?;
        for spec in attributes {
            schema.declare_attribute(spec)?;
        }
        self.register(schema)
    }

    /// Register a schema built elsewhere, assigning it the next ID.
    pub fn register(&mut self, mut schema: NodeSchema) -> Result<SchemaId, FrameError> {
        if self.schemas.contains_key(&schema.name) {
            return Err(FrameError::DuplicateSchema {
                schema: schema.name,
            });
        }
        let id = SchemaId(self.schemas.len() as u32);
        schema.id = id;
        self.schemas.insert(schema.name.clone(), schema);
        Ok(id)
    }

    /// Declare an attribute on a previously declared schema.
    pub fn declare_attribute(
        &mut self,
        schema: SchemaId,
        spec: AttributeSpec,
    ) -> Result<AttrId, FrameError> {
        let (_, target) = self
            .schemas
            .get_index_mut(schema.index())
            .ok_or_else(|| FrameError::UnknownSchema {
                schema: format!("#{schema}"),
            })?;
        target.declare_attribute(spec)
    }

    /// Look up a schema by ID.
    pub fn get(&self, id: SchemaId) -> Option<&NodeSchema> {
        self.schemas.get_index(id.index()).map(|(_, s)| s)
    }

    /// Look up a schema by name.
    pub fn by_name(&self, name: &str) -> Option<&NodeSchema> {
        self.schemas.get(name)
    }

    /// Number of declared schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no schemas are declared.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Schemas in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeSchema> {
        self.schemas.values()
    }

    /// Freeze the registry into its schemas, in ID order.
    pub fn into_schemas(self) -> Vec<NodeSchema> {
        self.schemas.into_values().collect()
    }
}
