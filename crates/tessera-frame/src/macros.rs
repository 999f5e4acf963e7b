//! Typed node declaration.
//!
//! [`node_schema!`](crate::node_schema) turns a block of attribute
//! declarations into a zero-sized type implementing [`NodeType`], with one
//! [`AttrKey`](crate::AttrKey) constant per attribute.

use tessera_core::{AttributeSpec, FrameError, NodeSchema, SchemaId, SchemaRegistry};

/// A node type with a statically known schema.
pub trait NodeType {
    /// Schema name.
    const NAME: &'static str;

    /// Attribute declarations in order.
    fn attributes() -> Vec<AttributeSpec>;

    /// Register the schema.
    fn declare(registry: &mut SchemaRegistry) -> Result<SchemaId, FrameError> {
        registry.declare_schema_with(Self::NAME, Self::attributes())
    }

    /// Build the schema without registering it.
    fn schema() -> Result<NodeSchema, FrameError> {
        Self::attributes()
            .into_iter()
            .try_fold(NodeSchema::new(Self::NAME)?, NodeSchema::with_attribute)
    }
}

/// Declare a node type.
///
/// Each line is `KEY: rust_type => "attribute"` followed by any of the
/// [`AttributeSpec`] modifiers (`.slots(n)`, `.list()`, `.constant()`).
///
/// ```
/// use tessera_frame::{node_schema, FrameBuilder, NodeType};
///
/// node_schema! {
///     /// A warehouse.
///     pub struct Storage = "storage" {
///         CAPACITY: i32 => "capacity";
///         PRODUCTS: i32 => "product_number".list();
///         POSITION: f32 => "position".slots(2);
///         FACILITY: i64 => "facility_id".constant();
///     }
/// }
///
/// let mut frame = FrameBuilder::new().node::<Storage>(3)?.build()?;
/// frame.node_mut(Storage::NAME, 1)?.write(Storage::CAPACITY, 100)?;
/// assert_eq!(frame.node(Storage::NAME, 1)?.read(Storage::CAPACITY)?, 100);
/// # Ok::<(), tessera_core::FrameError>(())
/// ```
#[macro_export]
macro_rules! node_schema {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident = $schema:literal {
            $(
                $(#[$key_meta:meta])*
                $key:ident : $ty:ty => $attr:literal $(. $modifier:ident ( $($arg:expr),* ))* ;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $name {
            #[doc = concat!("Schema name `", $schema, "`.")]
            pub const NAME: &'static str = $schema;

            $(
                #[doc = concat!("Attribute `", $attr, "`.")]
                $(#[$key_meta])*
                pub const $key: $crate::AttrKey<$ty> = $crate::AttrKey::new($schema, $attr);
            )*
        }

        impl $crate::NodeType for $name {
            const NAME: &'static str = $schema;

            fn attributes() -> ::std::vec::Vec<$crate::__private::AttributeSpec> {
                ::std::vec![
                    $(
                        $crate::__private::AttributeSpec::of::<$ty>($attr)
                            $(.$modifier($($arg),*))*
                    ),*
                ]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{AttributeType, ErrorKind};

    crate::node_schema! {
        struct Storage = "storage" {
            CAPACITY: i32 => "capacity";
            PRODUCTS: i32 => "product_number".list();
            POSITION: f32 => "position".slots(2);
            FACILITY: i64 => "facility_id".constant();
        }
    }

    crate::node_schema! {
        struct Broken = "broken" {
            A: u8 => "a";
            B: u8 => "a";
        }
    }

    #[test]
    fn generated_keys_and_specs() {
        assert_eq!(Storage::NAME, "storage");
        assert_eq!(Storage::CAPACITY.attr(), "capacity");
        assert_eq!(Storage::PRODUCTS.schema(), "storage");
        assert_eq!(Storage::POSITION.attr(), "position");
        assert_eq!(Storage::FACILITY.attr(), "facility_id");

        let specs = Storage::attributes();
        assert_eq!(specs.len(), 4);
        assert!(specs[1].is_list);
        assert_eq!(specs[2].slots, 2);
        assert_eq!(specs[2].attr_type, AttributeType::Float32);
        assert!(specs[3].is_const);
    }

    #[test]
    fn declare_registers_schema() {
        let mut registry = SchemaRegistry::new();
        let id = Storage::declare(&mut registry).unwrap();
        let schema = registry.get(id).unwrap();
        assert_eq!(schema.name(), "storage");
        assert_eq!(schema.len(), 4);
        assert_eq!(
            Storage::declare(&mut registry).unwrap_err().kind(),
            ErrorKind::Schema
        );
    }

    #[test]
    fn duplicate_attribute_fails_declaration() {
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            Broken::declare(&mut registry),
            Err(FrameError::DuplicateAttribute { .. })
        ));
        assert!(registry.is_empty());
        assert_eq!(Broken::A.attr(), Broken::B.attr());
        assert!(Broken::schema().is_err());
    }
}
