//! Error types for the Tessera attribute store.
//!
//! Every store operation fails fast with a [`FrameError`]. Variants carry
//! enough context (schema, attribute, index) to produce a useful message;
//! [`FrameError::kind`] maps each variant onto the coarse [`ErrorKind`]
//! taxonomy callers branch on.

use thiserror::Error;

use crate::attr::{AttrValue, AttributeType};
use crate::id::TickId;

/// Coarse classification of a [`FrameError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Duplicate or unknown schema/attribute, or a malformed declaration.
    Schema,
    /// Instance index or fixed slot index out of range.
    IndexOutOfRange,
    /// Value not representable in the declared type, or scalar/list confusion.
    TypeMismatch,
    /// A snapshot API was called on a frame built without snapshots.
    SnapshotDisabled,
    /// A queried tick is not held by the snapshot ring.
    TickNotFound,
    /// A const attribute was written after its instance was sealed.
    ConstAttributeWrite,
    /// The frame configuration is invalid.
    Config,
}

/// Whether an attribute holds fixed slots or a variable-length list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrShape {
    /// Fixed number of slots per instance.
    Fixed,
    /// Variable-length list per instance.
    List,
}

impl std::fmt::Display for AttrShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => f.write_str("fixed"),
            Self::List => f.write_str("list"),
        }
    }
}

/// Errors returned by schema declaration, frame access, and snapshot queries.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FrameError {
    /// A schema with this name was already declared.
    #[error("schema '{schema}' is already declared")]
    DuplicateSchema {
        /// The repeated schema name.
        schema: String,
    },

    /// An attribute name repeats within one schema.
    #[error("attribute '{attr}' is already declared on schema '{schema}'")]
    DuplicateAttribute {
        /// Owning schema.
        schema: String,
        /// The repeated attribute name.
        attr: String,
    },

    /// No schema with this name (or ID) exists.
    #[error("unknown schema '{schema}'")]
    UnknownSchema {
        /// The schema that was requested.
        schema: String,
    },

    /// The attribute is not declared on the schema.
    #[error("unknown attribute '{attr}' on schema '{schema}'")]
    UnknownAttribute {
        /// The schema that was searched.
        schema: String,
        /// The attribute that was requested.
        attr: String,
    },

    /// A schema or attribute name is empty.
    #[error("invalid name: {reason}")]
    InvalidName {
        /// Why the name was rejected.
        reason: String,
    },

    /// A fixed attribute was declared with zero slots.
    #[error("attribute '{attr}' on schema '{schema}' must have at least one slot")]
    InvalidSlots {
        /// Owning schema.
        schema: String,
        /// The attribute with zero slots.
        attr: String,
    },

    /// Instance index is not below the pool's instance count.
    #[error("index {index} out of range for schema '{schema}' with {instance_count} instances")]
    IndexOutOfRange {
        /// The schema being addressed.
        schema: String,
        /// The offending index.
        index: usize,
        /// Number of instances in the pool.
        instance_count: usize,
    },

    /// Slot index is not below the attribute's declared slot count.
    #[error("slot {slot} out of range for attribute '{attr}' on schema '{schema}' with {slots} slots")]
    SlotOutOfRange {
        /// The schema being addressed.
        schema: String,
        /// The attribute being addressed.
        attr: String,
        /// The offending slot.
        slot: usize,
        /// Declared slot count.
        slots: usize,
    },

    /// A multi-slot write supplied the wrong number of values.
    #[error("attribute '{attr}' on schema '{schema}' expects {expected} values, got {actual}")]
    SlotCountMismatch {
        /// The schema being addressed.
        schema: String,
        /// The attribute being addressed.
        attr: String,
        /// Number of values the write requires.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// The value cannot be represented in the attribute's declared type.
    #[error("value {value:?} cannot be stored in {expected} attribute '{attr}' on schema '{schema}'")]
    TypeMismatch {
        /// The schema being addressed.
        schema: String,
        /// The attribute being addressed.
        attr: String,
        /// Declared type of the attribute.
        expected: AttributeType,
        /// The rejected value.
        value: AttrValue,
    },

    /// A list operation on a fixed attribute, or a scalar operation on a list.
    #[error("attribute '{attr}' on schema '{schema}' is a {actual} attribute, not {expected}")]
    ShapeMismatch {
        /// The schema being addressed.
        schema: String,
        /// The attribute being addressed.
        attr: String,
        /// Shape the operation requires.
        expected: AttrShape,
        /// Declared shape of the attribute.
        actual: AttrShape,
    },

    /// Snapshot APIs are unavailable because snapshots were not enabled.
    #[error("snapshots are not enabled for this frame")]
    SnapshotDisabled,

    /// The tick is not (or no longer) held by the snapshot ring.
    #[error("tick {tick} is not in the snapshot ring")]
    TickNotFound {
        /// The requested tick.
        tick: TickId,
    },

    /// A const attribute was written after the instance was sealed.
    #[error("const attribute '{attr}' on schema '{schema}' instance {index} is sealed")]
    ConstAttributeWrite {
        /// The schema being addressed.
        schema: String,
        /// The const attribute.
        attr: String,
        /// The sealed instance.
        index: usize,
    },

    /// The frame configuration failed validation.
    #[error("invalid frame configuration: {reason}")]
    InvalidConfig {
        /// Description of the validation failure.
        reason: String,
    },

    /// A captured pool image does not match the pool it is restored into.
    #[error("pool image does not match schema '{schema}': {reason}")]
    ImageMismatch {
        /// The schema being restored.
        schema: String,
        /// Description of the mismatch.
        reason: String,
    },
}

impl FrameError {
    /// Classify this error into the coarse [`ErrorKind`] taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateSchema { .. }
            | Self::DuplicateAttribute { .. }
            | Self::UnknownSchema { .. }
            | Self::UnknownAttribute { .. }
            | Self::InvalidName { .. }
            | Self::InvalidSlots { .. }
            | Self::ImageMismatch { .. } => ErrorKind::Schema,
            Self::IndexOutOfRange { .. } | Self::SlotOutOfRange { .. } => {
                ErrorKind::IndexOutOfRange
            }
            Self::SlotCountMismatch { .. }
            | Self::TypeMismatch { .. }
            | Self::ShapeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::SnapshotDisabled => ErrorKind::SnapshotDisabled,
            Self::TickNotFound { .. } => ErrorKind::TickNotFound,
            Self::ConstAttributeWrite { .. } => ErrorKind::ConstAttributeWrite,
            Self::InvalidConfig { .. } => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let dup = FrameError::DuplicateSchema {
            schema: "storage".into(),
        };
        assert_eq!(dup.kind(), ErrorKind::Schema);

        let idx = FrameError::IndexOutOfRange {
            schema: "storage".into(),
            index: 3,
            instance_count: 3,
        };
        assert_eq!(idx.kind(), ErrorKind::IndexOutOfRange);

        let shape = FrameError::ShapeMismatch {
            schema: "storage".into(),
            attr: "product_number".into(),
            expected: AttrShape::Fixed,
            actual: AttrShape::List,
        };
        assert_eq!(shape.kind(), ErrorKind::TypeMismatch);

        assert_eq!(
            FrameError::TickNotFound { tick: TickId(4) }.kind(),
            ErrorKind::TickNotFound
        );
        assert_eq!(FrameError::SnapshotDisabled.kind(), ErrorKind::SnapshotDisabled);
    }

    #[test]
    fn messages_name_the_offender() {
        let err = FrameError::UnknownAttribute {
            schema: "storage".into(),
            attr: "volume".into(),
        };
        assert_eq!(err.to_string(), "unknown attribute 'volume' on schema 'storage'");

        let err = FrameError::TypeMismatch {
            schema: "storage".into(),
            attr: "capacity".into(),
            expected: AttributeType::Int32,
            value: AttrValue::Float64(1.5),
        };
        assert!(err.to_string().contains("int32"));
        assert!(err.to_string().contains("Float64(1.5)"));
    }
}
