//! Frame introspection for telemetry and export headers.

use std::fmt;

use tessera_core::AttributeType;

/// One attribute as reported by [`Frame::info`](crate::Frame::info).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Attribute name.
    pub name: String,
    /// Storage type.
    pub attr_type: AttributeType,
    /// Declared slot count (ignored for storage sizing when `is_list`).
    pub slots: u32,
    /// Variable-length list attribute.
    pub is_list: bool,
    /// Const after initialization.
    pub is_const: bool,
}

/// One node schema as reported by [`Frame::info`](crate::Frame::info).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaInfo {
    /// Schema name.
    pub name: String,
    /// Number of instances in the pool.
    pub instance_count: usize,
    /// Fixed-storage bytes per instance.
    pub footprint_bytes: usize,
    /// Attributes in declaration order.
    pub attributes: Vec<AttributeInfo>,
}

impl SchemaInfo {
    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Everything an exporter needs to describe a frame without hard-coding
/// schema knowledge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    /// Backend name.
    pub backend: &'static str,
    /// Snapshot ring capacity, `None` when snapshots are disabled.
    pub snapshot_capacity: Option<usize>,
    /// Schemas in declaration order.
    pub schemas: Vec<SchemaInfo>,
}

impl FrameInfo {
    /// Look up a schema by name.
    pub fn schema(&self, name: &str) -> Option<&SchemaInfo> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Total instances across every schema.
    pub fn total_instances(&self) -> usize {
        self.schemas.iter().map(|s| s.instance_count).sum()
    }
}

impl fmt::Display for FrameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame ({} backend", self.backend)?;
        match self.snapshot_capacity {
            Some(capacity) => writeln!(f, ", {capacity} snapshot slots)")?,
            None => writeln!(f, ", snapshots disabled)")?,
        }
        for schema in &self.schemas {
            writeln!(
                f,
                "  {} x{} ({} B/instance)",
                schema.name, schema.instance_count, schema.footprint_bytes
            )?;
            for attr in &schema.attributes {
                write!(f, "    {}: {}", attr.name, attr.attr_type)?;
                if attr.is_list {
                    write!(f, "[]")?;
                } else if attr.slots > 1 {
                    write!(f, "[{}]", attr.slots)?;
                }
                if attr.is_const {
                    write!(f, " const")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
