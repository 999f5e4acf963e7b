//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a node schema within a frame.
///
/// Schemas are declared before the frame is built and assigned sequential
/// IDs. `SchemaId(n)` corresponds to the n-th declared schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub u32);

impl SchemaId {
    /// The ID as a `usize` index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SchemaId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an attribute within its node schema.
///
/// `AttrId(n)` is the n-th attribute in declaration order. IDs are only
/// meaningful together with the [`SchemaId`] they were declared on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(pub u32);

impl AttrId {
    /// The ID as a `usize` index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AttrId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// One discrete simulation time step.
///
/// Ticks are supplied by the caller when capturing snapshots; they need
/// not be contiguous or monotonic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
