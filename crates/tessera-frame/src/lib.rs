//! The Tessera frame: live per-schema node pools, snapshots and queries.
//!
//! A [`Frame`] holds one pool per declared node schema in a single
//! [`Backend`](tessera_core::Backend). Values are addressed by
//! `(schema, instance index, attribute, slot)`. With snapshots enabled,
//! [`Frame::take_snapshot`] copies every pool into a bounded
//! [`SnapshotRing`], and [`Frame::query`] flattens any tick × index ×
//! attribute selection into one value sequence ordered
//! `tick → index → attribute → slot`.
//!
//! Construction goes through [`FrameBuilder`] or [`build_frame`].
//! [`node_schema!`] declares typed node types, [`NodeRef`]/[`NodeMut`]
//! give per-instance views, and [`EpisodeRunner`] drives entity
//! lifecycles over a frame.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod accessor;
pub mod builder;
pub mod config;
pub mod frame;
pub mod info;
pub mod lifecycle;
pub mod macros;
pub mod query;
pub mod ring;

pub use accessor::{AttrKey, NodeMut, NodeRef};
pub use builder::{build_frame, FrameBuilder};
pub use config::{ConfigError, FrameConfig};
pub use frame::{AttrHandle, Frame};
pub use info::{AttributeInfo, FrameInfo, SchemaInfo};
pub use lifecycle::{EpisodeRunner, FrameEntity};
pub use macros::NodeType;
pub use query::{IndexSelector, QueryPlan, QueryResult, SnapshotQuery, TickSelector};
pub use ring::{FrameSnapshot, SnapshotRing};
pub use tessera_store::BackendKind;

#[doc(hidden)]
pub mod __private {
    pub use tessera_core::AttributeSpec;
}
