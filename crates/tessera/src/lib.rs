//! Tessera: a typed, snapshot-capable columnar store for simulation node
//! attributes.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Tessera sub-crates. For most users, adding `tessera` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! node_schema! {
//!     /// A warehouse.
//!     pub struct Storage = "storage" {
//!         CAPACITY: i32 => "capacity";
//!         PRODUCTS: i32 => "product_number".list();
//!     }
//! }
//!
//! let mut frame = FrameBuilder::new()
//!     .backend(BackendKind::Lite)
//!     .snapshots(8)
//!     .node::<Storage>(3)?
//!     .build()?;
//!
//! frame.set("storage", 1, "capacity", 100)?;
//! frame.append("storage", 1, "product_number", 5)?;
//! frame.append("storage", 1, "product_number", 7)?;
//! frame.take_snapshot(0u64)?;
//!
//! frame.set("storage", 1, "capacity", 50)?;
//! frame.take_snapshot(1u64)?;
//!
//! // Values come back ordered tick → index → attribute → slot.
//! let result = frame.query(
//!     &SnapshotQuery::new("storage")
//!         .ticks([0u64, 1])
//!         .index(1)
//!         .attrs(["capacity", "product_number"]),
//! )?;
//! assert_eq!(result.to_f64_vec(), vec![100.0, 5.0, 7.0, 50.0, 5.0, 7.0]);
//!
//! let node = frame.node("storage", 1)?;
//! assert_eq!(node.read(Storage::CAPACITY)?, 50);
//! # Ok::<(), tessera::types::FrameError>(())
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | IDs, attribute types and values, schemas, `Backend`, errors |
//! | [`store`] | `tessera-store` | Dense and lite backends, pool layout |
//! | [`frame`] | `tessera-frame` | Frame, builder, snapshot ring, queries, accessors, lifecycle |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`tessera-core`).
///
/// Contains attribute types and values, schema declaration, the
/// [`types::Backend`] trait and [`types::FrameError`].
pub use tessera_core as types;

/// Storage backends (`tessera-store`).
///
/// [`store::DenseBackend`] and [`store::LiteBackend`], selected by
/// [`store::BackendKind`].
pub use tessera_store as store;

/// The frame and its snapshot machinery (`tessera-frame`).
///
/// [`frame::Frame`], [`frame::FrameBuilder`], [`frame::SnapshotRing`] and
/// the query engine.
pub use tessera_frame as frame;

pub use tessera_frame::node_schema;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tessera_core::{
        AttrPrimitive, AttrValue, AttributeSpec, AttributeType, NodeSchema, SchemaId,
        SchemaRegistry, TickId,
    };

    // Errors
    pub use tessera_core::{ErrorKind, FrameError};

    // Backends
    pub use tessera_store::BackendKind;

    // Frame
    pub use tessera_frame::{
        build_frame, AttrHandle, AttrKey, EpisodeRunner, Frame, FrameBuilder, FrameConfig,
        FrameEntity, NodeMut, NodeRef, NodeType, QueryResult, SnapshotQuery,
    };

    pub use tessera_frame::node_schema;
}
