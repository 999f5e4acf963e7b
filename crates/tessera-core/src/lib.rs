//! Core types and traits for the Tessera node attribute store.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Tessera workspace:
//! identifiers, attribute types and values, schema declaration, the
//! backend-neutral captured pool image, the [`Backend`] contract, and
//! the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attr;
pub mod column;
pub mod error;
pub mod id;
pub mod schema;
pub mod seal;
pub mod traits;

pub use attr::{AttrPrimitive, AttrValue, AttributeType, ParseAttributeTypeError};
pub use column::{ColumnData, ImageColumn, PoolImage};
pub use error::{AttrShape, ErrorKind, FrameError};
pub use id::{AttrId, SchemaId, TickId};
pub use schema::{AttributeDescriptor, AttributeSpec, NodeSchema, SchemaRegistry};
pub use seal::InstanceSet;
pub use traits::{AttrCoord, Backend};
