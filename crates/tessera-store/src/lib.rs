//! Storage backends for the Tessera node attribute store.
//!
//! Two interchangeable implementations of [`tessera_core::Backend`]:
//!
//! - [`DenseBackend`]: one contiguous typed column per fixed attribute,
//!   `instance_count * slots` values, instance-major. Lists are held as one
//!   typed column per instance.
//! - [`LiteBackend`]: one growable record per instance holding tagged
//!   values. Simpler, suited to small pools.
//!
//! Both compute their layout through [`PoolLayout`] and validate every
//! access through the shared checks in [`tessera_core::traits`], so they
//! are observably identical. [`BackendKind`] selects one by name.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dense;
pub mod kind;
pub mod layout;
pub mod lite;

#[cfg(test)]
pub(crate) mod compliance;

pub use dense::DenseBackend;
pub use kind::{BackendKind, ParseBackendKindError};
pub use layout::{AttrLayout, AttrStorage, PoolLayout};
pub use lite::LiteBackend;
