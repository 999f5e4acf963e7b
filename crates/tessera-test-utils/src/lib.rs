//! Test utilities for Tessera development.
//!
//! [`fixtures`] holds the standard storage/consumer schemas, frames built
//! from them and a deterministic mutation script. [`conformance`] checks
//! that a frame on a given backend honours the store's contract.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod conformance;
pub mod fixtures;

pub use conformance::run_full_conformance;
pub use fixtures::{run_script, storage_frame, ScriptTrace};
