//! Frame configuration, validation, and error types.
//!
//! [`FrameConfig`] is the builder input for constructing a [`Frame`](crate::Frame).
//! [`validate()`](FrameConfig::validate) checks structural invariants before
//! any pool is allocated.

use tessera_core::FrameError;
use tessera_store::BackendKind;
use thiserror::Error;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`FrameConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Snapshots were enabled with a ring of zero slots.
    #[error("snapshot capacity must be at least 1")]
    ZeroSnapshotCapacity,
}

impl From<ConfigError> for FrameError {
    fn from(err: ConfigError) -> Self {
        FrameError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

// ── FrameConfig ────────────────────────────────────────────────────

/// Backend choice and snapshot settings for one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameConfig {
    /// Which built-in backend stores the pools. Default: dense.
    pub backend: BackendKind,
    /// Snapshot ring capacity. `None` disables snapshots. Default: `None`.
    pub snapshot_capacity: Option<usize>,
}

impl FrameConfig {
    /// Dense backend, snapshots disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `backend` for the pools.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Enable snapshots with a ring of `capacity` slots.
    pub fn with_snapshots(mut self, capacity: usize) -> Self {
        self.snapshot_capacity = Some(capacity);
        self
    }

    /// Whether snapshots are enabled.
    pub fn snapshots_enabled(&self) -> bool {
        self.snapshot_capacity.is_some()
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_capacity == Some(0) {
            return Err(ConfigError::ZeroSnapshotCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::ErrorKind;

    #[test]
    fn default_is_dense_without_snapshots() {
        let config = FrameConfig::default();
        assert_eq!(config.backend, BackendKind::Dense);
        assert!(!config.snapshots_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = FrameConfig::new().with_snapshots(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroSnapshotCapacity));
        let err: FrameError = ConfigError::ZeroSnapshotCapacity.into();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn builders_compose() {
        let config = FrameConfig::new()
            .with_backend(BackendKind::Lite)
            .with_snapshots(8);
        assert_eq!(config.backend, BackendKind::Lite);
        assert_eq!(config.snapshot_capacity, Some(8));
    }
}
