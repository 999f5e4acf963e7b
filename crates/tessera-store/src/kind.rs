//! Backend selection by name.

use std::fmt;
use std::str::FromStr;

use tessera_core::Backend;
use thiserror::Error;

use crate::dense::DenseBackend;
use crate::lite::LiteBackend;

/// The built-in backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// [`DenseBackend`]: contiguous typed arrays.
    #[default]
    Dense,
    /// [`LiteBackend`]: per-instance records.
    Lite,
}

impl BackendKind {
    /// Every built-in backend.
    pub const ALL: [BackendKind; 2] = [Self::Dense, Self::Lite];

    /// Create an empty backend of this kind.
    pub fn create(self) -> Box<dyn Backend> {
        match self {
            Self::Dense => Box::new(DenseBackend::new()),
            Self::Lite => Box::new(LiteBackend::new()),
        }
    }

    /// Stable name, equal to [`Backend::name`] of the created backend.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Lite => "lite",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a backend name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown backend '{0}' (expected 'dense' or 'lite')")]
pub struct ParseBackendKindError(pub String);

impl FromStr for BackendKind {
    type Err = ParseBackendKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dense" => Ok(Self::Dense),
            "lite" => Ok(Self::Lite),
            other => Err(ParseBackendKindError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_created_backends() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.create().name(), kind.name());
            assert_eq!(kind.name().parse::<BackendKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_name_rejected() {
        let err = "raw".parse::<BackendKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown backend 'raw' (expected 'dense' or 'lite')");
    }

    #[test]
    fn default_is_dense() {
        assert_eq!(BackendKind::default(), BackendKind::Dense);
    }
}
