use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::reference::Reference;

/// Failure type crossing the resolver and config-format boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Where a container lives, used only to make error messages traceable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin(Option<String>);

impl Origin {
    pub fn registry(name: impl Into<String>) -> Self {
        Self(Some(name.into()))
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(name) => write!(f, " in registry '{}'", name),
            None => Ok(()),
        }
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("cannot register key '{key}'{origin}: {source}")]
    InvalidRegistration {
        origin: Origin,
        key: String,
        #[source]
        source: Box<RegistryError>,
    },

    #[error("key '{key}' not found{origin}")]
    KeyNotFound { origin: Origin, key: String },

    #[error("failed to resolve '{key}' from '{reference}'{origin}: {source}")]
    Resolution {
        origin: Origin,
        key: String,
        reference: Reference,
        #[source]
        source: BoxError,
    },

    #[error("unknown variant '{variant}'{origin}, known variants: {known:?}")]
    UnknownVariant {
        origin: Origin,
        variant: String,
        known: Vec<String>,
        #[source]
        source: Box<RegistryError>,
    },

    #[error("discriminator field '{field}' is missing or not a string{origin}")]
    MissingDiscriminator { origin: Origin, field: String },

    #[error("invalid configuration for variant '{variant}'{origin}: {source}")]
    InvalidConfig {
        origin: Origin,
        variant: String,
        #[source]
        source: BoxError,
    },

    #[error("variant '{variant}'{origin} failed to restore: {source}")]
    Restore {
        origin: Origin,
        variant: String,
        #[source]
        source: BoxError,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[source] BoxError),
}

impl RegistryError {
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistryError::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a later lookup of the same key may succeed without re-registration.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Resolution { .. })
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by [`crate::resolver::ModuleResolver`].
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("module '{location}' not found")]
    ModuleNotFound { location: String },

    #[error("module '{location}' has no member '{member}'")]
    MemberNotFound { location: String, member: String },

    #[error("module '{location}' failed to load: {source}")]
    LoadFailed {
        location: String,
        #[source]
        source: BoxError,
    },
}
