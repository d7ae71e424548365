//! Error type shared by layout, facade synthesis and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building or dressing the city.
#[derive(Debug, Error)]
pub enum CityError {
    /// A tunable is out of range. Raised before any work starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Something the operation needs to write into is absent.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl CityError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn missing(message: impl Into<String>) -> Self {
        Self::MissingDependency(message.into())
    }
}

pub type CityResult<T> = Result<T, CityError>;
