//! Loads [`ServiceConfig`] from an optional TOML file.
//!
//! A missing file is not an error: the service runs on defaults and on
//! whatever the command line adds.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::domain::config::ServiceConfig;

#[derive(Debug, Error)]
pub enum ServiceConfigError {
    #[error("I/O error reading service config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse service config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Reads the service configuration from `path`.
///
/// `None` or a missing file yields [`ServiceConfig::default()`].
///
/// # Errors
///
/// Returns [`ServiceConfigError::Io`] for I/O errors other than "not found"
/// and [`ServiceConfigError::Parse`] for malformed TOML.
pub fn load_service_config(path: Option<&Path>) -> Result<ServiceConfig, ServiceConfigError> {
    let Some(path) = path else {
        return Ok(ServiceConfig::default());
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "service config not found; using defaults");
            Ok(ServiceConfig::default())
        }
        Err(source) => Err(ServiceConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
