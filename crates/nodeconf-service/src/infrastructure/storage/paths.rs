//! Locates the daemon data directory and its configuration file.
//!
//! Platform defaults:
//!
//! - Windows: `%APPDATA%\Node`
//! - macOS:   `~/Library/Application Support/Node`
//! - Linux:   `~/.node`

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Neither an explicit data directory nor the platform base directory
    /// is available.
    #[error("could not determine the daemon data directory; pass --data-dir")]
    NoPlatformDataDir,
}

/// Returns `explicit` if given, otherwise the platform default data directory.
///
/// # Errors
///
/// Returns [`PathError::NoPlatformDataDir`] when no directory was given and
/// the platform base directory cannot be read from the environment.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf, PathError> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => platform_data_dir().ok_or(PathError::NoPlatformDataDir),
    }
}

/// Resolves the full path of the daemon configuration file.
pub fn resolve_conf_path(
    explicit_data_dir: Option<&Path>,
    conf_file_name: &str,
) -> Result<PathBuf, PathError> {
    Ok(resolve_data_dir(explicit_data_dir)?.join(conf_file_name))
}

fn platform_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Node"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Node")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".node"))
    }
}
