//! `ConfFileStore`: the on-disk [`SettingsStore`].
//!
//! # Atomic write
//!
//! ```text
//! serialize(doc) ─▶ <dir>/.<name>.<uuid>.tmp ─▶ fsync ─▶ rename ─▶ <dir>/<name> ─▶ fsync <dir>
//! ```
//!
//! The temporary file lives next to the target so the final `rename` never
//! crosses a file-system boundary.  Readers see either the old file or the
//! new one, never a partial write.  Each write uses a fresh name, so two
//! writers cannot truncate each other's temporary file; the last rename wins.
//! On any failure the temporary file is removed and the target is untouched.
//!
//! The temporary file is created owner-only and takes the target's
//! permissions before any byte is written, so the file's credentials are
//! never readable under looser permissions.  A brand-new file stays
//! owner-only.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nodeconf_core::{parse_bytes, serialize, Document};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::settings_service::{SettingsStore, StoreError};

/// Reads and atomically rewrites one configuration file.
#[derive(Debug, Clone)]
pub struct ConfFileStore {
    path: PathBuf,
}

impl ConfFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a fresh sibling path `.<name>.<uuid>.tmp`.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        let temp_name = format!(".{name}.{}.tmp", Uuid::new_v4().simple());
        match self.path.parent() {
            Some(dir) => dir.join(temp_name),
            None => PathBuf::from(temp_name),
        }
    }

    async fn write_temp(&self, temp: &Path, content: &[u8]) -> std::io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(temp).await?;

        if let Ok(meta) = fs::metadata(&self.path).await {
            file.set_permissions(meta.permissions()).await?;
        }

        file.write_all(content).await?;
        file.sync_all().await?;
        Ok(())
    }
}

/// Flushes the directory entry created by the rename.
///
/// The new contents are already visible at this point, so a failure is
/// only logged.
#[cfg(unix)]
async fn sync_dir(path: &Path) {
    let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return;
    };
    let result = match fs::File::open(dir).await {
        Ok(handle) => handle.sync_all().await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(dir = %dir.display(), "failed to sync directory after rename: {e}");
    }
}

#[cfg(not(unix))]
async fn sync_dir(_path: &Path) {}

#[async_trait]
impl SettingsStore for ConfFileStore {
    async fn load(&self) -> Result<Document, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => parse_bytes(&bytes).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "configuration file not found; using empty document");
                Ok(Document::default())
            }
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn persist(&self, document: &Document) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| StoreError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let content = serialize(document);
        let temp = self.temp_path();

        if let Err(source) = self.write_temp(&temp, content.as_bytes()).await {
            discard(&temp).await;
            return Err(StoreError::Io { path: temp, source });
        }

        if let Err(source) = fs::rename(&temp, &self.path).await {
            discard(&temp).await;
            return Err(StoreError::Io {
                path: self.path.clone(),
                source,
            });
        }

        sync_dir(&self.path).await;

        info!(path = %self.path.display(), bytes = content.len(), "configuration written");
        Ok(())
    }
}

async fn discard(temp: &Path) {
    match fs::remove_file(temp).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %temp.display(), "failed to remove temporary file: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
