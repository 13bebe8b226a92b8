//! SettingsService: the read / save / resolve use cases.
//!
//! The service owns no file handles.  It talks to the configuration file
//! through the [`SettingsStore`] trait and obtains RPC credentials through
//! [`CredentialProvider`], so every use case can be tested with in-memory
//! doubles.
//!
//! # Operations
//!
//! | Operation               | Reads file | Writes file      | Cache             |
//! |-------------------------|------------|------------------|-------------------|
//! | `get_settings(raw)`     | yes        | no               | untouched         |
//! | `save_settings(changes)`| yes        | only if modified | per `CachePolicy` |
//! | `rpc_configuration()`   | on miss    | no               | filled on success |
//! | `invalidate_cache()`    | no         | no               | emptied           |

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use nodeconf_core::{merge, project, AllowedKeys, Document, ParseError, Settings, GLOBAL_BUCKET};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::application::settings_cache::{RuntimeConfiguration, SettingsCache};
use crate::domain::config::ServiceConfig;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error accessing configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid text.
    #[error("failed to decode configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Error returned by [`SettingsService::save_settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ── Boundaries ────────────────────────────────────────────────────────────────

/// Access to the persisted configuration document.
///
/// The infrastructure implementation is `ConfFileStore`; tests use an
/// in-memory store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Loads the document.  A missing file is an empty document, not an error.
    async fn load(&self) -> Result<Document, StoreError>;

    /// Replaces the persisted document with `document` atomically.
    async fn persist(&self, document: &Document) -> Result<(), StoreError>;
}

/// Source of the daemon RPC credentials reported as `auth`.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialProvider: Send + Sync {
    fn auth(&self) -> Option<String>;
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Result of [`SettingsService::get_settings`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingsView {
    /// The lossless document tree.
    Raw(Document),
    /// Section name → key → value.
    Flat(Settings),
}

impl SettingsView {
    fn empty(raw: bool) -> Self {
        if raw {
            SettingsView::Raw(Document::default())
        } else {
            SettingsView::Flat(Settings::new())
        }
    }
}

/// Result of a successful [`SettingsService::save_settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    /// `false` when every requested value was already in place (or every
    /// requested key was rejected); the file was not rewritten.
    pub modified: bool,
    pub updated: Vec<String>,
    pub appended: Vec<String>,
}

/// Runtime options overlaid on the file when resolving the runtime
/// configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeOptions {
    pub testnet: bool,
    pub test_section: String,
    pub overrides: serde_json::Map<String, serde_json::Value>,
}

impl From<&ServiceConfig> for RuntimeOptions {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            testnet: config.testnet,
            test_section: config.test_section.clone(),
            overrides: config.overrides.clone(),
        }
    }
}

// ── Service ───────────────────────────────────────────────────────────────────

pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    credentials: Arc<dyn CredentialProvider>,
    allowed: AllowedKeys,
    options: RuntimeOptions,
    cache: SettingsCache,
    /// Serializes load → merge → persist within this process.
    save_lock: Mutex<()>,
}

impl SettingsService {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        credentials: Arc<dyn CredentialProvider>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            store,
            credentials,
            allowed: config.allowed(),
            options: RuntimeOptions::from(config),
            cache: SettingsCache::new(config.cache_policy),
            save_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &SettingsCache {
        &self.cache
    }

    /// Reads the configuration file.
    ///
    /// Read failures are logged and produce an empty view of the requested
    /// shape; this operation never fails.
    pub async fn get_settings(&self, raw: bool) -> SettingsView {
        let document = match self.store.load().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("could not read configuration, returning empty settings: {e}");
                return SettingsView::empty(raw);
            }
        };

        if raw {
            SettingsView::Raw(document)
        } else {
            SettingsView::Flat(project(&document))
        }
    }

    /// Merges `changes` into the global section and persists the result.
    ///
    /// Keys outside the whitelist are dropped.  The file is only rewritten
    /// when a value actually changed.  A read failure other than a missing
    /// file aborts the save so an unreadable file is never replaced.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Store`] if the file cannot be read or the
    /// atomic write fails.  The error is also logged.
    pub async fn save_settings(
        &self,
        changes: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<SaveOutcome, SettingsError> {
        match self.try_save(changes).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("failed to save configuration: {e}");
                Err(e)
            }
        }
    }

    async fn try_save(
        &self,
        changes: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<SaveOutcome, SettingsError> {
        let _guard = self.save_lock.lock().await;

        let document = self.store.load().await?;
        let merged = merge(document, changes, &self.allowed);

        if !merged.modified {
            debug!("no configuration changes to persist");
            return Ok(SaveOutcome::default());
        }

        self.store.persist(&merged.document).await?;
        info!(
            updated = ?merged.updated,
            appended = ?merged.appended,
            "configuration saved"
        );
        self.cache.on_write().await;

        Ok(SaveOutcome {
            modified: true,
            updated: merged.updated,
            appended: merged.appended,
        })
    }

    /// Returns the runtime configuration used to connect to the daemon.
    ///
    /// On a cache miss the file is read and resolved with
    /// [`resolve_runtime_configuration`].  The result is cached only when the
    /// read succeeded and no save invalidated the cache while it was loading.
    pub async fn rpc_configuration(&self) -> Arc<RuntimeConfiguration> {
        if let Some(cached) = self.cache.get().await {
            return cached;
        }

        let generation = self.cache.generation().await;
        match self.store.load().await {
            Ok(document) => {
                let config = resolve_runtime_configuration(
                    &project(&document),
                    self.credentials.auth(),
                    &self.options,
                );
                debug!(keys = config.len(), "resolved runtime configuration");
                self.cache.store_if_current(config, generation).await
            }
            Err(e) => {
                warn!("could not read configuration, resolving without file settings: {e}");
                Arc::new(resolve_runtime_configuration(
                    &Settings::new(),
                    self.credentials.auth(),
                    &self.options,
                ))
            }
        }
    }

    /// Drops the cached runtime configuration.  Returns `true` if one was
    /// cached.
    pub async fn invalidate_cache(&self) -> bool {
        self.cache.invalidate().await
    }
}

/// Builds the runtime configuration from projected file settings.
///
/// Layers, later ones winning:
///
/// 1. the global bucket of the file;
/// 2. `auth` from the credential provider (omitted when `None`);
/// 3. the test-network section, when `testnet` is truthy in the file or set
///    in `options`;
/// 4. `options.overrides`.
pub fn resolve_runtime_configuration(
    settings: &Settings,
    auth: Option<String>,
    options: &RuntimeOptions,
) -> RuntimeConfiguration {
    let mut config = RuntimeConfiguration::new();

    let global = settings.get(GLOBAL_BUCKET);
    if let Some(global) = global {
        for (key, value) in global {
            config.insert(key.clone(), value.to_json());
        }
    }

    if let Some(auth) = auth {
        config.insert("auth".to_string(), serde_json::Value::String(auth));
    }

    let file_testnet = global
        .and_then(|g| g.get("testnet"))
        .is_some_and(|v| v.is_truthy());
    if file_testnet || options.testnet {
        if let Some(test) = settings.get(options.test_section.as_str()) {
            for (key, value) in test {
                config.insert(key.clone(), value.to_json());
            }
        }
    }
    if options.testnet {
        config.insert("testnet".to_string(), serde_json::Value::Bool(true));
    }

    for (key, value) in &options.overrides {
        config.insert(key.clone(), value.clone());
    }
    config
}

// ── Tests ─────────────────────────────────────────────────────────────────────
