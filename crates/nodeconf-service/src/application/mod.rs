//! Application layer for nodeconf-service.
//!
//! Knows *what* to do with the configuration file (read, merge, persist,
//! resolve, cache) and delegates *how* to the infrastructure layer through
//! the [`SettingsStore`] and [`CredentialProvider`] traits.
//!
//! # What does NOT belong here?
//!
//! - Opening files or sockets
//! - WebSocket framing
//! - Platform path resolution

pub mod request_handler;
pub mod settings_cache;
pub mod settings_service;

pub use request_handler::{handle_request, invalid_request};
pub use settings_cache::{RuntimeConfiguration, SettingsCache};
pub use settings_service::{
    resolve_runtime_configuration, CredentialProvider, RuntimeOptions, SaveOutcome,
    SettingsError, SettingsService, SettingsStore, SettingsView, StoreError,
};
