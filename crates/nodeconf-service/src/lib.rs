//! nodeconf-service library crate.
//!
//! This crate wraps the pure document model from `nodeconf-core` in a small
//! settings service: it locates the daemon's configuration file, reads and
//! atomically rewrites it, caches the resolved runtime configuration, and
//! answers requests over a JSON-over-WebSocket IPC channel.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! UI process (JSON over WebSocket)
//!         ↕
//! [nodeconf-service]
//!   ├── domain/           ServiceConfig, CachePolicy, IPC message enums
//!   ├── application/      SettingsService use cases, SettingsCache,
//!   │                     SettingsStore / CredentialProvider boundaries
//!   └── infrastructure/
//!         ├── storage/    ConfFileStore (atomic writer), paths, TOML config
//!         ├── credentials StaticCredentials
//!         └── ipc_server  WebSocket accept loop (tokio-tungstenite)
//!         ↕
//! node.conf on disk
//! ```
//!
//! # Layer rules
//!
//! - `domain` performs no I/O.
//! - `application` depends on `domain` and `nodeconf-core`; it reaches the
//!   file system only through the [`application::SettingsStore`] trait.
//! - `infrastructure` implements those traits with `tokio::fs` and serves
//!   the IPC protocol.

/// Domain layer: configuration and message types (no I/O).
pub mod domain;

/// Application layer: settings use cases and the runtime-configuration cache.
pub mod application;

/// Infrastructure layer: file storage, credentials and the IPC server.
pub mod infrastructure;
