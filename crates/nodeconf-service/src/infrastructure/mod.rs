//! Infrastructure layer for nodeconf-service.
//!
//! All I/O lives here: reading and atomically rewriting the daemon
//! configuration file, locating it on each platform, loading the service's
//! own TOML configuration, supplying RPC credentials, and serving the IPC
//! WebSocket.

pub mod credentials;
pub mod ipc_server;
pub mod storage;

pub use credentials::StaticCredentials;
pub use ipc_server::{bind, run_server, serve};
pub use storage::ConfFileStore;
