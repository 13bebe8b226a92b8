//! Domain layer for nodeconf-service.
//!
//! Plain data types shared by every other layer: the service configuration
//! and the JSON messages exchanged over the IPC channel.  Nothing in here
//! touches the file system or the network.

pub mod config;
pub mod messages;

pub use config::{CachePolicy, ServiceConfig};
pub use messages::{IpcRequest, IpcResponse};
