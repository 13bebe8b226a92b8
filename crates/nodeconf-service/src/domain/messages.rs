//! JSON message types exchanged over the IPC WebSocket.
//!
//! Each WebSocket text frame carries exactly one JSON object.  Requests are
//! tagged with a `"type"` field; every request is answered with exactly one
//! [`IpcResponse`] echoing the caller's `request_id`.
//!
//! # Requests
//!
//! ```json
//! { "type": "GetSettings", "request_id": "1", "raw": false }
//! { "type": "SaveSettings", "request_id": "2", "changes": { "addressindex": true } }
//! { "type": "RpcConfiguration", "request_id": "3" }
//! { "type": "InvalidateCache" }
//! ```
//!
//! # Response
//!
//! ```json
//! { "request_id": "2", "success": true, "data": { "modified": true, ... } }
//! { "request_id": null, "success": false, "error": "invalid request: ..." }
//! ```

use serde::{Deserialize, Serialize};

/// Requests accepted on the IPC channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IpcRequest {
    /// Read the configuration file.  `raw = true` returns the lossless
    /// document tree, otherwise the flattened section/key map.
    GetSettings {
        #[serde(default)]
        request_id: Option<String>,
        #[serde(default)]
        raw: bool,
    },

    /// Merge `changes` into the global section and persist the file.
    SaveSettings {
        #[serde(default)]
        request_id: Option<String>,
        changes: serde_json::Map<String, serde_json::Value>,
    },

    /// Return the resolved runtime configuration used to talk to the daemon.
    RpcConfiguration {
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Drop the cached runtime configuration.
    InvalidateCache {
        #[serde(default)]
        request_id: Option<String>,
    },
}

impl IpcRequest {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            IpcRequest::GetSettings { request_id, .. }
            | IpcRequest::SaveSettings { request_id, .. }
            | IpcRequest::RpcConfiguration { request_id }
            | IpcRequest::InvalidateCache { request_id } => request_id.as_deref(),
        }
    }

    /// Returns the `"type"` tag, for log messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            IpcRequest::GetSettings { .. } => "GetSettings",
            IpcRequest::SaveSettings { .. } => "SaveSettings",
            IpcRequest::RpcConfiguration { .. } => "RpcConfiguration",
            IpcRequest::InvalidateCache { .. } => "InvalidateCache",
        }
    }
}

/// The reply to a single [`IpcRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Copied from the request; `None` when the request had none or could
    /// not be parsed.
    pub request_id: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IpcResponse {
    pub fn ok(request_id: Option<String>, data: serde_json::Value) -> Self {
        Self {
            request_id,
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A successful reply with no payload.
    pub fn ack(request_id: Option<String>) -> Self {
        Self {
            request_id,
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn err(request_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            request_id,
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
