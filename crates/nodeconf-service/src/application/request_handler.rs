//! Maps IPC requests onto [`SettingsService`] calls.
//!
//! Transport-independent: the WebSocket server hands every parsed
//! [`IpcRequest`] to [`handle_request`] and sends back whatever it returns.

use tracing::error;

use crate::application::settings_service::SettingsService;
use crate::domain::messages::{IpcRequest, IpcResponse};

/// Executes `request` and builds its response.  Never fails: errors become
/// `success: false` responses.
pub async fn handle_request(service: &SettingsService, request: IpcRequest) -> IpcResponse {
    match request {
        IpcRequest::GetSettings { request_id, raw } => {
            let view = service.get_settings(raw).await;
            to_response(request_id, &view)
        }
        IpcRequest::SaveSettings {
            request_id,
            changes,
        } => match service.save_settings(&changes).await {
            Ok(outcome) => to_response(request_id, &outcome),
            Err(e) => IpcResponse::err(request_id, e.to_string()),
        },
        IpcRequest::RpcConfiguration { request_id } => {
            let config = service.rpc_configuration().await;
            to_response(request_id, config.as_ref())
        }
        IpcRequest::InvalidateCache { request_id } => {
            service.invalidate_cache().await;
            IpcResponse::ack(request_id)
        }
    }
}

/// Builds the error response for a frame that is not a valid request.
pub fn invalid_request(error: &serde_json::Error) -> IpcResponse {
    IpcResponse::err(None, format!("invalid request: {error}"))
}

fn to_response<T: serde::Serialize + ?Sized>(request_id: Option<String>, data: &T) -> IpcResponse {
    match serde_json::to_value(data) {
        Ok(value) => IpcResponse::ok(request_id, value),
        Err(e) => {
            error!("failed to serialize response: {e}");
            IpcResponse::err(request_id, format!("failed to serialize response: {e}"))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
