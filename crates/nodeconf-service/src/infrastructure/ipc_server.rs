//! IPC server: WebSocket accept loop and per-session request handling.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Upgrading each accepted connection to a WebSocket session.
//! 3. Parsing every text frame as an [`IpcRequest`] and running it in its
//!    own Tokio task, so a slow save never delays a read on the same session.
//! 4. Sending exactly one [`IpcResponse`] per text frame.  Responses may
//!    arrive out of order; clients match them by `request_id`.
//! 5. Stopping the accept loop when the `running` flag is cleared.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::application::{handle_request, invalid_request, SettingsService};
use crate::domain::messages::{IpcRequest, IpcResponse};

type WsSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;

/// How often the accept loop wakes up to check the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the IPC listener on `addr`.
///
/// # Errors
///
/// Returns an error if the address is in use or cannot be bound.
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind IPC listener on {addr}"))
}

/// Binds `addr` and serves IPC sessions until `running` is cleared.
pub async fn run_server(
    addr: SocketAddr,
    service: Arc<SettingsService>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = bind(addr).await?;
    serve(listener, service, running).await
}

/// Accepts WebSocket sessions on `listener` until `running` is cleared.
///
/// Each connection gets its own task; the loop never waits on a session.
pub async fn serve(
    listener: TcpListener,
    service: Arc<SettingsService>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let local = listener
        .local_addr()
        .context("failed to read IPC listener address")?;
    info!("IPC server listening on ws://{local}");

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new IPC connection from {peer_addr}");
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    handle_session(stream, peer_addr, service).await;
                });
            }
            Ok(Err(e)) => {
                error!("accept error: {e}");
            }
            Err(_) => {
                // No connection within the poll interval.
            }
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_session(stream: TcpStream, peer_addr: SocketAddr, service: Arc<SettingsService>) {
    match run_session(stream, peer_addr, service).await {
        Ok(()) => debug!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    service: Arc<SettingsService>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;
    info!("IPC session established: {peer_addr}");

    let (ws_tx, mut ws_rx) = ws_stream.split();
    let ws_tx = Arc::new(Mutex::new(ws_tx));

    loop {
        let ws_msg = match ws_rx.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("session {peer_addr}: WebSocket closed");
                break;
            }
            Some(Err(e)) => {
                warn!("session {peer_addr}: WebSocket error: {e}");
                break;
            }
            None => break,
        };

        match ws_msg {
            WsMessage::Text(text) => {
                let request: IpcRequest = match serde_json::from_str(&text) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("session {peer_addr}: invalid request: {e}");
                        send_response(&ws_tx, &invalid_request(&e), peer_addr).await;
                        continue;
                    }
                };

                debug!(
                    "session {peer_addr}: {} request {:?}",
                    request.type_name(),
                    request.request_id()
                );

                let service = Arc::clone(&service);
                let ws_tx = Arc::clone(&ws_tx);
                tokio::spawn(async move {
                    let response = handle_request(&service, request).await;
                    send_response(&ws_tx, &response, peer_addr).await;
                });
            }
            WsMessage::Binary(_) => {
                warn!("session {peer_addr}: unexpected binary frame");
                let response = IpcResponse::err(None, "binary frames are not supported");
                send_response(&ws_tx, &response, peer_addr).await;
            }
            WsMessage::Close(_) => {
                debug!("session {peer_addr}: Close frame received");
                break;
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
        }
    }

    Ok(())
}

async fn send_response(ws_tx: &Mutex<WsSink>, response: &IpcResponse, peer_addr: SocketAddr) {
    let json = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            error!("session {peer_addr}: failed to encode response: {e}");
            return;
        }
    };

    let mut sink = ws_tx.lock().await;
    if let Err(e) = sink.send(WsMessage::Text(json)).await {
        debug!("session {peer_addr}: send failed (client disconnected): {e}");
    }
}
