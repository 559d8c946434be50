//! Accept loops for the listener pair.
//!
//! Each loop spawns one task per accepted connection. Session failures are
//! logged inside their own task and never reach the listener; an accept
//! error is fatal, since nothing works without a listener.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::http;
use crate::pwm::PwmOutputs;
use crate::ws;

/// Serves the control page to every connection on the HTTP port.
pub async fn serve_http(listener: TcpListener) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(err) = http::handle(stream).await {
                debug!(%peer, error = %err, "http connection error");
            }
        });
    }
}

/// Accepts WebSocket control connections, one session task each.
pub async fn serve_ws(listener: TcpListener, outputs: Arc<dyn PwmOutputs>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let outputs = Arc::clone(&outputs);
        tokio::spawn(async move {
            let session = Uuid::new_v4();
            info!(%session, %peer, "websocket client connected");
            match ws::handle_connection(stream, outputs).await {
                Ok(()) => info!(%session, "websocket client disconnected"),
                Err(err) => warn!(%session, error = %err, "session ended"),
            }
        });
    }
}
