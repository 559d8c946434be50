use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::try_join;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pwm_remote::pwm::{PwmOutputs, SysfsPwm};
use pwm_remote::server::{serve_http, serve_ws};

const HTTP_ADDR: &str = "0.0.0.0:80";
const WS_ADDR: &str = "0.0.0.0:81";

// pwmchip and channel pair wired to GPIO 5 and GPIO 6 on the board.
const PWM_CHIP: u32 = 0;
const PWM_CHANNELS: [u32; 2] = [0, 1];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let outputs: Arc<dyn PwmOutputs> =
        Arc::new(SysfsPwm::open(PWM_CHIP, PWM_CHANNELS).context("pwm bring-up")?);

    let http_listener = TcpListener::bind(HTTP_ADDR)
        .await
        .with_context(|| format!("bind http listener on {HTTP_ADDR}"))?;
    let ws_listener = TcpListener::bind(WS_ADDR)
        .await
        .with_context(|| format!("bind websocket listener on {WS_ADDR}"))?;

    info!("http server listening on {HTTP_ADDR}");
    info!("websocket server listening on {WS_ADDR}");

    try_join(serve_http(http_listener), serve_ws(ws_listener, outputs)).await?;

    Ok(())
}
