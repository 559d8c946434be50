//! WebSocket endpoint: upgrade handshake, frame decoding and the session
//! loop that drives the actuator.

pub mod consts;
pub mod frame;
pub mod handshake;
pub mod read;
pub mod session;

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use crate::error::SessionError;
use crate::pwm::PwmOutputs;

/// Runs one connection through the handshake and, if it upgrades, the
/// session loop. The buffered reader created for the handshake is handed on
/// to the frame loop, so bytes a client pipelines right behind its upgrade
/// request are not lost.
pub async fn handle_connection<S>(
    stream: S,
    outputs: Arc<dyn PwmOutputs>,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut writer = write_half;

    handshake::accept(&mut reader, &mut writer).await?;
    session::run(&mut reader, &outputs).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::pwm::Channel;

    #[derive(Default)]
    struct Counting {
        writes: AtomicUsize,
    }

    impl PwmOutputs for Counting {
        fn set_duty(&self, _channel: Channel, _duty: u16) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn a_rejected_handshake_never_touches_the_outputs() {
        let (mut client, server) = tokio::io::duplex(4 * 1024);
        client
            .write_all(b"GET / HTTP/1.1\r\nHost: pico\r\n\r\n")
            .await
            .unwrap();

        let counting = Arc::new(Counting::default());
        let result = handle_connection(server, counting.clone() as Arc<dyn PwmOutputs>).await;

        assert!(matches!(result, Err(SessionError::HandshakeRejected(_))));
        assert_eq!(counting.writes.load(Ordering::SeqCst), 0);

        // No response bytes either: the connection just closes.
        let mut leftover = Vec::new();
        client.read_to_end(&mut leftover).await.unwrap();
        assert!(leftover.is_empty());
    }
}
