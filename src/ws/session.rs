use std::sync::Arc;

use serde::Deserialize;
use tokio::io::AsyncRead;
use tracing::warn;

use super::read::read_frame;
use crate::error::SessionError;
use crate::pwm::{Channel, FailSafe, PwmOutputs};

/// One slider update from the page. Either key may be absent and unknown
/// keys are ignored. `u16` is exactly the legal duty range, so serde
/// rejects out-of-range, negative and non-integer values outright instead
/// of clamping them.
#[derive(Debug, Deserialize)]
struct ControlMessage {
    g5: Option<u16>,
    g6: Option<u16>,
}

/// Frame loop of an open session.
///
/// A message that fails to decode is logged and skipped; the next frame on
/// the same connection is still processed. Frame-level violations and
/// transport errors end the session. Whatever the exit path, the fail-safe
/// guard zeroes both channels before the caller releases the connection.
pub async fn run<R>(reader: &mut R, outputs: &Arc<dyn PwmOutputs>) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    let _fail_safe = FailSafe::new(Arc::clone(outputs));

    loop {
        let frame = match read_frame(reader).await? {
            Some(frame) => frame,
            None => return Ok(()),
        };
        match serde_json::from_slice::<ControlMessage>(&frame.payload) {
            Ok(message) => {
                if let Some(duty) = message.g5 {
                    outputs.set_duty(Channel::Gpio5, duty);
                }
                if let Some(duty) = message.g6 {
                    outputs.set_duty(Channel::Gpio6, duty);
                }
            }
            Err(err) => warn!(error = %err, "discarding malformed control message"),
        }
    }
}
