use std::io;

use thiserror::Error;

/// Terminal failure modes of one WebSocket session.
///
/// `PayloadLength`, `UnmaskedFrame` and `TruncatedFrame` together form the
/// frame-protocol-violation family. Malformed control messages are not in
/// here: they are logged and skipped by the session loop without ending the
/// session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The upgrade request was not a usable WebSocket handshake.
    /// The connection is closed without a response.
    #[error("handshake rejected: {0}")]
    HandshakeRejected(&'static str),

    /// The frame header declared an extended payload length (marker 126 or
    /// 127). Lengths above 125 bytes are outside this system's scope and
    /// must not be misparsed as short ones.
    #[error("unsupported payload length marker {0}")]
    PayloadLength(u8),

    /// A client frame arrived without the mandatory mask bit.
    #[error("client frame is not masked")]
    UnmaskedFrame,

    /// The stream ended in the middle of a frame.
    #[error("stream closed mid-frame")]
    TruncatedFrame,

    /// I/O failure on the underlying connection.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

impl SessionError {
    /// Maps a read error during frame decoding: running out of bytes once a
    /// frame has started is a protocol violation, anything else is
    /// transport trouble.
    pub(crate) fn mid_frame(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            SessionError::TruncatedFrame
        } else {
            SessionError::Transport(err)
        }
    }
}
