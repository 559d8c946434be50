use std::collections::HashMap;

use sha1::{Digest, Sha1};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::SessionError;

const WS_MAGIC_CONST: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

// A browser upgrade request is well under 1 KiB; anything approaching this
// cap is not a handshake worth finishing.
const MAX_HEAD_BYTES: usize = 8 * 1024;

fn sha1(msg: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(msg);
    hasher.finalize().into()
}

/// Accept token for a client key: SHA-1 over the key followed by the
/// protocol GUID, base64-encoded. A pure function of the key; no other part
/// of the request feeds into it.
pub fn accept_key(input: &[u8]) -> String {
    let concatenated = [input, WS_MAGIC_CONST].concat();
    let hash = sha1(&concatenated);
    base64::encode(hash)
}

/// Reads the request line and the header lines up to the blank line.
/// Header names are lowercased; a duplicated header keeps the last value
/// seen. The request line itself is not validated.
async fn read_request_head<R>(reader: &mut R) -> Result<HashMap<String, String>, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let mut total = reader.read_line(&mut line).await?;
    if total == 0 {
        return Err(SessionError::HandshakeRejected("empty request"));
    }
    debug!(request_line = %line.trim_end(), "upgrade request");

    let mut headers = HashMap::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(SessionError::HandshakeRejected("request head truncated"));
        }
        total += n;
        if total > MAX_HEAD_BYTES {
            return Err(SessionError::HandshakeRejected("request head too large"));
        }
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            return Ok(headers);
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
}

/// Validates the upgrade request and answers `101 Switching Protocols`.
///
/// A request without `Upgrade: websocket` or without a key is rejected and
/// the connection closed with no response written.
pub async fn accept<R, W>(reader: &mut R, writer: &mut W) -> Result<(), SessionError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let headers = read_request_head(reader).await?;

    let upgrade_ok = headers
        .get("upgrade")
        .map(|value| value.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);
    if !upgrade_ok {
        return Err(SessionError::HandshakeRejected("not a websocket upgrade"));
    }
    let key = headers
        .get("sec-websocket-key")
        .ok_or(SessionError::HandshakeRejected("missing sec-websocket-key"))?;

    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         \r\n",
        accept_key(key.as_bytes())
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
