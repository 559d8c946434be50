use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use super::consts::{is_masked, LENGTH_MASK};
use super::frame::Frame;
use crate::error::SessionError;

pub async fn read_mask<T: AsyncRead + Unpin>(reader: &mut T) -> Result<[u8; 4], SessionError> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(SessionError::mid_frame)?;
    Ok(buf)
}

/// Reads and unmasks one client frame.
///
/// `Ok(None)` means the peer closed the stream at a frame boundary, which
/// is a normal disconnect. Running out of bytes anywhere past the first
/// header byte is a `TruncatedFrame` violation. Length markers 126 and 127
/// announce the extended encodings this link does not speak, and are
/// rejected rather than misread as short lengths.
pub async fn read_frame<T: AsyncRead + Unpin>(
    reader: &mut T,
) -> Result<Option<Frame>, SessionError> {
    let mut head = [0u8; 2];
    if reader.read(&mut head[..1]).await? == 0 {
        return Ok(None);
    }
    reader
        .read_exact(&mut head[1..])
        .await
        .map_err(SessionError::mid_frame)?;

    if !is_masked(head[1]) {
        return Err(SessionError::UnmaskedFrame);
    }
    let length = match head[1] & LENGTH_MASK {
        value @ 0..=125 => value as usize,
        marker => return Err(SessionError::PayloadLength(marker)),
    };
    let mask = read_mask(reader).await?;

    let mut payload = vec![0; length];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(SessionError::mid_frame)?;

    // unmasking the message
    for i in 0..payload.len() {
        payload[i] ^= mask[i % 4];
    }

    let frame = Frame::new(head[0], payload);
    trace!(opcode = frame.opcode, length, "frame received");
    Ok(Some(frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASK: [u8; 4] = [0x6d, 0xb6, 0xb2, 0x80];

    fn masked_frame(payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0x81, 0x80 | payload.len() as u8];
        frame.extend_from_slice(&MASK);
        frame.extend(payload.iter().enumerate().map(|(i, b)| b ^ MASK[i % 4]));
        frame
    }

    async fn decode(bytes: &[u8]) -> Result<Option<Frame>, SessionError> {
        let mut reader = bytes;
        read_frame(&mut reader).await
    }

    #[tokio::test]
    async fn unmasking_recovers_the_payload_for_every_short_length() {
        for length in 0..=125usize {
            let payload: Vec<u8> = (0..length).map(|i| i as u8).collect();
            let frame = decode(&masked_frame(&payload))
                .await
                .unwrap()
                .expect("one frame");
            assert_eq!(frame.payload, payload, "length {length}");
        }
    }

    #[tokio::test]
    async fn records_the_opcode_without_acting_on_it() {
        let frame = decode(&masked_frame(b"x")).await.unwrap().unwrap();
        assert_eq!(frame.opcode, 0x1);
    }

    #[tokio::test]
    async fn end_of_stream_at_a_frame_boundary_is_a_clean_close() {
        assert!(decode(b"").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn extended_length_markers_are_a_protocol_violation() {
        for marker in [126u8, 127u8] {
            let bytes = [0x81, 0x80 | marker, 0x00, 0x00];
            match decode(&bytes).await {
                Err(SessionError::PayloadLength(m)) => assert_eq!(m, marker),
                other => panic!("expected PayloadLength, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn unmasked_client_frames_are_rejected() {
        // Same frame but with the mask bit clear and no mask key.
        let bytes = [0x81, 0x01, b'x'];
        assert!(matches!(
            decode(&bytes).await,
            Err(SessionError::UnmaskedFrame)
        ));
    }

    #[tokio::test]
    async fn stream_closing_inside_the_mask_key_is_a_truncated_frame() {
        let bytes = [0x81, 0x85, 0x6d, 0xb6];
        assert!(matches!(
            decode(&bytes).await,
            Err(SessionError::TruncatedFrame)
        ));
    }

    #[tokio::test]
    async fn stream_closing_inside_the_payload_is_a_truncated_frame() {
        let mut bytes = masked_frame(b"hello there");
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(
            decode(&bytes).await,
            Err(SessionError::TruncatedFrame)
        ));
    }
}
