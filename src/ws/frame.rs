use super::consts::OPCODE_MASK;

/// One decoded, unmasked frame.
///
/// The opcode is recorded for trace logging but never branched on:
/// fragmentation and control-frame handling are out of scope on this link,
/// so every frame is treated as one complete application payload.
#[derive(Debug)]
pub struct Frame {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub(crate) fn new(first_byte: u8, payload: Vec<u8>) -> Self {
        Frame {
            opcode: first_byte & OPCODE_MASK,
            payload,
        }
    }
}
