//! Encoding and decoding of the two wire shapes: 3-byte CC messages and the
//! vendor SysEx envelope.
//!
//! Decoding is total. Anything that does not frame correctly — wrong status,
//! wrong preamble, truncated fields, missing terminator, payload bytes with
//! the high bit set — comes back as `None` and the caller drops it.

use crate::command::Cmd;

/// Status byte of every protocol CC message (channel 16 control change).
pub const CC_STATUS: u8 = 0xbf;

/// Fixed vendor preamble of every protocol SysEx message.
pub const SYSEX_PREAMBLE: [u8; 10] = [0xf0, 0x00, 0x21, 0x09, 0x00, 0x00, 0x44, 0x43, 0x01, 0x00];

/// SysEx terminator byte.
pub const SYSEX_END: u8 = 0xf7;

/// Fixed fields after the preamble: command, value, index.
const SYSEX_FIXED_FIELDS: usize = 3;

/// Shortest well-formed SysEx: preamble + fixed fields + terminator.
const SYSEX_MIN_LEN: usize = SYSEX_PREAMBLE.len() + SYSEX_FIXED_FIELDS + 1;

/// A 3-byte control change message: `[CC_STATUS, command, value]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcMessage {
    pub cmd: Cmd,
    pub value: u8,
}

impl CcMessage {
    pub fn new(cmd: Cmd, value: u8) -> Self {
        Self { cmd, value }
    }

    pub fn encode(&self) -> [u8; 3] {
        [CC_STATUS, self.cmd.raw(), self.value & 0x7f]
    }

    /// Decode a CC message. `None` for anything that is not exactly a
    /// protocol CC with a known command byte.
    pub fn decode(bytes: &[u8]) -> Option<CcMessage> {
        if bytes.len() != 3 || bytes[0] != CC_STATUS {
            return None;
        }
        let cmd = Cmd::from_raw(bytes[1])?;
        Some(CcMessage {
            cmd,
            value: bytes[2],
        })
    }
}

/// A vendor SysEx message: preamble, command, value, index, ASCII payload,
/// terminator. The payload is delimited by the message length, not by a
/// sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysexMessage {
    pub cmd: Cmd,
    pub value: u8,
    pub index: u8,
    pub payload: Vec<u8>,
}

impl SysexMessage {
    pub fn new(cmd: Cmd, value: u8, index: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            cmd,
            value,
            index,
            payload: payload.into(),
        }
    }

    pub fn text(cmd: Cmd, value: u8, index: u8, text: &str) -> Self {
        Self::new(cmd, value, index, text.as_bytes().to_vec())
    }

    /// Total encoded length. Computed up front because the transport write
    /// takes an explicit byte count.
    pub fn encoded_len(&self) -> usize {
        SYSEX_MIN_LEN + self.payload.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&SYSEX_PREAMBLE);
        out.push(self.cmd.raw());
        out.push(self.value & 0x7f);
        out.push(self.index & 0x7f);
        // Payload bytes must have the high bit clear on the wire.
        out.extend(self.payload.iter().map(|b| b & 0x7f));
        out.push(SYSEX_END);
        out
    }

    /// Decode a SysEx message. Never reads past `bytes`; a payload shorter
    /// than the fixed fields, a foreign preamble, or a missing terminator is
    /// malformed and yields `None`.
    pub fn decode(bytes: &[u8]) -> Option<SysexMessage> {
        if bytes.len() < SYSEX_MIN_LEN {
            return None;
        }
        if bytes[..SYSEX_PREAMBLE.len()] != SYSEX_PREAMBLE {
            return None;
        }
        if bytes[bytes.len() - 1] != SYSEX_END {
            return None;
        }
        let body = &bytes[SYSEX_PREAMBLE.len()..bytes.len() - 1];
        let cmd = Cmd::from_raw(body[0])?;
        let payload = &body[SYSEX_FIXED_FIELDS..];
        if payload.iter().any(|b| b & 0x80 != 0) {
            return None;
        }
        Some(SysexMessage {
            cmd,
            value: body[1],
            index: body[2],
            payload: payload.to_vec(),
        })
    }

    /// Payload interpreted as text, for display-oriented commands.
    pub fn payload_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
