//! # nihia-proto
//!
//! Wire-protocol types for the NIHIA-style keyboard integration protocol:
//! the command byte enumeration, CC and SysEx message framing, and the
//! value conversions between DAW-native units and the 7-bit representations
//! the hardware understands.
//!
//! This crate is pure data — no I/O, no host types. The engine crate
//! (`nihia-core`) composes these into the actual bridge.

pub mod codec;
pub mod command;
pub mod framing;

pub use codec::{meter_level, signed_7bit, Sensitivity};
pub use command::Cmd;
pub use framing::{CcMessage, SysexMessage, CC_STATUS, SYSEX_END, SYSEX_PREAMBLE};

/// Number of mixer/parameter slots visible on the hardware at once.
pub const BANK_SLOTS: usize = 8;
