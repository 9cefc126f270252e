//! # nihia-core
//!
//! The bridge engine between a DAW and a Komplete-Kontrol-style keyboard's
//! dedicated DAW ports. `nihia-proto` supplies the wire format; this crate
//! supplies everything stateful: the connection lifecycle, the mixer-view
//! bank window with its send-suppression cache, the plugin view over the
//! host's FX containers, the extended-edit input mode, and the midir-backed
//! transport.
//!
//! The host side plugs in through [`daw::DawDriver`]; the embedding
//! integration constructs an [`engine::Engine`] with a driver and a
//! [`midi::MidiLink`], calls `tick()` on a timer, and forwards its host
//! notification callbacks to the engine's `on_*` methods.

pub mod config;
pub mod daw;
mod dispatch;
pub mod engine;
pub mod midi;
pub mod state;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::Config;
pub use engine::{Caps, Engine, EngineSettings};
pub use state::ConnectionState;
