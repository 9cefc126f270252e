//! The device connection lifecycle.
//!
//! Pure state machine; the engine performs the actual port I/O and feeds
//! the results in. Handshake retries are counted in ticks, not wall-clock
//! time, and the only way out of `Failed` is an explicit reconnect request.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Looking for a present and enabled device port pair each tick.
    Scanning,
    /// Port open; sending hello until the device acknowledges.
    HandshakePending,
    Connected,
    /// Handshake budget exhausted or device vanished. Terminal until an
    /// explicit reconnect request.
    Failed,
}

/// Hello attempts before giving up on an unresponsive device.
pub const HANDSHAKE_RETRY_LIMIT: u32 = 8;

#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnectionState,
    retries: u32,
    retry_limit: u32,
    protocol_version: u8,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(HANDSHAKE_RETRY_LIMIT)
    }
}

impl ConnectionManager {
    pub fn new(retry_limit: u32) -> Self {
        Self {
            state: ConnectionState::Scanning,
            retries: 0,
            retry_limit,
            protocol_version: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Version byte from the hello acknowledgement; 0 before connect.
    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// Device port pair found and opened: start handshaking.
    pub fn begin_handshake(&mut self) {
        self.state = ConnectionState::HandshakePending;
        self.retries = 0;
    }

    /// While handshaking: true means "send another hello this tick" and
    /// consumes one attempt; false means the budget is spent and the caller
    /// should tear down and fail.
    pub fn take_hello_attempt(&mut self) -> bool {
        if self.retries < self.retry_limit {
            self.retries += 1;
            true
        } else {
            false
        }
    }

    pub fn fail(&mut self) {
        self.state = ConnectionState::Failed;
    }

    /// Hello acknowledgement received. Valid from any state; the device may
    /// answer late or re-announce after its own restart.
    pub fn on_hello_ack(&mut self, version: u8) {
        self.protocol_version = version;
        self.state = ConnectionState::Connected;
    }

    /// Explicit user-driven reconnect: back to scanning from anywhere.
    pub fn request_reconnect(&mut self) {
        self.state = ConnectionState::Scanning;
        self.retries = 0;
        self.protocol_version = 0;
    }
}
