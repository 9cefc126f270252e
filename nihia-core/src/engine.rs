//! The protocol engine: one instance per bridge, driven by a periodic tick
//! and by host notifications.
//!
//! The engine owns the device link and the host driver and is the only
//! place that performs MIDI I/O. Inbound traffic is drained and dispatched
//! on the tick; host notifications arrive between ticks and are mirrored
//! out immediately through the suppression cache.

use nihia_proto::{CcMessage, Cmd, Sensitivity, SysexMessage, CC_STATUS};

use crate::daw::{DawDriver, ExtendedEvent, PlayState};
use crate::dispatch;
use crate::midi::MidiLink;
use crate::state::{Bank, ConnectionManager, ConnectionState, EditController, EditMode, MirrorCache};

/// Protocol version from which the device accepts high-resolution parameter
/// deltas and tempo display over SysEx.
pub const MIN_VERSION_HIRES: u8 = 3;

/// What the negotiated protocol version lets us send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caps {
    /// Parameter knobs speak `HiResParamDelta`; below this the engine
    /// repurposes the per-slot volume knobs while a plugin is focused.
    pub hires_params: bool,
    /// Tempo readout on the device display.
    pub tempo_sync: bool,
}

impl Caps {
    pub fn for_version(version: u8) -> Caps {
        Caps {
            hires_params: version >= MIN_VERSION_HIRES,
            tempo_sync: version >= MIN_VERSION_HIRES,
        }
    }

    fn none() -> Caps {
        Caps {
            hires_params: false,
            tempo_sync: false,
        }
    }
}

/// Tunables resolved from the config file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub sensitivity: Sensitivity,
    pub handshake_retries: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::default(),
            handshake_retries: crate::state::HANDSHAKE_RETRY_LIMIT,
        }
    }
}

pub struct Engine {
    pub(crate) daw: Box<dyn DawDriver>,
    pub(crate) link: Box<dyn MidiLink>,
    pub(crate) conn: ConnectionManager,
    pub(crate) edit: EditController,
    pub(crate) track_bank: Bank,
    pub(crate) param_bank: Bank,
    pub(crate) mirror: MirrorCache,
    pub(crate) sensitivity: Sensitivity,
    pub(crate) caps: Caps,
    /// Hardware path of the focused plugin: top-level slot, then one child
    /// position per container level. `Some` means the plugin view is active.
    pub(crate) fx_focus: Option<Vec<u8>>,
    /// Metronome state captured when a count-in started, restored on stop.
    pub(crate) count_in_metronome: Option<bool>,
    goodbye_sent: bool,
}

impl Engine {
    pub fn new(daw: Box<dyn DawDriver>, link: Box<dyn MidiLink>, settings: EngineSettings) -> Self {
        Self {
            daw,
            link,
            conn: ConnectionManager::new(settings.handshake_retries),
            edit: EditController::new(),
            track_bank: Bank::default(),
            param_bank: Bank::default(),
            mirror: MirrorCache::new(),
            sensitivity: settings.sensitivity,
            caps: Caps::none(),
            fx_focus: None,
            count_in_metronome: None,
            goodbye_sent: false,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.conn.state()
    }

    pub fn protocol_version(&self) -> u8 {
        self.conn.protocol_version()
    }

    pub(crate) fn plugin_view(&self) -> bool {
        self.fx_focus.is_some()
    }

    /// One engine tick: drain inbound MIDI, advance the connection machine,
    /// run the edit-mode feedback timers and push meter data while playing.
    pub fn tick(&mut self) {
        for packet in self.link.drain() {
            self.on_midi(&packet);
        }
        match self.conn.state() {
            ConnectionState::Scanning => {
                if self.link.connect().is_ok() {
                    log::info!(target: "engine", "device port pair open, handshaking");
                    self.conn.begin_handshake();
                }
            }
            ConnectionState::HandshakePending => {
                if self.conn.take_hello_attempt() {
                    self.send_cc(Cmd::Hello, 0);
                } else {
                    log::warn!(
                        target: "engine",
                        "no handshake reply; is the keyboard's host integration enabled?"
                    );
                    self.link.close();
                    self.conn.fail();
                }
            }
            ConnectionState::Connected => {
                self.tick_edit_feedback();
                if self.daw.play_state().playing {
                    dispatch::notify::peak_update(self);
                }
            }
            ConnectionState::Failed => {}
        }
    }

    fn tick_edit_feedback(&mut self) {
        let feedback = self.edit.tick();
        if let Some(on) = feedback.flash {
            let led = match self.edit.mode() {
                EditMode::Tempo => Cmd::TapTempo,
                _ => Cmd::Loop,
            };
            self.send_cc(led, u8::from(on));
        }
        if let Some(bits) = feedback.cycle {
            self.send_cc(Cmd::NavTracks, bits);
        }
    }

    /// Feed one raw inbound MIDI message through the framing layer into
    /// dispatch. Anything that does not frame is logged and dropped.
    pub fn on_midi(&mut self, bytes: &[u8]) {
        match bytes.first() {
            Some(&CC_STATUS) => match CcMessage::decode(bytes) {
                Some(msg) => self.on_command(msg.cmd, msg.value),
                None => {
                    log::debug!(target: "engine", "dropping unknown CC {:02x?}", bytes)
                }
            },
            Some(&0xf0) => match SysexMessage::decode(bytes) {
                Some(msg) => self.on_sysex(msg),
                None => {
                    log::debug!(target: "engine", "dropping malformed sysex ({} bytes)", bytes.len())
                }
            },
            _ => log::debug!(target: "engine", "ignoring non-protocol message {:02x?}", bytes),
        }
    }

    fn on_command(&mut self, cmd: Cmd, value: u8) {
        if cmd == Cmd::Hello {
            // Acknowledgement, possibly late or a re-announce after the
            // device side restarted. Renegotiate and resync either way.
            self.conn.on_hello_ack(value);
            self.caps = Caps::for_version(value);
            log::info!(target: "engine", "device connected, protocol version {}", value);
            dispatch::notify::bootstrap(self);
            return;
        }
        if !self.conn.is_connected() {
            log::debug!(target: "engine", "ignoring {:?} before handshake", cmd);
            return;
        }
        if self.edit.is_active() {
            dispatch::edit::dispatch(self, cmd, value);
        } else {
            dispatch::normal::dispatch(self, cmd, value);
        }
    }

    fn on_sysex(&mut self, msg: SysexMessage) {
        if !self.conn.is_connected() {
            return;
        }
        match msg.cmd {
            Cmd::SelectPlugin => {
                dispatch::normal::on_select_plugin(self, msg.value, &msg.payload)
            }
            Cmd::HiResParamDelta if self.caps.hires_params => {
                dispatch::normal::adjust_focused_param(self, msg.index as usize, msg.value, true)
            }
            other => {
                log::debug!(target: "engine", "ignoring inbound sysex {:?}", other)
            }
        }
    }

    // --- host notification entry points ---

    pub fn on_track_selected(&mut self, index: usize, selected: bool) {
        dispatch::notify::on_track_selected(self, index, selected);
    }

    pub fn on_track_list_changed(&mut self) {
        dispatch::notify::on_track_list_changed(self);
    }

    pub fn on_surface_volume(&mut self, index: usize) {
        dispatch::notify::on_surface_volume(self, index);
    }

    pub fn on_surface_pan(&mut self, index: usize) {
        dispatch::notify::on_surface_pan(self, index);
    }

    pub fn on_surface_mute(&mut self, index: usize, mute: bool) {
        dispatch::notify::on_surface_mute(self, index, mute);
    }

    pub fn on_surface_solo(&mut self, index: usize, solo: bool) {
        dispatch::notify::on_surface_solo(self, index, solo);
    }

    pub fn on_surface_rec_arm(&mut self, index: usize, armed: bool) {
        dispatch::notify::on_surface_rec_arm(self, index, armed);
    }

    pub fn on_play_state(&mut self, state: PlayState) {
        dispatch::notify::on_play_state(self, state);
    }

    pub fn on_repeat_state(&mut self, enabled: bool) {
        dispatch::notify::on_repeat_state(self, enabled);
    }

    pub fn on_fx_param_changed(&mut self, track: usize, fx: crate::daw::FxHandle, param: usize) {
        dispatch::notify::on_fx_param_changed(self, track, fx, param);
    }

    pub fn on_fx_list_changed(&mut self, track: usize) {
        dispatch::notify::on_fx_list_changed(self, track);
    }

    pub fn on_extended(&mut self, event: ExtendedEvent) {
        dispatch::notify::on_extended(self, event);
    }

    /// User-driven reconnect action: say goodbye if we can, release the
    /// port pair and start scanning again with a fresh handshake budget.
    pub fn request_reconnect(&mut self) {
        log::info!(target: "engine", "reconnect requested");
        if self.conn.is_connected() && self.link.is_open() {
            let bytes = CcMessage::new(Cmd::Goodbye, 0).encode();
            let _ = self.link.send(&bytes);
        }
        self.link.close();
        self.conn.request_reconnect();
        self.caps = Caps::none();
        self.mirror = MirrorCache::new();
        self.edit.exit();
        self.fx_focus = None;
        self.goodbye_sent = false;
    }

    /// Final teardown: one best-effort goodbye, then release the ports.
    /// Safe to call more than once; `Drop` goes through here too.
    pub fn shutdown(&mut self) {
        if self.goodbye_sent {
            return;
        }
        self.goodbye_sent = true;
        if self.link.is_open() {
            let bytes = CcMessage::new(Cmd::Goodbye, 0).encode();
            if let Err(e) = self.link.send(&bytes) {
                log::debug!(target: "engine", "goodbye not delivered: {}", e);
            }
        }
        self.link.close();
    }

    // --- outbound ---

    pub(crate) fn send_cc(&mut self, cmd: Cmd, value: u8) {
        let bytes = CcMessage::new(cmd, value).encode();
        self.send_bytes(&bytes);
    }

    pub(crate) fn send_sysex(&mut self, msg: SysexMessage) {
        let bytes = msg.encode();
        self.send_bytes(&bytes);
    }

    /// A failed write means the device vanished under us: release the port
    /// pair and park in `Failed` until an explicit reconnect.
    fn send_bytes(&mut self, bytes: &[u8]) {
        if let Err(e) = self.link.send(bytes) {
            log::warn!(target: "midi", "send failed, releasing device: {}", e);
            self.link.close();
            self.conn.fail();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
