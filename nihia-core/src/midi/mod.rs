//! MIDI transport behind the engine.
//!
//! The engine talks to a [`MidiLink`]; the real implementation opens the
//! keyboard's dedicated DAW port pair through midir and queues inbound
//! messages on a channel, so the engine can drain them on its own tick
//! instead of reacting inside the MIDI callback thread.

use crossbeam_channel::{unbounded, Receiver, Sender};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

/// Port-name suffixes of the dedicated DAW ports across device generations
/// and platforms. The client port name varies with the driver; the suffix is
/// stable.
pub const DAW_PORT_SUFFIXES: &[&str] = &[
    "Komplete Kontrol DAW - 1",
    "Komplete Kontrol A DAW",
    "Komplete Kontrol M DAW",
    "KONTROL S49 MK3 - DAW",
    "KONTROL S61 MK3 - DAW",
    "KONTROL S88 MK3 - DAW",
];

/// One bidirectional device link. `connect` is polled while scanning, so a
/// missing device is an `Err`, not a panic.
pub trait MidiLink {
    fn connect(&mut self) -> Result<(), String>;
    fn is_open(&self) -> bool;
    fn send(&mut self, bytes: &[u8]) -> Result<(), String>;
    /// All messages received since the last drain, oldest first.
    fn drain(&mut self) -> Vec<Vec<u8>>;
    fn close(&mut self);
}

pub struct MidirLink {
    extra_suffixes: Vec<String>,
    input: Option<MidiInputConnection<Sender<Vec<u8>>>>,
    output: Option<MidiOutputConnection>,
    rx: Option<Receiver<Vec<u8>>>,
    port_name: Option<String>,
}

impl MidirLink {
    pub fn new(extra_suffixes: Vec<String>) -> Self {
        Self {
            extra_suffixes,
            input: None,
            output: None,
            rx: None,
            port_name: None,
        }
    }

    /// Name of the port pair currently open, for logging.
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    fn matches(&self, name: &str) -> bool {
        DAW_PORT_SUFFIXES.iter().any(|s| name.ends_with(s))
            || self.extra_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}

impl MidiLink for MidirLink {
    fn connect(&mut self) -> Result<(), String> {
        if self.is_open() {
            return Ok(());
        }
        self.close();

        let midi_in = MidiInput::new("nihia-bridge").map_err(|e| e.to_string())?;
        let midi_out = MidiOutput::new("nihia-bridge").map_err(|e| e.to_string())?;

        let in_port = midi_in
            .ports()
            .into_iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .map(|n| self.matches(&n))
                    .unwrap_or(false)
            })
            .ok_or_else(|| "no DAW input port present".to_string())?;
        let out_port = midi_out
            .ports()
            .into_iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .map(|n| self.matches(&n))
                    .unwrap_or(false)
            })
            .ok_or_else(|| "no DAW output port present".to_string())?;

        let name = midi_in.port_name(&in_port).map_err(|e| e.to_string())?;
        let (tx, rx) = unbounded();
        let input = midi_in
            .connect(
                &in_port,
                "nihia-bridge-in",
                |_stamp, bytes, tx: &mut Sender<Vec<u8>>| {
                    let _ = tx.send(bytes.to_vec());
                },
                tx,
            )
            .map_err(|e| e.to_string())?;
        let output = midi_out
            .connect(&out_port, "nihia-bridge-out")
            .map_err(|e| e.to_string())?;

        log::info!(target: "midi", "opened DAW port pair '{}'", name);
        self.input = Some(input);
        self.output = Some(output);
        self.rx = Some(rx);
        self.port_name = Some(name);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.output.is_some()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), String> {
        let out = self
            .output
            .as_mut()
            .ok_or_else(|| "no device open".to_string())?;
        out.send(bytes).map_err(|e| e.to_string())
    }

    fn drain(&mut self) -> Vec<Vec<u8>> {
        match &self.rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        }
    }

    fn close(&mut self) {
        if let Some(conn) = self.input.take() {
            let _ = conn.close();
        }
        if let Some(conn) = self.output.take() {
            let _ = conn.close();
        }
        self.rx = None;
        if let Some(name) = self.port_name.take() {
            log::info!(target: "midi", "closed DAW port pair '{}'", name);
        }
    }
}
