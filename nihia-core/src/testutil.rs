//! Shared mocks for engine and dispatch tests: an in-memory DAW and a MIDI
//! link that records everything sent. Both are cheap `Rc<RefCell>` handles
//! so a test can keep inspecting them after moving a clone into the engine.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use nihia_proto::{CcMessage, Cmd, SysexMessage};

use crate::daw::{DawDriver, FxHandle, NavDirection, PlayState, TrackSnapshot};
use crate::midi::MidiLink;

#[derive(Debug, Clone)]
struct MockParam {
    name: String,
    value: f64,
    toggle: bool,
    settable: bool,
}

#[derive(Debug, Clone)]
struct MockFx {
    name: String,
    container: bool,
    children: Vec<FxHandle>,
    /// Base handle for children; child at position p gets `base + p * 0x10`,
    /// deliberately non-contiguous like real container addressing.
    child_base: FxHandle,
    params: Vec<MockParam>,
    preset: (usize, usize),
    preset_name: String,
}

impl MockFx {
    fn new(name: &str, container: bool, child_base: FxHandle) -> Self {
        Self {
            name: name.to_string(),
            container,
            children: Vec::new(),
            child_base,
            params: Vec::new(),
            preset: (0, 0),
            preset_name: String::new(),
        }
    }
}

#[derive(Default)]
struct DawInner {
    tracks: Vec<TrackSnapshot>,
    peaks: Vec<(f64, f64)>,
    play: PlayState,
    repeat: bool,
    metronome: bool,
    tempo: f64,
    automation: i32,
    calls: Vec<String>,
    fx: HashMap<(usize, FxHandle), MockFx>,
    top_level: Vec<Vec<FxHandle>>,
    next_child_base: FxHandle,
}

#[derive(Clone, Default)]
pub struct MockDaw(Rc<RefCell<DawInner>>);

impl MockDaw {
    pub fn with_tracks(count: usize) -> Self {
        let daw = MockDaw::default();
        {
            let mut inner = daw.0.borrow_mut();
            for i in 0..count {
                inner.tracks.push(TrackSnapshot {
                    index: i,
                    name: format!("Track {}", i),
                    volume: 1.0,
                    ..Default::default()
                });
            }
            inner.peaks = vec![(0.0, 0.0); count];
            inner.top_level = vec![Vec::new(); count];
            inner.tempo = 120.0;
            inner.automation = -1;
            inner.next_child_base = 0x100;
        }
        daw
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.0.borrow_mut().calls.clear();
    }

    pub fn snapshot(&self, index: usize) -> TrackSnapshot {
        self.0.borrow().tracks[index].clone()
    }

    pub fn set_mute(&self, index: usize, v: bool) {
        self.0.borrow_mut().tracks[index].mute = v;
    }

    pub fn set_solo(&self, index: usize, v: bool) {
        self.0.borrow_mut().tracks[index].solo = v;
    }

    pub fn set_selected_flag(&self, index: usize, v: bool) {
        self.0.borrow_mut().tracks[index].selected = v;
    }

    pub fn set_volume(&self, index: usize, gain: f64) {
        self.0.borrow_mut().tracks[index].volume = gain;
    }

    pub fn set_peak(&self, index: usize, left: f64, right: f64) {
        self.0.borrow_mut().peaks[index] = (left, right);
    }

    pub fn set_playing(&self, v: bool) {
        self.0.borrow_mut().play.playing = v;
    }

    pub fn metronome(&self) -> bool {
        self.0.borrow().metronome
    }

    pub fn set_metronome_flag(&self, v: bool) {
        self.0.borrow_mut().metronome = v;
    }

    pub fn tempo_value(&self) -> f64 {
        self.0.borrow().tempo
    }

    pub fn automation_mode(&self) -> i32 {
        self.0.borrow().automation
    }

    pub fn add_fx(&self, track: usize, name: &str) -> FxHandle {
        self.add_top_level(track, name, false)
    }

    pub fn add_container(&self, track: usize, name: &str) -> FxHandle {
        self.add_top_level(track, name, true)
    }

    fn add_top_level(&self, track: usize, name: &str, container: bool) -> FxHandle {
        let mut inner = self.0.borrow_mut();
        let handle = inner.top_level[track].len() as FxHandle;
        let base = if container {
            let b = inner.next_child_base;
            inner.next_child_base += 0x100;
            b
        } else {
            0
        };
        inner.top_level[track].push(handle);
        inner.fx.insert((track, handle), MockFx::new(name, container, base));
        handle
    }

    pub fn add_child(&self, track: usize, parent: FxHandle, name: &str) -> FxHandle {
        self.add_child_inner(track, parent, name, false)
    }

    pub fn add_child_container(&self, track: usize, parent: FxHandle, name: &str) -> FxHandle {
        self.add_child_inner(track, parent, name, true)
    }

    fn add_child_inner(&self, track: usize, parent: FxHandle, name: &str, container: bool) -> FxHandle {
        let mut inner = self.0.borrow_mut();
        let base = if container {
            let b = inner.next_child_base;
            inner.next_child_base += 0x100;
            b
        } else {
            0
        };
        let parent_fx = inner.fx.get_mut(&(track, parent)).expect("parent exists");
        let handle = parent_fx.child_base + parent_fx.children.len() as FxHandle * 0x10;
        parent_fx.children.push(handle);
        inner.fx.insert((track, handle), MockFx::new(name, container, base));
        handle
    }

    pub fn remove_top_level(&self, track: usize, handle: FxHandle) {
        let mut inner = self.0.borrow_mut();
        inner.top_level[track].retain(|&h| h != handle);
        inner.fx.remove(&(track, handle));
    }

    pub fn add_param(&self, track: usize, fx: FxHandle, name: &str, value: f64) -> usize {
        self.add_param_full(track, fx, name, value, false, true)
    }

    pub fn add_param_full(
        &self,
        track: usize,
        fx: FxHandle,
        name: &str,
        value: f64,
        toggle: bool,
        settable: bool,
    ) -> usize {
        let mut inner = self.0.borrow_mut();
        let fx = inner.fx.get_mut(&(track, fx)).expect("fx exists");
        fx.params.push(MockParam {
            name: name.to_string(),
            value,
            toggle,
            settable,
        });
        fx.params.len() - 1
    }

    pub fn set_preset(&self, track: usize, fx: FxHandle, index: usize, count: usize, name: &str) {
        let mut inner = self.0.borrow_mut();
        let fx = inner.fx.get_mut(&(track, fx)).expect("fx exists");
        fx.preset = (index, count);
        fx.preset_name = name.to_string();
    }
}

impl DawDriver for MockDaw {
    fn track_count(&self) -> usize {
        self.0.borrow().tracks.len()
    }

    fn track(&self, index: usize) -> Option<TrackSnapshot> {
        self.0.borrow().tracks.get(index).cloned()
    }

    fn select_only(&mut self, index: usize) {
        let mut inner = self.0.borrow_mut();
        for (i, t) in inner.tracks.iter_mut().enumerate() {
            t.selected = i == index;
        }
        inner.calls.push(format!("select_only {}", index));
    }

    fn toggle_mute(&mut self, index: usize) {
        let mut inner = self.0.borrow_mut();
        if let Some(t) = inner.tracks.get_mut(index) {
            t.mute = !t.mute;
        }
        inner.calls.push(format!("toggle_mute {}", index));
    }

    fn toggle_solo(&mut self, index: usize) {
        let mut inner = self.0.borrow_mut();
        if let Some(t) = inner.tracks.get_mut(index) {
            t.solo = !t.solo;
        }
        inner.calls.push(format!("toggle_solo {}", index));
    }

    fn toggle_arm(&mut self, index: usize) {
        let mut inner = self.0.borrow_mut();
        if let Some(t) = inner.tracks.get_mut(index) {
            t.armed = !t.armed;
        }
        inner.calls.push(format!("toggle_arm {}", index));
    }

    fn adjust_volume(&mut self, index: usize, delta: f64) {
        let mut inner = self.0.borrow_mut();
        if let Some(t) = inner.tracks.get_mut(index) {
            t.volume = (t.volume + delta).max(0.0);
        }
        inner.calls.push(format!("adjust_volume {} {:.6}", index, delta));
    }

    fn adjust_pan(&mut self, index: usize, delta: f64) {
        let mut inner = self.0.borrow_mut();
        if let Some(t) = inner.tracks.get_mut(index) {
            t.pan = (t.pan + delta).clamp(-1.0, 1.0);
        }
        inner.calls.push(format!("adjust_pan {} {:.6}", index, delta));
    }

    fn any_solo(&self) -> bool {
        self.0.borrow().tracks.iter().any(|t| t.solo)
    }

    fn peak(&self, index: usize, channel: u8) -> f64 {
        let inner = self.0.borrow();
        match inner.peaks.get(index) {
            Some(&(l, r)) => {
                if channel == 0 {
                    l
                } else {
                    r
                }
            }
            None => 0.0,
        }
    }

    fn play_state(&self) -> PlayState {
        self.0.borrow().play
    }

    fn play_pause(&mut self) {
        let mut inner = self.0.borrow_mut();
        inner.play.playing = !inner.play.playing;
        inner.calls.push("play_pause".into());
    }

    fn stop(&mut self) {
        let mut inner = self.0.borrow_mut();
        inner.play = PlayState::default();
        inner.calls.push("stop".into());
    }

    fn record(&mut self) {
        let mut inner = self.0.borrow_mut();
        inner.play.playing = true;
        inner.play.recording = true;
        inner.calls.push("record".into());
    }

    fn count_in_record(&mut self) {
        let mut inner = self.0.borrow_mut();
        inner.play.playing = true;
        inner.play.recording = true;
        inner.calls.push("count_in_record".into());
    }

    fn go_to_start(&mut self) {
        self.0.borrow_mut().calls.push("go_to_start".into());
    }

    fn toggle_repeat(&mut self) {
        let mut inner = self.0.borrow_mut();
        inner.repeat = !inner.repeat;
        inner.calls.push("toggle_repeat".into());
    }

    fn repeat_enabled(&self) -> bool {
        self.0.borrow().repeat
    }

    fn tap_tempo(&mut self) {
        self.0.borrow_mut().calls.push("tap_tempo".into());
    }

    fn tempo(&self) -> f64 {
        self.0.borrow().tempo
    }

    fn adjust_tempo(&mut self, delta_bpm: f64) {
        let mut inner = self.0.borrow_mut();
        inner.tempo += delta_bpm;
        inner.calls.push(format!("adjust_tempo {:.2}", delta_bpm));
    }

    fn undo(&mut self) {
        self.0.borrow_mut().calls.push("undo".into());
    }

    fn redo(&mut self) {
        self.0.borrow_mut().calls.push("redo".into());
    }

    fn quantize(&mut self) {
        self.0.borrow_mut().calls.push("quantize".into());
    }

    fn metronome_enabled(&self) -> bool {
        self.0.borrow().metronome
    }

    fn set_metronome(&mut self, enabled: bool) {
        let mut inner = self.0.borrow_mut();
        inner.metronome = enabled;
        inner.calls.push(format!("set_metronome {}", enabled));
    }

    fn toggle_metronome(&mut self) {
        let mut inner = self.0.borrow_mut();
        inner.metronome = !inner.metronome;
        inner.calls.push("toggle_metronome".into());
    }

    fn scrub(&mut self, amount: f64) {
        self.0.borrow_mut().calls.push(format!("scrub {:.1}", amount));
    }

    fn move_loop(&mut self, delta: i32) {
        self.0.borrow_mut().calls.push(format!("move_loop {}", delta));
    }

    fn resize_loop(&mut self, delta: i32) {
        self.0.borrow_mut().calls.push(format!("resize_loop {}", delta));
    }

    fn goto_marker(&mut self, direction: NavDirection) {
        self.0
            .borrow_mut()
            .calls
            .push(format!("goto_marker {:?}", direction));
    }

    fn goto_region(&mut self, direction: NavDirection) {
        self.0
            .borrow_mut()
            .calls
            .push(format!("goto_region {:?}", direction));
    }

    fn automation_override(&self) -> i32 {
        self.0.borrow().automation
    }

    fn set_automation_override(&mut self, mode: i32) {
        let mut inner = self.0.borrow_mut();
        inner.automation = mode;
        inner.calls.push(format!("set_automation_override {}", mode));
    }

    fn fx_count(&self, track: usize) -> usize {
        self.0
            .borrow()
            .top_level
            .get(track)
            .map_or(0, |v| v.len())
    }

    fn fx_name(&self, track: usize, fx: FxHandle) -> Option<String> {
        self.0.borrow().fx.get(&(track, fx)).map(|f| f.name.clone())
    }

    fn fx_is_container(&self, track: usize, fx: FxHandle) -> bool {
        self.0
            .borrow()
            .fx
            .get(&(track, fx))
            .is_some_and(|f| f.container)
    }

    fn fx_child_count(&self, track: usize, fx: FxHandle) -> usize {
        self.0
            .borrow()
            .fx
            .get(&(track, fx))
            .map_or(0, |f| f.children.len())
    }

    fn fx_child(&self, track: usize, fx: FxHandle, position: usize) -> Option<FxHandle> {
        self.0
            .borrow()
            .fx
            .get(&(track, fx))
            .and_then(|f| f.children.get(position).copied())
    }

    fn param_count(&self, track: usize, fx: FxHandle) -> usize {
        self.0
            .borrow()
            .fx
            .get(&(track, fx))
            .map_or(0, |f| f.params.len())
    }

    fn param_name(&self, track: usize, fx: FxHandle, param: usize) -> Option<String> {
        self.0
            .borrow()
            .fx
            .get(&(track, fx))
            .and_then(|f| f.params.get(param))
            .map(|p| p.name.clone())
    }

    fn param_value_text(&self, track: usize, fx: FxHandle, param: usize) -> Option<String> {
        self.0
            .borrow()
            .fx
            .get(&(track, fx))
            .and_then(|f| f.params.get(param))
            .map(|p| format!("{:.2}", p.value))
    }

    fn param_value(&self, track: usize, fx: FxHandle, param: usize) -> Option<f64> {
        self.0
            .borrow()
            .fx
            .get(&(track, fx))
            .and_then(|f| f.params.get(param))
            .map(|p| p.value)
    }

    fn set_param_value(
        &mut self,
        track: usize,
        fx: FxHandle,
        param: usize,
        value: f64,
    ) -> Option<f64> {
        let mut inner = self.0.borrow_mut();
        let p = inner
            .fx
            .get_mut(&(track, fx))
            .and_then(|f| f.params.get_mut(param))?;
        if p.settable {
            p.value = value.clamp(0.0, 1.0);
        }
        let back = p.value;
        inner
            .calls
            .push(format!("set_param {} {} {:.3}", fx, param, value));
        Some(back)
    }

    fn param_is_toggle(&self, track: usize, fx: FxHandle, param: usize) -> bool {
        self.0
            .borrow()
            .fx
            .get(&(track, fx))
            .and_then(|f| f.params.get(param))
            .is_some_and(|p| p.toggle)
    }

    fn preset_index(&self, track: usize, fx: FxHandle) -> Option<(usize, usize)> {
        let inner = self.0.borrow();
        let f = inner.fx.get(&(track, fx))?;
        if f.preset.1 == 0 {
            None
        } else {
            Some(f.preset)
        }
    }

    fn preset_name(&self, track: usize, fx: FxHandle) -> Option<String> {
        let inner = self.0.borrow();
        let f = inner.fx.get(&(track, fx))?;
        if f.preset_name.is_empty() {
            None
        } else {
            Some(f.preset_name.clone())
        }
    }

    fn navigate_preset(&mut self, track: usize, fx: FxHandle, direction: NavDirection) {
        let _ = track;
        self.0
            .borrow_mut()
            .calls
            .push(format!("navigate_preset {} {:?}", fx, direction));
    }
}

#[derive(Default)]
struct LinkInner {
    available: bool,
    open: bool,
    fail_sends: bool,
    sent: Vec<Vec<u8>>,
    inbound: VecDeque<Vec<u8>>,
}

#[derive(Clone, Default)]
pub struct MockLink(Rc<RefCell<LinkInner>>);

impl MockLink {
    pub fn available() -> Self {
        let link = MockLink::default();
        link.0.borrow_mut().available = true;
        link
    }

    pub fn set_available(&self, v: bool) {
        self.0.borrow_mut().available = v;
    }

    pub fn set_fail_sends(&self, v: bool) {
        self.0.borrow_mut().fail_sends = v;
    }

    pub fn push_inbound(&self, bytes: Vec<u8>) {
        self.0.borrow_mut().inbound.push_back(bytes);
    }

    pub fn push_cc(&self, cmd: Cmd, value: u8) {
        self.push_inbound(CcMessage::new(cmd, value).encode().to_vec());
    }

    /// Re-open the port without going through `connect`, for tests that
    /// simulate traffic arriving on a link the engine already gave up on.
    pub fn force_open(&self) {
        self.0.borrow_mut().open = true;
    }

    pub fn is_port_open(&self) -> bool {
        self.0.borrow().open
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0.borrow().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.0.borrow_mut().sent.clear();
    }

    /// All sent CC messages, decoded, in order.
    pub fn sent_ccs(&self) -> Vec<(Cmd, u8)> {
        self.0
            .borrow()
            .sent
            .iter()
            .filter_map(|b| CcMessage::decode(b))
            .map(|m| (m.cmd, m.value))
            .collect()
    }

    /// All sent SysEx messages, decoded, in order.
    pub fn sent_sysex(&self) -> Vec<SysexMessage> {
        self.0
            .borrow()
            .sent
            .iter()
            .filter_map(|b| SysexMessage::decode(b))
            .collect()
    }

    pub fn count_cc(&self, cmd: Cmd) -> usize {
        self.sent_ccs().iter().filter(|(c, _)| *c == cmd).count()
    }

    pub fn count_sysex(&self, cmd: Cmd) -> usize {
        self.sent_sysex().iter().filter(|m| m.cmd == cmd).count()
    }
}

impl MidiLink for MockLink {
    fn connect(&mut self) -> Result<(), String> {
        let mut inner = self.0.borrow_mut();
        if inner.available {
            inner.open = true;
            Ok(())
        } else {
            Err("device not present".to_string())
        }
    }

    fn is_open(&self) -> bool {
        self.0.borrow().open
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), String> {
        let mut inner = self.0.borrow_mut();
        if !inner.open {
            return Err("port closed".to_string());
        }
        if inner.fail_sends {
            return Err("device vanished".to_string());
        }
        inner.sent.push(bytes.to_vec());
        Ok(())
    }

    fn drain(&mut self) -> Vec<Vec<u8>> {
        self.0.borrow_mut().inbound.drain(..).collect()
    }

    fn close(&mut self) {
        self.0.borrow_mut().open = false;
    }
}

/// Drive a fresh engine through scan, handshake and acknowledgement, then
/// clear the captured traffic so tests start from a quiet connected state.
pub fn connect_engine(daw: &MockDaw, link: &MockLink, version: u8) -> crate::engine::Engine {
    let mut engine = crate::engine::Engine::new(
        Box::new(daw.clone()),
        Box::new(link.clone()),
        crate::engine::EngineSettings::default(),
    );
    engine.tick(); // scan -> handshake pending
    engine.tick(); // first hello
    link.push_cc(Cmd::Hello, version);
    engine.tick(); // ack -> connected + bootstrap
    link.clear_sent();
    daw.clear_calls();
    engine
}
