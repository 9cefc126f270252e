//! The seam to the host DAW.
//!
//! The engine never holds a track or FX reference across a tick in which the
//! underlying list could have changed; everything here is addressed by
//! ordinal index (tracks), or by an opaque FX handle re-resolved from the
//! container tree each time. Implementations live in the host integration;
//! tests use a mock.

/// Opaque FX handle as issued by the host. Container children are not
/// contiguous from zero in the general case (see `state::fx_tree`).
pub type FxHandle = i32;

/// Everything the engine reads about one track, captured at call time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSnapshot {
    pub index: usize,
    pub name: String,
    pub mute: bool,
    pub solo: bool,
    pub armed: bool,
    /// Linear gain.
    pub volume: f64,
    /// Pan in [-1, 1].
    pub pan: f64,
    pub selected: bool,
}

/// Host transport state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayState {
    pub playing: bool,
    pub paused: bool,
    pub recording: bool,
}

/// Direction for marker/region/preset navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Previous,
    Next,
}

impl NavDirection {
    pub fn from_delta(delta: i8) -> Self {
        if delta < 0 {
            NavDirection::Previous
        } else {
            NavDirection::Next
        }
    }
}

/// Out-of-band host events forwarded through `Engine::on_extended`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtendedEvent {
    MetronomeChanged(bool),
    TempoChanged(f64),
    PlayRateChanged(f64),
}

/// Host driver interface. Mutating calls are fire-and-forget; queries are
/// cheap and safe to repeat every tick. A vanished track or FX is the
/// implementation's problem to absorb (treat as no-op), never to panic on.
pub trait DawDriver {
    // --- project / tracks ---
    fn track_count(&self) -> usize;
    fn track(&self, index: usize) -> Option<TrackSnapshot>;
    /// Clear the selection and select exactly this track.
    fn select_only(&mut self, index: usize);
    fn toggle_mute(&mut self, index: usize);
    fn toggle_solo(&mut self, index: usize);
    fn toggle_arm(&mut self, index: usize);
    /// Add a linear-gain delta to the track volume.
    fn adjust_volume(&mut self, index: usize, delta: f64);
    /// Add a pan delta in [-1, 1] units.
    fn adjust_pan(&mut self, index: usize, delta: f64);
    /// Whether any track in the project is currently soloed.
    fn any_solo(&self) -> bool;
    /// Current peak amplitude of one channel (0 = left, 1 = right).
    fn peak(&self, index: usize, channel: u8) -> f64;

    // --- transport ---
    fn play_state(&self) -> PlayState;
    /// Toggle between play and pause.
    fn play_pause(&mut self);
    fn stop(&mut self);
    fn record(&mut self);
    /// Start recording with the host's count-in pre-roll.
    fn count_in_record(&mut self);
    fn go_to_start(&mut self);
    fn toggle_repeat(&mut self);
    fn repeat_enabled(&self) -> bool;
    fn tap_tempo(&mut self);
    fn tempo(&self) -> f64;
    fn adjust_tempo(&mut self, delta_bpm: f64);
    fn undo(&mut self);
    fn redo(&mut self);
    fn quantize(&mut self);
    /// Metronome enabled bit of the host's click-source config value (the
    /// same integer carries the count-in flags).
    fn metronome_enabled(&self) -> bool;
    fn set_metronome(&mut self, enabled: bool);
    fn toggle_metronome(&mut self);
    /// Move the edit cursor by a scrub amount (signed, host units).
    fn scrub(&mut self, amount: f64);
    /// Shift the whole loop region by one unit.
    fn move_loop(&mut self, delta: i32);
    /// Grow or shrink the loop region by one unit at its end.
    fn resize_loop(&mut self, delta: i32);
    fn goto_marker(&mut self, direction: NavDirection);
    fn goto_region(&mut self, direction: NavDirection);
    /// Global automation override mode; -1 means no override.
    fn automation_override(&self) -> i32;
    fn set_automation_override(&mut self, mode: i32);

    // --- FX surface of one track ---
    /// Number of top-level FX slots on the track.
    fn fx_count(&self, track: usize) -> usize;
    fn fx_name(&self, track: usize, fx: FxHandle) -> Option<String>;
    fn fx_is_container(&self, track: usize, fx: FxHandle) -> bool;
    fn fx_child_count(&self, track: usize, fx: FxHandle) -> usize;
    /// Handle of the child at a 0-based position inside a container.
    fn fx_child(&self, track: usize, fx: FxHandle, position: usize) -> Option<FxHandle>;
    fn param_count(&self, track: usize, fx: FxHandle) -> usize;
    fn param_name(&self, track: usize, fx: FxHandle, param: usize) -> Option<String>;
    fn param_value_text(&self, track: usize, fx: FxHandle, param: usize) -> Option<String>;
    /// Normalized parameter value in [0, 1].
    fn param_value(&self, track: usize, fx: FxHandle, param: usize) -> Option<f64>;
    /// Write a normalized value; returns the value read back, which may
    /// differ for stepped or fixed-function parameters.
    fn set_param_value(&mut self, track: usize, fx: FxHandle, param: usize, value: f64)
        -> Option<f64>;
    /// Whether the parameter is a two-state toggle per the host's step query.
    fn param_is_toggle(&self, track: usize, fx: FxHandle, param: usize) -> bool;
    /// (current index, count) of the FX preset list.
    fn preset_index(&self, track: usize, fx: FxHandle) -> Option<(usize, usize)>;
    fn preset_name(&self, track: usize, fx: FxHandle) -> Option<String>;
    fn navigate_preset(&mut self, track: usize, fx: FxHandle, direction: NavDirection);
}
