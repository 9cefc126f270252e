//! The extended-edit input mode layered over normal dispatch.
//!
//! A chord arms the mode; from `Armed`, most buttons fire one action and
//! drop back to `Off`, while the loop and tempo buttons enter a submode.
//! Submodes repurpose the navigation controls and run two cooperative
//! timers: a flash for the submode's own LED and a cycle stepping the
//! 4-direction indicator. Submodes never time out on their own.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Off,
    Armed,
    Loop,
    Tempo,
}

/// Ticks between LED flash flips (engine ticks, not wall clock).
pub const FLASH_PERIOD_TICKS: u32 = 8;

/// Ticks between 4-direction indicator steps.
pub const CYCLE_PERIOD_TICKS: u32 = 12;

/// Direction bits cycled on the 4D encoder indicator: up, right, down, left.
pub const CYCLE_PATTERN: [u8; 4] = [0x01, 0x02, 0x04, 0x08];

/// A fixed-period timer advanced once per engine tick.
#[derive(Debug, Clone, Copy)]
pub struct TickTimer {
    period: u32,
    elapsed: u32,
}

impl TickTimer {
    pub fn new(period: u32) -> Self {
        assert!(period > 0);
        Self { period, elapsed: 0 }
    }

    /// Advance one tick; true when the period elapsed this tick.
    pub fn advance(&mut self) -> bool {
        self.elapsed += 1;
        if self.elapsed >= self.period {
            self.elapsed = 0;
            true
        } else {
            false
        }
    }

    pub fn restart(&mut self) {
        self.elapsed = 0;
    }
}

/// LED changes produced by one submode tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditFeedback {
    /// New on/off state for the submode's own LED, when it flipped.
    pub flash: Option<bool>,
    /// New 4-direction indicator bits, when the cycle stepped.
    pub cycle: Option<u8>,
}

#[derive(Debug)]
pub struct EditController {
    mode: EditMode,
    flash: TickTimer,
    cycle: TickTimer,
    flash_on: bool,
    cycle_step: usize,
}

impl Default for EditController {
    fn default() -> Self {
        Self {
            mode: EditMode::Off,
            flash: TickTimer::new(FLASH_PERIOD_TICKS),
            cycle: TickTimer::new(CYCLE_PERIOD_TICKS),
            flash_on: false,
            cycle_step: 0,
        }
    }
}

impl EditController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode != EditMode::Off
    }

    pub fn arm(&mut self) {
        self.mode = EditMode::Armed;
    }

    /// Enter a submode; timers restart so the first flash lands a full
    /// period after entry.
    pub fn enter(&mut self, mode: EditMode) {
        debug_assert!(matches!(mode, EditMode::Loop | EditMode::Tempo));
        self.mode = mode;
        self.flash.restart();
        self.cycle.restart();
        self.flash_on = true;
        self.cycle_step = 0;
    }

    /// Leave edit mode entirely. The caller re-derives all lights from live
    /// host state afterwards; nothing is snapshotted here.
    pub fn exit(&mut self) {
        self.mode = EditMode::Off;
    }

    /// Advance the feedback timers. Only meaningful inside a submode.
    pub fn tick(&mut self) -> EditFeedback {
        let mut feedback = EditFeedback::default();
        if !matches!(self.mode, EditMode::Loop | EditMode::Tempo) {
            return feedback;
        }
        if self.flash.advance() {
            self.flash_on = !self.flash_on;
            feedback.flash = Some(self.flash_on);
        }
        if self.cycle.advance() {
            self.cycle_step = (self.cycle_step + 1) % CYCLE_PATTERN.len();
            feedback.cycle = Some(CYCLE_PATTERN[self.cycle_step]);
        }
        feedback
    }
}
