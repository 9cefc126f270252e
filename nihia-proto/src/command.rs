//! The command byte space of the keyboard protocol.
//!
//! Every CC and SysEx message carries one of these command bytes. The set is
//! closed: bytes outside it decode to `None` and are ignored by the engine,
//! which is how newer firmware stays compatible with an older bridge.

/// Raw command bytes. Kept as constants so the `Cmd` mapping below reads
/// like the protocol table it mirrors.
mod raw {
    pub const HELLO: u8 = 0x01;
    pub const GOODBYE: u8 = 0x02;
    pub const CONFIG_CHANGED: u8 = 0x03;

    pub const PLAY: u8 = 0x10;
    pub const RESTART: u8 = 0x11;
    pub const RECORD: u8 = 0x12;
    pub const COUNT_IN: u8 = 0x13;
    pub const STOP: u8 = 0x14;
    pub const CLEAR: u8 = 0x15;
    pub const LOOP: u8 = 0x16;
    pub const METRO: u8 = 0x17;
    pub const TAP_TEMPO: u8 = 0x18;

    pub const UNDO: u8 = 0x20;
    pub const REDO: u8 = 0x21;
    pub const QUANTIZE: u8 = 0x22;
    pub const AUTOMATION: u8 = 0x23;

    pub const NAV_TRACKS: u8 = 0x30;
    pub const NAV_BANKS: u8 = 0x31;
    pub const NAV_CLIPS: u8 = 0x32;
    pub const NAV_SCENES: u8 = 0x33;
    pub const MOVE_TRANSPORT: u8 = 0x34;
    pub const MOVE_LOOP: u8 = 0x35;
    pub const NAV_PRESETS: u8 = 0x36;

    pub const TRACK_AVAIL: u8 = 0x40;
    pub const SEL_TRACK_PARAMS_CHANGED: u8 = 0x41;
    pub const TRACK_SELECTED: u8 = 0x42;
    pub const TRACK_MUTED: u8 = 0x43;
    pub const TRACK_SOLOED: u8 = 0x44;
    pub const TRACK_ARMED: u8 = 0x45;
    pub const TRACK_VOLUME_TEXT: u8 = 0x46;
    pub const TRACK_PAN_TEXT: u8 = 0x47;
    pub const TRACK_NAME: u8 = 0x48;
    pub const TRACK_VU: u8 = 0x49;
    pub const TRACK_MUTED_BY_SOLO: u8 = 0x4a;

    pub const KNOB_VOLUME_BASE: u8 = 0x50; // 0x50..=0x57, one per slot
    pub const KNOB_PAN_BASE: u8 = 0x58; // 0x58..=0x5f, one per slot

    pub const CHANGE_SEL_TRACK_VOLUME: u8 = 0x64;
    pub const CHANGE_SEL_TRACK_PAN: u8 = 0x65;
    pub const TOGGLE_SEL_TRACK_MUTE: u8 = 0x66;
    pub const TOGGLE_SEL_TRACK_SOLO: u8 = 0x67;
    pub const SEL_TRACK_AVAIL: u8 = 0x68;
    pub const SEL_TRACK_MUTED: u8 = 0x69;
    pub const SEL_TRACK_SOLOED: u8 = 0x6a;
    pub const SEL_TRACK_MUTED_BY_SOLO: u8 = 0x6b;

    pub const SELECT_PLUGIN: u8 = 0x70;
    pub const PLUGIN_NAME: u8 = 0x71;
    pub const PARAM_NAME: u8 = 0x72;
    pub const PARAM_VALUE_TEXT: u8 = 0x73;
    pub const PARAM_VALUE: u8 = 0x74;
    pub const PLUGIN_PAGE: u8 = 0x75;
    pub const PARAM_SECTION: u8 = 0x76;
    pub const PRESET_NAME: u8 = 0x77;
    pub const HIRES_PARAM_DELTA: u8 = 0x78;
}

use crate::BANK_SLOTS;

/// One protocol command. Knob commands carry their 0-based bank slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmd {
    // Session
    Hello,
    Goodbye,
    ConfigChanged,
    // Transport
    Play,
    Restart,
    Record,
    CountIn,
    Stop,
    Clear,
    Loop,
    Metro,
    TapTempo,
    Undo,
    Redo,
    Quantize,
    Automation,
    // Navigation
    NavTracks,
    NavBanks,
    NavClips,
    NavScenes,
    MoveTransport,
    MoveLoop,
    NavPresets,
    // Track mirror
    TrackAvail,
    SelTrackParamsChanged,
    TrackSelected,
    TrackMuted,
    TrackSoloed,
    TrackArmed,
    TrackVolumeText,
    TrackPanText,
    TrackName,
    TrackVu,
    TrackMutedBySolo,
    // Per-slot knobs
    KnobVolume(u8),
    KnobPan(u8),
    // Selected-track shortcuts
    ChangeSelTrackVolume,
    ChangeSelTrackPan,
    ToggleSelTrackMute,
    ToggleSelTrackSolo,
    SelTrackAvail,
    SelTrackMuted,
    SelTrackSoloed,
    SelTrackMutedBySolo,
    // Plugin / FX
    SelectPlugin,
    PluginName,
    ParamName,
    ParamValueText,
    ParamValue,
    PluginPage,
    ParamSection,
    PresetName,
    HiResParamDelta,
}

impl Cmd {
    /// Decode a raw command byte. Unknown bytes return `None`; the engine
    /// logs and drops them rather than failing.
    pub fn from_raw(byte: u8) -> Option<Cmd> {
        use raw::*;
        let cmd = match byte {
            HELLO => Cmd::Hello,
            GOODBYE => Cmd::Goodbye,
            CONFIG_CHANGED => Cmd::ConfigChanged,
            PLAY => Cmd::Play,
            RESTART => Cmd::Restart,
            RECORD => Cmd::Record,
            COUNT_IN => Cmd::CountIn,
            STOP => Cmd::Stop,
            CLEAR => Cmd::Clear,
            LOOP => Cmd::Loop,
            METRO => Cmd::Metro,
            TAP_TEMPO => Cmd::TapTempo,
            UNDO => Cmd::Undo,
            REDO => Cmd::Redo,
            QUANTIZE => Cmd::Quantize,
            AUTOMATION => Cmd::Automation,
            NAV_TRACKS => Cmd::NavTracks,
            NAV_BANKS => Cmd::NavBanks,
            NAV_CLIPS => Cmd::NavClips,
            NAV_SCENES => Cmd::NavScenes,
            MOVE_TRANSPORT => Cmd::MoveTransport,
            MOVE_LOOP => Cmd::MoveLoop,
            NAV_PRESETS => Cmd::NavPresets,
            TRACK_AVAIL => Cmd::TrackAvail,
            SEL_TRACK_PARAMS_CHANGED => Cmd::SelTrackParamsChanged,
            TRACK_SELECTED => Cmd::TrackSelected,
            TRACK_MUTED => Cmd::TrackMuted,
            TRACK_SOLOED => Cmd::TrackSoloed,
            TRACK_ARMED => Cmd::TrackArmed,
            TRACK_VOLUME_TEXT => Cmd::TrackVolumeText,
            TRACK_PAN_TEXT => Cmd::TrackPanText,
            TRACK_NAME => Cmd::TrackName,
            TRACK_VU => Cmd::TrackVu,
            TRACK_MUTED_BY_SOLO => Cmd::TrackMutedBySolo,
            CHANGE_SEL_TRACK_VOLUME => Cmd::ChangeSelTrackVolume,
            CHANGE_SEL_TRACK_PAN => Cmd::ChangeSelTrackPan,
            TOGGLE_SEL_TRACK_MUTE => Cmd::ToggleSelTrackMute,
            TOGGLE_SEL_TRACK_SOLO => Cmd::ToggleSelTrackSolo,
            SEL_TRACK_AVAIL => Cmd::SelTrackAvail,
            SEL_TRACK_MUTED => Cmd::SelTrackMuted,
            SEL_TRACK_SOLOED => Cmd::SelTrackSoloed,
            SEL_TRACK_MUTED_BY_SOLO => Cmd::SelTrackMutedBySolo,
            SELECT_PLUGIN => Cmd::SelectPlugin,
            PLUGIN_NAME => Cmd::PluginName,
            PARAM_NAME => Cmd::ParamName,
            PARAM_VALUE_TEXT => Cmd::ParamValueText,
            PARAM_VALUE => Cmd::ParamValue,
            PLUGIN_PAGE => Cmd::PluginPage,
            PARAM_SECTION => Cmd::ParamSection,
            PRESET_NAME => Cmd::PresetName,
            HIRES_PARAM_DELTA => Cmd::HiResParamDelta,
            b if (KNOB_VOLUME_BASE..KNOB_VOLUME_BASE + BANK_SLOTS as u8).contains(&b) => {
                Cmd::KnobVolume(b - KNOB_VOLUME_BASE)
            }
            b if (KNOB_PAN_BASE..KNOB_PAN_BASE + BANK_SLOTS as u8).contains(&b) => {
                Cmd::KnobPan(b - KNOB_PAN_BASE)
            }
            _ => return None,
        };
        Some(cmd)
    }

    pub fn raw(self) -> u8 {
        use raw::*;
        match self {
            Cmd::Hello => HELLO,
            Cmd::Goodbye => GOODBYE,
            Cmd::ConfigChanged => CONFIG_CHANGED,
            Cmd::Play => PLAY,
            Cmd::Restart => RESTART,
            Cmd::Record => RECORD,
            Cmd::CountIn => COUNT_IN,
            Cmd::Stop => STOP,
            Cmd::Clear => CLEAR,
            Cmd::Loop => LOOP,
            Cmd::Metro => METRO,
            Cmd::TapTempo => TAP_TEMPO,
            Cmd::Undo => UNDO,
            Cmd::Redo => REDO,
            Cmd::Quantize => QUANTIZE,
            Cmd::Automation => AUTOMATION,
            Cmd::NavTracks => NAV_TRACKS,
            Cmd::NavBanks => NAV_BANKS,
            Cmd::NavClips => NAV_CLIPS,
            Cmd::NavScenes => NAV_SCENES,
            Cmd::MoveTransport => MOVE_TRANSPORT,
            Cmd::MoveLoop => MOVE_LOOP,
            Cmd::NavPresets => NAV_PRESETS,
            Cmd::TrackAvail => TRACK_AVAIL,
            Cmd::SelTrackParamsChanged => SEL_TRACK_PARAMS_CHANGED,
            Cmd::TrackSelected => TRACK_SELECTED,
            Cmd::TrackMuted => TRACK_MUTED,
            Cmd::TrackSoloed => TRACK_SOLOED,
            Cmd::TrackArmed => TRACK_ARMED,
            Cmd::TrackVolumeText => TRACK_VOLUME_TEXT,
            Cmd::TrackPanText => TRACK_PAN_TEXT,
            Cmd::TrackName => TRACK_NAME,
            Cmd::TrackVu => TRACK_VU,
            Cmd::TrackMutedBySolo => TRACK_MUTED_BY_SOLO,
            Cmd::KnobVolume(slot) => KNOB_VOLUME_BASE + (slot % BANK_SLOTS as u8),
            Cmd::KnobPan(slot) => KNOB_PAN_BASE + (slot % BANK_SLOTS as u8),
            Cmd::ChangeSelTrackVolume => CHANGE_SEL_TRACK_VOLUME,
            Cmd::ChangeSelTrackPan => CHANGE_SEL_TRACK_PAN,
            Cmd::ToggleSelTrackMute => TOGGLE_SEL_TRACK_MUTE,
            Cmd::ToggleSelTrackSolo => TOGGLE_SEL_TRACK_SOLO,
            Cmd::SelTrackAvail => SEL_TRACK_AVAIL,
            Cmd::SelTrackMuted => SEL_TRACK_MUTED,
            Cmd::SelTrackSoloed => SEL_TRACK_SOLOED,
            Cmd::SelTrackMutedBySolo => SEL_TRACK_MUTED_BY_SOLO,
            Cmd::SelectPlugin => SELECT_PLUGIN,
            Cmd::PluginName => PLUGIN_NAME,
            Cmd::ParamName => PARAM_NAME,
            Cmd::ParamValueText => PARAM_VALUE_TEXT,
            Cmd::ParamValue => PARAM_VALUE,
            Cmd::PluginPage => PLUGIN_PAGE,
            Cmd::ParamSection => PARAM_SECTION,
            Cmd::PresetName => PRESET_NAME,
            Cmd::HiResParamDelta => HIRES_PARAM_DELTA,
        }
    }

    /// The bank slot addressed by a knob command, if this is one.
    pub fn knob_slot(self) -> Option<u8> {
        match self {
            Cmd::KnobVolume(slot) | Cmd::KnobPan(slot) => Some(slot),
            _ => None,
        }
    }
}
