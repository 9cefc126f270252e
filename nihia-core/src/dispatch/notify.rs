//! Host notifications turned into outbound mirror traffic.
//!
//! Everything here funnels through the mirror cache: a callback that does
//! not change what the device last heard sends nothing. The refresh paths
//! invalidate the cache first, which is what makes them unconditional.

use nihia_proto::{codec, meter_level, Cmd, SysexMessage, BANK_SLOTS};

use crate::daw::{ExtendedEvent, FxHandle, PlayState, TrackSnapshot};
use crate::engine::Engine;
use crate::state::{Bank, EditMode, FxTree, MirrorCache};

/// Peak amplitudes below this render as a dark meter. A zero byte would
/// terminate the VU array on the device, so the floor code is 1.
const MIN_AUDIBLE_PEAK: f64 = 2.98e-8;

fn volume_text(gain: f64) -> String {
    if gain <= 0.0 {
        "-inf dB".to_string()
    } else {
        format!("{:+.1} dB", 20.0 * gain.log10())
    }
}

fn pan_text(pan: f64) -> String {
    let percent = (pan.abs() * 100.0 + 0.5) as i32;
    if percent == 0 {
        "center".to_string()
    } else if pan < 0.0 {
        format!("{}%L", percent)
    } else {
        format!("{}%R", percent)
    }
}

fn param_cc(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 127.0 + 0.5) as u8
}

/// Hello acknowledged: announce our capabilities, then paint the whole
/// surface from live host state.
pub(crate) fn bootstrap(engine: &mut Engine) {
    let version = engine.conn.protocol_version();
    engine.send_cc(Cmd::ConfigChanged, version);

    engine.mirror = MirrorCache::new();
    engine.edit.exit();
    engine.fx_focus = None;

    let count = engine.daw.track_count();
    let focused = (0..count).find(|&i| engine.daw.track(i).is_some_and(|t| t.selected));
    engine.mirror.focused_track = focused;
    if let Some(index) = focused {
        engine.track_bank.select_page(index);
    }
    refresh_full_page(engine);

    if let Some(index) = focused {
        let name = engine.daw.track(index).map(|t| t.name).unwrap_or_default();
        engine.send_sysex(SysexMessage::text(Cmd::SelTrackParamsChanged, 0, 0, &name));
        send_selected_track_state(engine, index);
    }

    let play = engine.daw.play_state();
    on_play_state(engine, play);
    let repeat = engine.daw.repeat_enabled();
    on_repeat_state(engine, repeat);
    let metro = engine.daw.metronome_enabled();
    engine.send_cc(Cmd::Metro, u8::from(metro));
}

/// Repaint every visible slot plus the navigation lights, in slot order.
/// Emission still goes through the cache, so callers who want a true
/// full resend invalidate first.
pub(crate) fn refresh_full_page(engine: &mut Engine) {
    let count = engine.daw.track_count();
    engine.track_bank.clamp_to_count(count);
    let any_solo = engine.daw.any_solo();
    engine.mirror.set_any_solo(any_solo);
    for slot in 0..engine.track_bank.page_size() {
        let index = engine.track_bank.index_of(slot);
        match engine.daw.track(index) {
            Some(track) => send_slot(engine, slot, &track),
            None => {
                if engine.mirror.set_available(slot, false) {
                    engine.send_sysex(SysexMessage::new(Cmd::TrackAvail, 0, slot as u8, Vec::new()));
                }
            }
        }
    }
    send_bank_lights(engine);
}

fn send_slot(engine: &mut Engine, slot: usize, track: &TrackSnapshot) {
    let slot_byte = slot as u8;
    let muted_by_solo = engine.mirror.any_solo() && !track.solo;
    if engine.mirror.set_available(slot, true) {
        engine.send_sysex(SysexMessage::new(Cmd::TrackAvail, 1, slot_byte, Vec::new()));
    }
    if engine.mirror.set_selected(slot, track.selected) {
        engine.send_sysex(SysexMessage::new(
            Cmd::TrackSelected,
            u8::from(track.selected),
            slot_byte,
            Vec::new(),
        ));
    }
    if engine.mirror.set_solo(slot, track.solo) {
        engine.send_sysex(SysexMessage::new(
            Cmd::TrackSoloed,
            u8::from(track.solo),
            slot_byte,
            Vec::new(),
        ));
    }
    if engine.mirror.set_mute(slot, track.mute) {
        engine.send_sysex(SysexMessage::new(
            Cmd::TrackMuted,
            u8::from(track.mute),
            slot_byte,
            Vec::new(),
        ));
    }
    if engine.mirror.set_muted_by_solo(slot, muted_by_solo) {
        engine.send_sysex(SysexMessage::new(
            Cmd::TrackMutedBySolo,
            u8::from(muted_by_solo),
            slot_byte,
            Vec::new(),
        ));
    }
    if engine.mirror.set_armed(slot, track.armed) {
        engine.send_sysex(SysexMessage::new(
            Cmd::TrackArmed,
            u8::from(track.armed),
            slot_byte,
            Vec::new(),
        ));
    }
    let vol_cc = codec::volume_to_cc(track.volume);
    if engine.mirror.set_volume_cc(slot, vol_cc) {
        engine.send_cc(Cmd::KnobVolume(slot_byte), vol_cc);
    }
    let vol_text = volume_text(track.volume);
    if engine.mirror.set_volume_text(slot, vol_text.clone()) {
        engine.send_sysex(SysexMessage::text(Cmd::TrackVolumeText, 0, slot_byte, &vol_text));
    }
    let pan_cc = codec::pan_to_cc(track.pan);
    if engine.mirror.set_pan_cc(slot, pan_cc) {
        engine.send_cc(Cmd::KnobPan(slot_byte), pan_cc);
    }
    let pan_label = pan_text(track.pan);
    if engine.mirror.set_pan_text(slot, pan_label.clone()) {
        engine.send_sysex(SysexMessage::text(Cmd::TrackPanText, 0, slot_byte, &pan_label));
    }
    if engine.mirror.set_name(slot, track.name.clone()) {
        engine.send_sysex(SysexMessage::text(Cmd::TrackName, 0, slot_byte, &track.name));
    }
}

/// Prev/next lights for the bank buttons and the track encoder.
pub(crate) fn send_bank_lights(engine: &mut Engine) {
    let count = engine.daw.track_count();
    let mut bank_bits = 0;
    if engine.track_bank.can_shift(-1, count) {
        bank_bits |= 0x01;
    }
    if engine.track_bank.can_shift(1, count) {
        bank_bits |= 0x02;
    }
    engine.send_cc(Cmd::NavBanks, bank_bits);
    let mut track_bits = 0;
    if let Some(focused) = engine.mirror.focused_track {
        if focused > 0 {
            track_bits |= 0x01;
        }
        if focused + 1 < count {
            track_bits |= 0x02;
        }
    }
    engine.send_cc(Cmd::NavTracks, track_bits);
}

fn send_selected_track_state(engine: &mut Engine, index: usize) {
    let Some(track) = engine.daw.track(index) else {
        return;
    };
    let muted_by_solo = engine.mirror.any_solo() && !track.solo;
    engine.send_cc(Cmd::SelTrackAvail, 1);
    engine.send_cc(Cmd::SelTrackMuted, u8::from(track.mute));
    engine.send_cc(Cmd::SelTrackSoloed, u8::from(track.solo));
    engine.send_cc(Cmd::SelTrackMutedBySolo, u8::from(muted_by_solo));
}

/// Selection moved. The bank window follows the focused track; the focus
/// announcement pair goes out selection-first so the device never sees a
/// plugin focus on a stale track.
pub(crate) fn on_track_selected(engine: &mut Engine, index: usize, selected: bool) {
    if !selected {
        return;
    }
    engine.mirror.focused_track = Some(index);
    engine.fx_focus = None;
    let page_changed = engine.track_bank.select_page(index);
    if !engine.conn.is_connected() {
        return;
    }
    if page_changed {
        engine.mirror.invalidate();
        refresh_full_page(engine);
    } else {
        for slot in 0..engine.track_bank.page_size() {
            let i = engine.track_bank.index_of(slot);
            let sel = engine.daw.track(i).map(|t| t.selected).unwrap_or(false);
            if engine.mirror.set_selected(slot, sel) {
                engine.send_sysex(SysexMessage::new(
                    Cmd::TrackSelected,
                    u8::from(sel),
                    slot as u8,
                    Vec::new(),
                ));
            }
        }
        send_bank_lights(engine);
    }
    let name = engine.daw.track(index).map(|t| t.name).unwrap_or_default();
    engine.send_sysex(SysexMessage::text(Cmd::SelTrackParamsChanged, 0, 0, &name));
    send_selected_track_state(engine, index);
}

pub(crate) fn on_track_list_changed(engine: &mut Engine) {
    let count = engine.daw.track_count();
    engine.track_bank.clamp_to_count(count);
    if let Some(focused) = engine.mirror.focused_track {
        if focused >= count {
            engine.mirror.focused_track = None;
            engine.fx_focus = None;
        }
    }
    if engine.conn.is_connected() {
        engine.mirror.invalidate();
        refresh_full_page(engine);
    }
}

pub(crate) fn on_surface_volume(engine: &mut Engine, index: usize) {
    if !engine.conn.is_connected() {
        return;
    }
    let Some(slot) = engine.track_bank.slot_of(index) else {
        return;
    };
    let Some(track) = engine.daw.track(index) else {
        return;
    };
    let cc = codec::volume_to_cc(track.volume);
    if engine.mirror.set_volume_cc(slot, cc) {
        engine.send_cc(Cmd::KnobVolume(slot as u8), cc);
    }
    let text = volume_text(track.volume);
    if engine.mirror.set_volume_text(slot, text.clone()) {
        engine.send_sysex(SysexMessage::text(Cmd::TrackVolumeText, 0, slot as u8, &text));
    }
}

pub(crate) fn on_surface_pan(engine: &mut Engine, index: usize) {
    if !engine.conn.is_connected() {
        return;
    }
    let Some(slot) = engine.track_bank.slot_of(index) else {
        return;
    };
    let Some(track) = engine.daw.track(index) else {
        return;
    };
    let cc = codec::pan_to_cc(track.pan);
    if engine.mirror.set_pan_cc(slot, cc) {
        engine.send_cc(Cmd::KnobPan(slot as u8), cc);
    }
    let text = pan_text(track.pan);
    if engine.mirror.set_pan_text(slot, text.clone()) {
        engine.send_sysex(SysexMessage::text(Cmd::TrackPanText, 0, slot as u8, &text));
    }
}

pub(crate) fn on_surface_mute(engine: &mut Engine, index: usize, mute: bool) {
    if !engine.conn.is_connected() {
        return;
    }
    if let Some(slot) = engine.track_bank.slot_of(index) {
        if engine.mirror.set_mute(slot, mute) {
            engine.send_sysex(SysexMessage::new(
                Cmd::TrackMuted,
                u8::from(mute),
                slot as u8,
                Vec::new(),
            ));
        }
    }
    if engine.mirror.focused_track == Some(index) {
        engine.send_cc(Cmd::SelTrackMuted, u8::from(mute));
    }
}

pub(crate) fn on_surface_solo(engine: &mut Engine, index: usize, solo: bool) {
    if !engine.conn.is_connected() {
        return;
    }
    if let Some(slot) = engine.track_bank.slot_of(index) {
        if engine.mirror.set_solo(slot, solo) {
            engine.send_sysex(SysexMessage::new(
                Cmd::TrackSoloed,
                u8::from(solo),
                slot as u8,
                Vec::new(),
            ));
        }
    }
    let any_solo = engine.daw.any_solo();
    if engine.mirror.set_any_solo(any_solo) {
        // The project-wide flag flipped: every unsoloed track on the page
        // changed meaning, not just this one.
        refresh_muted_by_solo(engine);
    } else if let Some(slot) = engine.track_bank.slot_of(index) {
        let muted_by_solo = any_solo && !solo;
        if engine.mirror.set_muted_by_solo(slot, muted_by_solo) {
            engine.send_sysex(SysexMessage::new(
                Cmd::TrackMutedBySolo,
                u8::from(muted_by_solo),
                slot as u8,
                Vec::new(),
            ));
        }
    }
    if engine.mirror.focused_track == Some(index) {
        engine.send_cc(Cmd::SelTrackSoloed, u8::from(solo));
        let muted_by_solo = any_solo && !solo;
        engine.send_cc(Cmd::SelTrackMutedBySolo, u8::from(muted_by_solo));
    }
}

fn refresh_muted_by_solo(engine: &mut Engine) {
    let any_solo = engine.mirror.any_solo();
    for slot in 0..engine.track_bank.page_size() {
        let index = engine.track_bank.index_of(slot);
        let Some(track) = engine.daw.track(index) else {
            continue;
        };
        let muted_by_solo = any_solo && !track.solo;
        if engine.mirror.set_muted_by_solo(slot, muted_by_solo) {
            engine.send_sysex(SysexMessage::new(
                Cmd::TrackMutedBySolo,
                u8::from(muted_by_solo),
                slot as u8,
                Vec::new(),
            ));
        }
    }
}

pub(crate) fn on_surface_rec_arm(engine: &mut Engine, index: usize, armed: bool) {
    if !engine.conn.is_connected() {
        return;
    }
    if let Some(slot) = engine.track_bank.slot_of(index) {
        if engine.mirror.set_armed(slot, armed) {
            engine.send_sysex(SysexMessage::new(
                Cmd::TrackArmed,
                u8::from(armed),
                slot as u8,
                Vec::new(),
            ));
        }
    }
}

pub(crate) fn on_play_state(engine: &mut Engine, state: PlayState) {
    if engine.conn.is_connected() {
        engine.send_cc(Cmd::Play, u8::from(state.playing));
        engine.send_cc(Cmd::Record, u8::from(state.recording));
    }
    if !state.playing && !state.recording {
        super::normal::restore_count_in(engine);
    }
}

pub(crate) fn on_repeat_state(engine: &mut Engine, enabled: bool) {
    if !engine.conn.is_connected() {
        return;
    }
    // While loop edit flashes the LED it owns it.
    if engine.edit.mode() == EditMode::Loop {
        return;
    }
    engine.send_cc(Cmd::Loop, u8::from(enabled));
}

pub(crate) fn on_fx_param_changed(engine: &mut Engine, track: usize, fx: FxHandle, param: usize) {
    if !engine.conn.is_connected() {
        return;
    }
    let Some((focused_track, focused_fx)) = super::normal::focused_fx(engine) else {
        return;
    };
    if focused_track != track || focused_fx != fx {
        return;
    }
    let Some(slot) = engine.param_bank.slot_of(param) else {
        return;
    };
    send_param_slot(engine, slot);
}

/// FX list of `track` changed. A focused plugin that still resolves keeps
/// its view; one that vanished falls back to the first plugin, or drops the
/// plugin view when the track has none left.
pub(crate) fn on_fx_list_changed(engine: &mut Engine, track: usize) {
    if engine.mirror.focused_track != Some(track) {
        return;
    }
    let Some(path) = engine.fx_focus.clone() else {
        return;
    };
    let tree = FxTree::build(engine.daw.as_ref(), track);
    if tree.node_at_path(&path).is_none() {
        match tree.first_root().and_then(|root| tree.path_of(root)) {
            Some(fallback) => {
                engine.fx_focus = Some(fallback);
                engine.param_bank = Bank::default();
            }
            None => {
                engine.fx_focus = None;
                return;
            }
        }
    }
    if engine.conn.is_connected() {
        refresh_plugin_view(engine);
    }
}

pub(crate) fn on_extended(engine: &mut Engine, event: ExtendedEvent) {
    if !engine.conn.is_connected() {
        return;
    }
    match event {
        ExtendedEvent::MetronomeChanged(enabled) => {
            engine.send_cc(Cmd::Metro, u8::from(enabled));
        }
        ExtendedEvent::TempoChanged(bpm) => {
            if engine.caps.tempo_sync {
                let text = format!("{:.2} BPM", bpm);
                engine.send_sysex(SysexMessage::text(Cmd::TapTempo, 0, 0, &text));
            }
        }
        // The surface has no play-rate readout.
        ExtendedEvent::PlayRateChanged(_) => {}
    }
}

/// One VU frame: two meter bytes per slot, left then right. Slots without
/// a track and muted tracks stay at the floor code.
pub(crate) fn peak_update(engine: &mut Engine) {
    let mut vu = [1u8; 2 * BANK_SLOTS];
    for slot in 0..engine.track_bank.page_size() {
        let index = engine.track_bank.index_of(slot);
        let Some(track) = engine.daw.track(index) else {
            continue;
        };
        if track.mute || (engine.mirror.any_solo() && !track.solo) {
            continue;
        }
        for channel in 0..2u8 {
            let peak = engine.daw.peak(index, channel);
            let code = if peak < MIN_AUDIBLE_PEAK {
                1
            } else {
                meter_level(peak)
            };
            vu[slot * 2 + usize::from(channel)] = code;
        }
    }
    engine.send_sysex(SysexMessage::new(Cmd::TrackVu, 2, 0, vu.to_vec()));
}

/// Repaint the plugin view: plugin name, preset, page indicator, and the
/// visible parameter slots.
pub(crate) fn refresh_plugin_view(engine: &mut Engine) {
    let Some((track, handle)) = super::normal::focused_fx(engine) else {
        return;
    };
    let name = engine.daw.fx_name(track, handle).unwrap_or_default();
    engine.send_sysex(SysexMessage::text(Cmd::PluginName, 0, 0, &name));
    if let Some(preset) = engine.daw.preset_name(track, handle) {
        engine.send_sysex(SysexMessage::text(Cmd::PresetName, 0, 0, &preset));
    }
    let count = engine.daw.param_count(track, handle);
    engine.param_bank.clamp_to_count(count);
    let page_size = engine.param_bank.page_size();
    let page = (engine.param_bank.start() / page_size) as u8;
    let pages = ((count + page_size - 1) / page_size).max(1) as u8;
    engine.send_sysex(SysexMessage::new(Cmd::PluginPage, page, pages, Vec::new()));
    for slot in 0..page_size {
        let param = engine.param_bank.index_of(slot);
        if param < count {
            let param_name = engine
                .daw
                .param_name(track, handle, param)
                .unwrap_or_default();
            engine.send_sysex(SysexMessage::text(Cmd::ParamName, 0, slot as u8, &param_name));
            send_param_slot(engine, slot);
        } else {
            engine.send_sysex(SysexMessage::text(Cmd::ParamName, 0, slot as u8, ""));
        }
    }
}

/// Value text and knob position for one visible parameter slot.
pub(crate) fn send_param_slot(engine: &mut Engine, slot: usize) {
    let Some((track, handle)) = super::normal::focused_fx(engine) else {
        return;
    };
    let param = engine.param_bank.index_of(slot);
    if param >= engine.daw.param_count(track, handle) {
        return;
    }
    if let Some(text) = engine.daw.param_value_text(track, handle, param) {
        engine.send_sysex(SysexMessage::text(Cmd::ParamValueText, 0, slot as u8, &text));
    }
    if let Some(value) = engine.daw.param_value(track, handle, param) {
        engine.send_sysex(SysexMessage::new(
            Cmd::ParamValue,
            param_cc(value),
            slot as u8,
            Vec::new(),
        ));
    }
}
