//! The normal-mode command table: what each surface control does while the
//! extended-edit mode is off.
//!
//! Mutating commands go to the host and nothing else; the resulting state
//! comes back through the host's own notification callbacks, which keeps a
//! single source of truth for every light and label. The exceptions are the
//! plugin-view commands, whose state lives here rather than in the host.

use nihia_proto::{signed_7bit, Cmd, SysexMessage};

use crate::daw::{FxHandle, NavDirection};
use crate::engine::Engine;
use crate::state::{Bank, FxTree};

use super::notify;

/// Normalized distance beyond which a written parameter value that reads
/// back differently is treated as a fixed-function (switch-like) parameter.
const PARAM_SETTLE_TOLERANCE: f64 = 0.05;

pub(crate) fn dispatch(engine: &mut Engine, cmd: Cmd, value: u8) {
    match cmd {
        Cmd::Play => engine.daw.play_pause(),
        Cmd::Restart => restart(engine),
        Cmd::Record => engine.daw.record(),
        Cmd::CountIn => count_in(engine),
        Cmd::Stop => {
            engine.daw.stop();
            restore_count_in(engine);
        }
        Cmd::Clear => engine.edit.arm(),
        Cmd::Loop => engine.daw.toggle_repeat(),
        Cmd::Metro => engine.daw.toggle_metronome(),
        Cmd::TapTempo => engine.daw.tap_tempo(),
        Cmd::Undo => engine.daw.undo(),
        Cmd::Redo => engine.daw.redo(),
        Cmd::Quantize => engine.daw.quantize(),
        Cmd::Automation => toggle_automation(engine),

        Cmd::NavTracks => {
            let delta = signed_7bit(value);
            if engine.plugin_view() {
                navigate_fx(engine, delta);
            } else {
                navigate_tracks(engine, delta);
            }
        }
        Cmd::NavBanks => {
            let delta = signed_7bit(value);
            if engine.plugin_view() {
                shift_param_page(engine, delta);
            } else {
                shift_track_bank(engine, delta);
            }
        }
        Cmd::NavClips => engine.daw.goto_marker(NavDirection::from_delta(signed_7bit(value))),
        Cmd::NavScenes => engine.daw.goto_region(NavDirection::from_delta(signed_7bit(value))),
        Cmd::MoveTransport => engine.daw.scrub(f64::from(signed_7bit(value))),
        Cmd::MoveLoop => engine.daw.move_loop(i32::from(signed_7bit(value))),
        Cmd::NavPresets => navigate_presets(engine, signed_7bit(value)),
        Cmd::PluginPage => shift_param_page(engine, signed_7bit(value)),

        Cmd::TrackSelected => select_slot(engine, value),
        Cmd::KnobVolume(slot) => {
            // Below the hi-res protocol version the device has no parameter
            // knob messages; while a plugin is focused, the per-slot volume
            // knobs drive its parameters instead.
            if engine.plugin_view() && !engine.caps.hires_params {
                adjust_focused_param(engine, usize::from(slot), value, false);
            } else {
                adjust_slot_volume(engine, slot, value);
            }
        }
        Cmd::KnobPan(slot) => adjust_slot_pan(engine, slot, value),
        Cmd::ChangeSelTrackVolume => {
            if let Some(index) = engine.mirror.focused_track {
                let step = engine.sensitivity.fine_step(value);
                engine.daw.adjust_volume(index, step);
            }
        }
        Cmd::ChangeSelTrackPan => {
            if let Some(index) = engine.mirror.focused_track {
                let step = engine.sensitivity.fine_step(value);
                engine.daw.adjust_pan(index, step);
            }
        }
        Cmd::ToggleSelTrackMute => {
            if let Some(index) = engine.mirror.focused_track {
                engine.daw.toggle_mute(index);
            }
        }
        Cmd::ToggleSelTrackSolo => {
            if let Some(index) = engine.mirror.focused_track {
                engine.daw.toggle_solo(index);
            }
        }

        Cmd::Goodbye => {
            log::info!(target: "engine", "device sent goodbye");
        }
        other => {
            log::debug!(target: "engine", "no normal-mode action for {:?}", other);
        }
    }
}

fn restart(engine: &mut Engine) {
    engine.daw.go_to_start();
    if !engine.daw.play_state().playing {
        engine.daw.play_pause();
    }
}

/// Start a count-in recording with the click forced on, remembering the
/// previous metronome state for when the transport stops.
fn count_in(engine: &mut Engine) {
    engine.count_in_metronome = Some(engine.daw.metronome_enabled());
    engine.daw.set_metronome(true);
    engine.daw.count_in_record();
}

pub(crate) fn restore_count_in(engine: &mut Engine) {
    if let Some(previous) = engine.count_in_metronome.take() {
        engine.daw.set_metronome(previous);
    }
}

fn toggle_automation(engine: &mut Engine) {
    let mode = if engine.daw.automation_override() < 0 {
        2 // touch
    } else {
        -1
    };
    engine.daw.set_automation_override(mode);
}

fn navigate_tracks(engine: &mut Engine, delta: i8) {
    let count = engine.daw.track_count();
    if count == 0 {
        return;
    }
    let focused = engine.mirror.focused_track.unwrap_or(0) as i64;
    let target = focused + i64::from(delta);
    if target < 0 || target >= count as i64 {
        return;
    }
    // The selection-changed callback does the mirroring.
    engine.daw.select_only(target as usize);
}

fn shift_track_bank(engine: &mut Engine, delta: i8) {
    let count = engine.daw.track_count();
    let direction = if delta < 0 { -1 } else { 1 };
    if engine.track_bank.shift(direction, count) {
        engine.mirror.invalidate();
        notify::refresh_full_page(engine);
    }
}

fn select_slot(engine: &mut Engine, slot: u8) {
    let index = engine.track_bank.index_of(usize::from(slot));
    if index < engine.daw.track_count() {
        engine.daw.select_only(index);
    }
}

fn adjust_slot_volume(engine: &mut Engine, slot: u8, value: u8) {
    let index = engine.track_bank.index_of(usize::from(slot));
    if index >= engine.daw.track_count() {
        return;
    }
    let step = engine.sensitivity.coarse_step(value);
    engine.daw.adjust_volume(index, step);
}

fn adjust_slot_pan(engine: &mut Engine, slot: u8, value: u8) {
    let index = engine.track_bank.index_of(usize::from(slot));
    if index >= engine.daw.track_count() {
        return;
    }
    let step = engine.sensitivity.coarse_step(value);
    engine.daw.adjust_pan(index, step);
}

/// Track and handle of the focused plugin, re-resolved against the live
/// FX list. `None` when no plugin is focused or its path went stale.
pub(crate) fn focused_fx(engine: &Engine) -> Option<(usize, FxHandle)> {
    let track = engine.mirror.focused_track?;
    let path = engine.fx_focus.as_ref()?;
    let tree = FxTree::build(engine.daw.as_ref(), track);
    let node = tree.node_at_path(path)?;
    Some((track, tree.handle_of(node)?))
}

/// Device focused a plugin: value is the top-level slot, the payload one
/// child position per container level.
pub(crate) fn on_select_plugin(engine: &mut Engine, top: u8, rest: &[u8]) {
    let Some(track) = engine.mirror.focused_track else {
        return;
    };
    let mut path = Vec::with_capacity(1 + rest.len());
    path.push(top);
    path.extend_from_slice(rest);
    let tree = FxTree::build(engine.daw.as_ref(), track);
    if tree.node_at_path(&path).is_none() {
        log::debug!(target: "engine", "select-plugin path {:?} no longer resolves", path);
        return;
    }
    engine.fx_focus = Some(path);
    engine.param_bank = Bank::default();
    notify::refresh_plugin_view(engine);
}

/// Move the plugin focus depth-first through the container tree. No wrap
/// at either end.
fn navigate_fx(engine: &mut Engine, delta: i8) {
    let Some(track) = engine.mirror.focused_track else {
        return;
    };
    let tree = FxTree::build(engine.daw.as_ref(), track);
    let current = engine
        .fx_focus
        .as_ref()
        .and_then(|p| tree.node_at_path(p))
        .or_else(|| tree.first_root());
    let Some(current) = current else {
        return;
    };
    let target = if delta >= 0 {
        tree.next(current)
    } else {
        tree.prev(current)
    };
    let Some(path) = target.and_then(|t| tree.path_of(t)) else {
        return;
    };
    let top = path[0];
    let rest = path[1..].to_vec();
    engine.fx_focus = Some(path);
    engine.param_bank = Bank::default();
    engine.send_sysex(SysexMessage::new(Cmd::SelectPlugin, top, 0, rest));
    notify::refresh_plugin_view(engine);
}

fn shift_param_page(engine: &mut Engine, delta: i8) {
    let Some((track, handle)) = focused_fx(engine) else {
        return;
    };
    let count = engine.daw.param_count(track, handle);
    let direction = if delta < 0 { -1 } else { 1 };
    if engine.param_bank.shift(direction, count) {
        notify::refresh_plugin_view(engine);
    }
}

fn navigate_presets(engine: &mut Engine, delta: i8) {
    let Some((track, handle)) = focused_fx(engine) else {
        return;
    };
    engine
        .daw
        .navigate_preset(track, handle, NavDirection::from_delta(delta));
    if let Some(name) = engine.daw.preset_name(track, handle) {
        engine.send_sysex(SysexMessage::text(Cmd::PresetName, 0, 0, &name));
    }
}

/// Apply one encoder step to the parameter shown in `slot`. Toggle-shaped
/// parameters snap to their extremes; a parameter the plugin refuses to
/// hold at the written value is retried as a switch.
pub(crate) fn adjust_focused_param(engine: &mut Engine, slot: usize, value: u8, fine: bool) {
    let Some((track, handle)) = focused_fx(engine) else {
        return;
    };
    if slot >= engine.param_bank.page_size() {
        return;
    }
    let param = engine.param_bank.index_of(slot);
    if param >= engine.daw.param_count(track, handle) {
        return;
    }
    let Some(current) = engine.daw.param_value(track, handle, param) else {
        return;
    };
    if engine.daw.param_is_toggle(track, handle, param) {
        let target = if signed_7bit(value) >= 0 { 1.0 } else { 0.0 };
        engine.daw.set_param_value(track, handle, param, target);
    } else {
        let step = if fine {
            engine.sensitivity.fine_step(value)
        } else {
            engine.sensitivity.coarse_step(value)
        };
        let target = (current + step).clamp(0.0, 1.0);
        if (target - current).abs() > f64::EPSILON {
            if let Some(back) = engine.daw.set_param_value(track, handle, param, target) {
                if (back - target).abs() > PARAM_SETTLE_TOLERANCE {
                    let snapped = if current < 0.5 { 1.0 } else { 0.0 };
                    engine.daw.set_param_value(track, handle, param, snapped);
                }
            }
        }
    }
    notify::send_param_slot(engine, slot);
}
