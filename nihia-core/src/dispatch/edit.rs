//! The extended-edit command table, shadowing normal dispatch while the
//! mode is armed or a submode is active.
//!
//! Armed is one-shot: the loop and tempo buttons enter their submode, the
//! chord button disarms, and anything else performs its normal action and
//! drops back to normal dispatch. Submodes repurpose the encoders and hold
//! until their own button (or the chord) is pressed again.

use nihia_proto::{signed_7bit, Cmd};

use crate::engine::Engine;
use crate::state::EditMode;

use super::{normal, notify};

pub(crate) fn dispatch(engine: &mut Engine, cmd: Cmd, value: u8) {
    match engine.edit.mode() {
        EditMode::Armed => armed(engine, cmd, value),
        EditMode::Loop => loop_mode(engine, cmd, value),
        EditMode::Tempo => tempo_mode(engine, cmd, value),
        EditMode::Off => normal::dispatch(engine, cmd, value),
    }
}

fn armed(engine: &mut Engine, cmd: Cmd, value: u8) {
    match cmd {
        Cmd::Loop => {
            engine.edit.enter(EditMode::Loop);
            engine.send_cc(Cmd::Loop, 1);
        }
        Cmd::TapTempo => {
            engine.edit.enter(EditMode::Tempo);
            engine.send_cc(Cmd::TapTempo, 1);
        }
        Cmd::Clear => leave(engine),
        other => {
            engine.edit.exit();
            normal::dispatch(engine, other, value);
        }
    }
}

fn loop_mode(engine: &mut Engine, cmd: Cmd, value: u8) {
    let delta = i32::from(signed_7bit(value));
    match cmd {
        Cmd::MoveTransport | Cmd::NavTracks => engine.daw.move_loop(delta),
        Cmd::MoveLoop | Cmd::NavBanks => engine.daw.resize_loop(delta),
        Cmd::Loop | Cmd::Clear | Cmd::Stop => leave(engine),
        other => {
            log::debug!(target: "engine", "{:?} has no loop-edit action", other);
        }
    }
}

fn tempo_mode(engine: &mut Engine, cmd: Cmd, value: u8) {
    let delta = signed_7bit(value);
    match cmd {
        Cmd::MoveTransport | Cmd::NavTracks => engine.daw.adjust_tempo(f64::from(delta)),
        Cmd::TapTempo | Cmd::Clear | Cmd::Stop => leave(engine),
        other => {
            log::debug!(target: "engine", "{:?} has no tempo-edit action", other);
        }
    }
}

/// Leave edit mode and put every light the flashing touched back to its
/// live host state.
fn leave(engine: &mut Engine) {
    engine.edit.exit();
    let repeat = engine.daw.repeat_enabled();
    engine.send_cc(Cmd::Loop, u8::from(repeat));
    engine.send_cc(Cmd::TapTempo, 0);
    let metro = engine.daw.metronome_enabled();
    engine.send_cc(Cmd::Metro, u8::from(metro));
    notify::send_bank_lights(engine);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::edit::{CYCLE_PATTERN, CYCLE_PERIOD_TICKS, FLASH_PERIOD_TICKS};
    use crate::testutil::{connect_engine, MockDaw, MockLink};

    fn press(engine: &mut Engine, cmd: Cmd, value: u8) {
        engine.on_midi(&nihia_proto::CcMessage::new(cmd, value).encode());
    }

    #[test]
    fn chord_arms_and_loop_enters_without_toggling_repeat() {
        let daw = MockDaw::with_tracks(2);
        let link = MockLink::available();
        let mut engine = connect_engine(&daw, &link, 3);
        press(&mut engine, Cmd::Clear, 1);
        assert_eq!(engine.edit.mode(), EditMode::Armed);
        press(&mut engine, Cmd::Loop, 1);
        assert_eq!(engine.edit.mode(), EditMode::Loop);
        assert!(!daw.calls().iter().any(|c| c == "toggle_repeat"));
        assert_eq!(link.sent_ccs().last(), Some(&(Cmd::Loop, 1)));
    }

    #[test]
    fn armed_is_one_shot_for_other_buttons() {
        let daw = MockDaw::with_tracks(2);
        let link = MockLink::available();
        let mut engine = connect_engine(&daw, &link, 3);
        press(&mut engine, Cmd::Clear, 1);
        press(&mut engine, Cmd::Play, 1);
        assert_eq!(engine.edit.mode(), EditMode::Off);
        assert!(daw.calls().iter().any(|c| c == "play_pause"));
        // Back in normal dispatch afterwards.
        press(&mut engine, Cmd::Loop, 1);
        assert!(daw.calls().iter().any(|c| c == "toggle_repeat"));
    }

    #[test]
    fn second_chord_disarms() {
        let daw = MockDaw::with_tracks(2);
        let link = MockLink::available();
        let mut engine = connect_engine(&daw, &link, 3);
        press(&mut engine, Cmd::Clear, 1);
        press(&mut engine, Cmd::Clear, 1);
        assert_eq!(engine.edit.mode(), EditMode::Off);
    }

    #[test]
    fn loop_mode_repurposes_the_encoders() {
        let daw = MockDaw::with_tracks(2);
        let link = MockLink::available();
        let mut engine = connect_engine(&daw, &link, 3);
        press(&mut engine, Cmd::Clear, 1);
        press(&mut engine, Cmd::Loop, 1);
        daw.clear_calls();
        press(&mut engine, Cmd::MoveTransport, 1);
        press(&mut engine, Cmd::NavTracks, 127);
        press(&mut engine, Cmd::MoveLoop, 1);
        press(&mut engine, Cmd::NavBanks, 127);
        assert_eq!(
            daw.calls(),
            vec!["move_loop 1", "move_loop -1", "resize_loop 1", "resize_loop -1"]
        );
        // No track selection happened while the encoders were repurposed.
        assert!(!daw.calls().iter().any(|c| c.starts_with("select_only")));
    }

    #[test]
    fn tempo_mode_adjusts_tempo_per_detent() {
        let daw = MockDaw::with_tracks(2);
        let link = MockLink::available();
        let mut engine = connect_engine(&daw, &link, 3);
        press(&mut engine, Cmd::Clear, 1);
        press(&mut engine, Cmd::TapTempo, 1);
        press(&mut engine, Cmd::NavTracks, 2);
        press(&mut engine, Cmd::MoveTransport, 127);
        assert_eq!(daw.tempo_value(), 121.0);
    }

    #[test]
    fn leaving_restores_lights_from_live_state() {
        let daw = MockDaw::with_tracks(2);
        let link = MockLink::available();
        let mut engine = connect_engine(&daw, &link, 3);
        press(&mut engine, Cmd::Loop, 1); // repeat now on
        press(&mut engine, Cmd::Metro, 1); // click now on
        press(&mut engine, Cmd::Clear, 1);
        press(&mut engine, Cmd::Loop, 1); // enter loop edit
        link.clear_sent();
        press(&mut engine, Cmd::Loop, 1); // leave
        assert_eq!(engine.edit.mode(), EditMode::Off);
        let ccs = link.sent_ccs();
        assert!(ccs.contains(&(Cmd::Loop, 1)));
        assert!(ccs.contains(&(Cmd::TapTempo, 0)));
        assert!(ccs.contains(&(Cmd::Metro, 1)));
        assert!(ccs.iter().any(|(c, _)| *c == Cmd::NavBanks));
        assert!(ccs.iter().any(|(c, _)| *c == Cmd::NavTracks));
    }

    #[test]
    fn submode_flashes_and_cycles_on_tick() {
        let daw = MockDaw::with_tracks(2);
        let link = MockLink::available();
        let mut engine = connect_engine(&daw, &link, 3);
        press(&mut engine, Cmd::Clear, 1);
        press(&mut engine, Cmd::Loop, 1);
        link.clear_sent();
        for _ in 0..FLASH_PERIOD_TICKS {
            engine.tick();
        }
        assert!(link.sent_ccs().contains(&(Cmd::Loop, 0)));
        link.clear_sent();
        for _ in 0..CYCLE_PERIOD_TICKS {
            engine.tick();
        }
        assert!(link
            .sent_ccs()
            .iter()
            .any(|(c, v)| *c == Cmd::NavTracks && CYCLE_PATTERN.contains(v)));
    }

    #[test]
    fn tempo_submode_flashes_the_tap_led() {
        let daw = MockDaw::with_tracks(2);
        let link = MockLink::available();
        let mut engine = connect_engine(&daw, &link, 3);
        press(&mut engine, Cmd::Clear, 1);
        press(&mut engine, Cmd::TapTempo, 1);
        link.clear_sent();
        for _ in 0..FLASH_PERIOD_TICKS * 2 {
            engine.tick();
        }
        let flashes: Vec<u8> = link
            .sent_ccs()
            .into_iter()
            .filter(|(c, _)| *c == Cmd::TapTempo)
            .map(|(_, v)| v)
            .collect();
        assert_eq!(flashes, vec![0, 1]);
    }
}
