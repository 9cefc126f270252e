//! Last-sent state per visible slot.
//!
//! Every outbound mirror message goes through this cache first; a write that
//! does not change the stored value reports `false` and the caller skips the
//! send. Unconditional resends on every host callback are exactly the kind
//! of traffic that desyncs the display on a busy project.

use nihia_proto::BANK_SLOTS;

/// What the hardware last heard about one slot. `None` = never sent since
/// the last invalidation, so the next write always reports a change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotMirror {
    pub available: Option<bool>,
    pub selected: Option<bool>,
    pub mute: Option<bool>,
    pub solo: Option<bool>,
    pub armed: Option<bool>,
    pub muted_by_solo: Option<bool>,
    pub name: Option<String>,
    pub volume_text: Option<String>,
    pub pan_text: Option<String>,
    pub volume_cc: Option<u8>,
    pub pan_cc: Option<u8>,
}

fn update<T: PartialEq>(field: &mut Option<T>, value: T) -> bool {
    if field.as_ref() == Some(&value) {
        false
    } else {
        *field = Some(value);
        true
    }
}

#[derive(Debug, Default)]
pub struct MirrorCache {
    slots: [SlotMirror; BANK_SLOTS],
    any_solo: bool,
    /// Ordinal of the last focused (selected) track.
    pub focused_track: Option<usize>,
}

impl MirrorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything last sent. Used when the visible page changes or a
    /// connection bootstraps, so the following refresh resends every field.
    pub fn invalidate(&mut self) {
        self.slots = Default::default();
    }

    pub fn slot(&self, slot: usize) -> &SlotMirror {
        &self.slots[slot]
    }

    pub fn set_available(&mut self, slot: usize, v: bool) -> bool {
        update(&mut self.slots[slot].available, v)
    }

    pub fn set_selected(&mut self, slot: usize, v: bool) -> bool {
        update(&mut self.slots[slot].selected, v)
    }

    pub fn set_mute(&mut self, slot: usize, v: bool) -> bool {
        update(&mut self.slots[slot].mute, v)
    }

    pub fn set_solo(&mut self, slot: usize, v: bool) -> bool {
        update(&mut self.slots[slot].solo, v)
    }

    pub fn set_armed(&mut self, slot: usize, v: bool) -> bool {
        update(&mut self.slots[slot].armed, v)
    }

    pub fn set_muted_by_solo(&mut self, slot: usize, v: bool) -> bool {
        update(&mut self.slots[slot].muted_by_solo, v)
    }

    pub fn set_name(&mut self, slot: usize, v: String) -> bool {
        update(&mut self.slots[slot].name, v)
    }

    pub fn set_volume_text(&mut self, slot: usize, v: String) -> bool {
        update(&mut self.slots[slot].volume_text, v)
    }

    pub fn set_pan_text(&mut self, slot: usize, v: String) -> bool {
        update(&mut self.slots[slot].pan_text, v)
    }

    pub fn set_volume_cc(&mut self, slot: usize, v: u8) -> bool {
        update(&mut self.slots[slot].volume_cc, v)
    }

    pub fn set_pan_cc(&mut self, slot: usize, v: u8) -> bool {
        update(&mut self.slots[slot].pan_cc, v)
    }

    pub fn any_solo(&self) -> bool {
        self.any_solo
    }

    /// Record the project-wide solo flag. When it flips, the semantics of
    /// every unsoloed track change globally, so the caller must recompute
    /// the muted-by-solo overlay for every visible slot.
    pub fn set_any_solo(&mut self, v: bool) -> bool {
        if self.any_solo == v {
            false
        } else {
            self.any_solo = v;
            true
        }
    }
}
