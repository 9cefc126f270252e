//! Value conversions between DAW-native units and 7-bit wire values.
//!
//! Volume goes through the host's fader law (logarithmic, +12 dB at the top
//! of the fader, unity gain at position 716/1000) before scaling to 0..127.
//! The meter curve is separate: it matches the non-linear dB spacing of the
//! hardware's own display rather than the host's meters.

/// dB value at the top of the fader.
const FADER_TOP_DB: f64 = 12.0;

/// Fader position (out of 1000) of unity gain.
const FADER_UNITY_POS: f64 = 716.0;

/// Meter fit constants for `a + b * ln(c * peak + d)`, valid above -48 dB.
/// Anchors observed on the device: 127 = +6 dB, 106 = 0 dB, 68 = -12 dB,
/// 38 = -24 dB, 16 = -48 dB.
const METER_A: f64 = -3.239_153_861_239_019_2e1;
const METER_B: f64 = 3.067_361_864_356_102_1e1;
const METER_C: f64 = 8.672_079_898_491_722_4e1;
const METER_D: f64 = 4.492_014_301_299_610_3;

/// Amplitude of -48 dB; below this the log fit has no meaningful resolution
/// and the curve falls back to a linear ramp.
const METER_LOG_FLOOR: f64 = 0.003_981_071_705_534_972_5;

/// Slope of the linear ramp below -48 dB.
const METER_LINEAR_SLOPE: f64 = 4019.0;

fn fader_db_scale() -> f64 {
    FADER_TOP_DB / (1000.0 / FADER_UNITY_POS).ln()
}

/// Round-half-up to an integer code after clamping to [0, 127].
fn to_7bit(x: f64) -> u8 {
    let clamped = x.clamp(0.0, 127.0);
    (clamped + 0.5) as u8
}

/// Linear gain to a 0..127 fader code through the host fader law.
pub fn volume_to_cc(gain: f64) -> u8 {
    if !(gain > 0.0) {
        return 0;
    }
    let db = 20.0 * gain.log10();
    let pos = FADER_UNITY_POS * (db / fader_db_scale()).exp();
    to_7bit(pos * 127.0 / 1000.0)
}

/// Inverse of [`volume_to_cc`]: fader code back to linear gain.
pub fn cc_to_volume(value: u8) -> f64 {
    let pos = f64::from(value) * 1000.0 / 127.0;
    if pos <= 0.0 {
        return 0.0;
    }
    let db = fader_db_scale() * (pos / FADER_UNITY_POS).ln();
    10f64.powf(db / 20.0)
}

/// Pan in [-1, 1] to a 0..127 code, centre at 64.
pub fn pan_to_cc(pan: f64) -> u8 {
    to_7bit((pan + 1.0) * 63.5)
}

/// Inverse of [`pan_to_cc`], with a small dead zone snapping to centre.
pub fn cc_to_pan(value: u8) -> f64 {
    let pos = (f64::from(value) * 1000.0 + 0.5) / 127.0;
    let pan = (pos - 500.0) / 500.0;
    if pan.abs() < 0.08 {
        0.0
    } else {
        pan
    }
}

/// Peak amplitude to the hardware's meter code, 1..127.
///
/// The device treats a 0 byte in the VU array as "end of meters", so the
/// minimum emitted code is 1. 126.5 is the pre-rounding ceiling; full scale
/// is reserved for the bank-boundary indicator.
pub fn meter_level(peak: f64) -> u8 {
    let raw = if peak > METER_LOG_FLOOR {
        METER_A + METER_B * (METER_C * peak + METER_D).ln()
    } else {
        peak.max(0.0) * METER_LINEAR_SLOPE
    };
    (raw.clamp(0.5, 126.5) + 0.5) as u8
}

/// A signed 7-bit encoder delta: 0..=63 positive, 64..=127 means -64..=-1.
pub fn signed_7bit(value: u8) -> i8 {
    if value <= 63 {
        value as i8
    } else {
        (i16::from(value) - 128) as i8
    }
}

/// Knob sensitivity divisors. One physical detent moves the target value by
/// `delta / divisor`; the coarse divisor serves the per-slot mixer knobs,
/// the fine one the selected-track gestures on the same encoders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    pub coarse: f64,
    pub fine: f64,
}

impl Default for Sensitivity {
    fn default() -> Self {
        // 1/127 per detent coarse, 1/(127*8) fine.
        Self {
            coarse: 127.0,
            fine: 1016.0,
        }
    }
}

impl Sensitivity {
    pub fn coarse_step(&self, raw: u8) -> f64 {
        f64::from(signed_7bit(raw)) / self.coarse
    }

    pub fn fine_step(&self, raw: u8) -> f64 {
        f64::from(signed_7bit(raw)) / self.fine
    }
}
