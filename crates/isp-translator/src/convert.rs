//! Unit conversions between framework and firmware conventions
//!
//! Framework units are nanoseconds, ISO sensitivity, EV fractions, diopters
//! and physical floats; the firmware wants microseconds, 1000-based gain
//! codes, EV millis and x100 integer units. Conversions saturate rather
//! than wrap.

use isp_firmware::FW_TONEMAP_SCALE;
use isp_metadata::Rational;

/// Denominator of the framework's exposure compensation step (1/6 EV).
pub const EV_STEP_DENOMINATOR: i32 = 6;

/// Gain code of ISO 100 (gain 1.0).
const GAIN_CODE_PER_ISO100: i64 = 1000;

fn div_round(n: i64, d: i64) -> i64 {
    // Round half away from zero, symmetric for negative values.
    if (n < 0) == (d < 0) {
        (n + d / 2) / d
    } else {
        (n - d / 2) / d
    }
}

/// Nanoseconds -> microseconds, saturating at zero and `u32::MAX`.
pub fn ns_to_us(ns: i64) -> u32 {
    (ns.max(0) / 1_000).min(i64::from(u32::MAX)) as u32
}

/// Microseconds -> nanoseconds.
pub fn us_to_ns(us: u32) -> i64 {
    i64::from(us) * 1_000
}

/// ISO sensitivity -> 1000-based gain code.
pub fn iso_to_gain_code(iso: i32) -> u32 {
    (i64::from(iso.max(0)) * GAIN_CODE_PER_ISO100 / 100).min(i64::from(u32::MAX)) as u32
}

/// 1000-based gain code -> ISO sensitivity.
pub fn gain_code_to_iso(code: u32) -> i32 {
    (i64::from(code) * 100 / GAIN_CODE_PER_ISO100).min(i64::from(i32::MAX)) as i32
}

/// Framework EV steps (1/6 EV) -> firmware EV millis.
pub fn ev_steps_to_millis(steps: i32) -> i32 {
    div_round(i64::from(steps) * 1_000, i64::from(EV_STEP_DENOMINATOR)) as i32
}

/// Firmware EV millis -> framework EV steps (1/6 EV).
pub fn ev_millis_to_steps(millis: i32) -> i32 {
    div_round(i64::from(millis) * i64::from(EV_STEP_DENOMINATOR), 1_000) as i32
}

/// Diopters -> lens device units (diopters x100).
pub fn diopters_to_units(diopters: f32) -> u32 {
    (diopters.max(0.0) * 100.0).round() as u32
}

/// Lens device units -> diopters.
pub fn units_to_diopters(units: u32) -> f32 {
    units as f32 / 100.0
}

/// Physical float -> x100 integer units (apertures, focal lengths,
/// filter densities).
pub fn f32_to_x100(value: f32) -> u32 {
    (value.max(0.0) * 100.0).round() as u32
}

/// x100 integer units -> physical float.
pub fn x100_to_f32(value: u32) -> f32 {
    value as f32 / 100.0
}

/// Target fps range -> frame duration bounds in microseconds.
///
/// The maximum fps bounds the minimum duration and vice versa. A zero fps
/// bound maps to an unconstrained (zero) duration bound.
pub fn fps_range_to_durations(min_fps: i32, max_fps: i32) -> (u32, u32) {
    let min_us = if max_fps > 0 {
        (1_000_000 / max_fps as u32).max(1)
    } else {
        0
    };
    let max_us = if min_fps > 0 {
        (1_000_000 / min_fps as u32).max(1)
    } else {
        0
    };
    (min_us, max_us)
}

/// Tonemap sample [0.0, 1.0] -> fixed point 0..=FW_TONEMAP_SCALE.
pub fn tonemap_to_fw(sample: f32) -> u16 {
    (sample.clamp(0.0, 1.0) * f32::from(FW_TONEMAP_SCALE)).round() as u16
}

/// Fixed-point tonemap sample -> [0.0, 1.0].
pub fn tonemap_to_f32(sample: u16) -> f32 {
    f32::from(sample.min(FW_TONEMAP_SCALE)) / f32::from(FW_TONEMAP_SCALE)
}

/// Rational color transform coefficient -> Q16.16 fixed point.
pub fn rational_to_q16(r: Rational) -> i32 {
    if r.den == 0 {
        return 0;
    }
    div_round(i64::from(r.num) * 65_536, i64::from(r.den)) as i32
}

/// Q16.16 fixed point -> rational (denominator 65536).
pub fn q16_to_rational(q: i32) -> Rational {
    Rational::new(q, 65_536)
}

/// Gain float -> x1000 integer code (color correction gains).
pub fn gain_to_x1000(gain: f32) -> u32 {
    (gain.max(0.0) * 1000.0).round() as u32
}

/// x1000 integer code -> gain float.
pub fn x1000_to_gain(code: u32) -> f32 {
    code as f32 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_conversions() {
        assert_eq!(ns_to_us(33_333_333), 33_333);
        assert_eq!(ns_to_us(-5), 0);
        assert_eq!(us_to_ns(10_000), 10_000_000);
    }

    #[test]
    fn test_gain_code_round_trip() {
        assert_eq!(iso_to_gain_code(100), 1000);
        assert_eq!(iso_to_gain_code(800), 8000);
        assert_eq!(gain_code_to_iso(8000), 800);
        for iso in [50, 100, 200, 1600, 12800] {
            assert_eq!(gain_code_to_iso(iso_to_gain_code(iso)), iso);
        }
    }

    #[test]
    fn test_ev_step_round_trip() {
        for steps in -18..=18 {
            assert_eq!(ev_millis_to_steps(ev_steps_to_millis(steps)), steps);
        }
        assert_eq!(ev_steps_to_millis(6), 1_000);
        assert_eq!(ev_steps_to_millis(-6), -1_000);
    }

    #[test]
    fn test_lens_units() {
        assert_eq!(diopters_to_units(2.5), 250);
        assert!((units_to_diopters(250) - 2.5).abs() < 1e-6);
        assert_eq!(f32_to_x100(1.8), 180);
    }

    #[test]
    fn test_fps_range_to_durations() {
        let (min_us, max_us) = fps_range_to_durations(15, 30);
        assert_eq!(min_us, 33_333);
        assert_eq!(max_us, 66_666);
        assert_eq!(fps_range_to_durations(0, 0), (0, 0));
    }

    #[test]
    fn test_tonemap_fixed_point() {
        assert_eq!(tonemap_to_fw(0.0), 0);
        assert_eq!(tonemap_to_fw(1.0), 1024);
        assert_eq!(tonemap_to_fw(2.0), 1024); // clamped
        assert!((tonemap_to_f32(512) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_rational_q16() {
        assert_eq!(rational_to_q16(Rational::new(1, 1)), 65_536);
        assert_eq!(rational_to_q16(Rational::new(-1, 2)), -32_768);
        assert_eq!(rational_to_q16(Rational::new(1, 0)), 0);
        assert_eq!(q16_to_rational(65_536), Rational::new(65_536, 65_536));
    }
}
