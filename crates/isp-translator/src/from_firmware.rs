//! Firmware result -> metadata translation
//!
//! Maps the per-frame firmware result back into metadata entries for the
//! framework. A value is only emitted when it differs from the last
//! committed firmware-facing value, so steady-state fields do not generate
//! a notification on every frame.

use tracing::trace;

use isp_firmware::{
    mask, FwFocusWindow, FwFrameResult, FwWindow, FW_MAX_EXPOSURE_WINDOWS, FW_MAX_FOCUS_WINDOWS,
};
use isp_metadata::{MetadataEntry, MetadataValue, Tag};

use crate::convert;
use crate::geometry::{GeometryMapper, SensorProfile};
use crate::modes;
use crate::to_firmware::FieldTranslator;

/// Last committed firmware-facing values for one camera stream.
///
/// Reset when the stream closes or the profile switches, so the first
/// result of a new stream republishes everything.
#[derive(Debug, Default)]
pub struct CommittedState {
    timestamp_ns: Option<u64>,
    exposure_us: Option<u32>,
    frame_duration_us: Option<u32>,
    gain_code: Option<u32>,
    rolling_skew_us: Option<u32>,
    ae_state: Option<u8>,
    af_state: Option<u8>,
    awb_state: Option<u8>,
    flash_state: Option<u8>,
    lens_state: Option<u8>,
    scene_flicker: Option<u8>,
    precapture_id: Option<u32>,
    af_trigger_id: Option<u32>,
    focus_units: Option<u32>,
    focus_range: Option<(u32, u32)>,
    awb_gains: Option<[u32; 4]>,
    ae_windows: Option<(u32, [FwWindow; FW_MAX_EXPOSURE_WINDOWS])>,
    af_windows: Option<(u32, [FwFocusWindow; FW_MAX_FOCUS_WINDOWS])>,
}

impl CommittedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Latch `new` into `slot`; true when the committed value moved.
fn commit<T: PartialEq + Copy>(slot: &mut Option<T>, new: T) -> bool {
    if *slot == Some(new) {
        false
    } else {
        *slot = Some(new);
        true
    }
}

impl FieldTranslator {
    /// Translate a firmware frame result into the metadata delta to publish.
    pub fn unmap_frame_result(
        result: &FwFrameResult,
        profile: &SensorProfile,
        committed: &mut CommittedState,
    ) -> Vec<MetadataEntry> {
        let mut out = Vec::new();
        let valid = result.valid_mask;

        if commit(&mut committed.timestamp_ns, result.timestamp_ns) {
            out.push(MetadataEntry::new(
                Tag::SensorTimestamp,
                MetadataValue::I64(vec![result.timestamp_ns as i64]),
            ));
        }

        if valid & mask::SENSOR_EXPOSURE != 0
            && commit(&mut committed.exposure_us, result.exposure_us)
        {
            out.push(MetadataEntry::new(
                Tag::SensorExposureTime,
                MetadataValue::I64(vec![convert::us_to_ns(result.exposure_us)]),
            ));
        }
        if valid & mask::SENSOR_FRAME_DURATION != 0
            && commit(&mut committed.frame_duration_us, result.frame_duration_us)
        {
            out.push(MetadataEntry::new(
                Tag::SensorFrameDuration,
                MetadataValue::I64(vec![convert::us_to_ns(result.frame_duration_us)]),
            ));
        }
        if valid & mask::SENSOR_GAIN != 0 && commit(&mut committed.gain_code, result.gain_code) {
            out.push(MetadataEntry::new(
                Tag::SensorSensitivity,
                MetadataValue::I32(vec![convert::gain_code_to_iso(result.gain_code)]),
            ));
        }
        if commit(&mut committed.rolling_skew_us, result.rolling_shutter_skew_us) {
            out.push(MetadataEntry::new(
                Tag::SensorRollingShutterSkew,
                MetadataValue::I64(vec![convert::us_to_ns(result.rolling_shutter_skew_us)]),
            ));
        }

        if commit(&mut committed.ae_state, result.ae_state) {
            out.push(MetadataEntry::new(
                Tag::AeState,
                MetadataValue::Byte(vec![modes::ae_state_from_fw(result.ae_state) as u8]),
            ));
        }
        if commit(&mut committed.af_state, result.af_state) {
            out.push(MetadataEntry::new(
                Tag::AfState,
                MetadataValue::Byte(vec![modes::af_state_from_fw(result.af_state) as u8]),
            ));
        }
        if commit(&mut committed.awb_state, result.awb_state) {
            out.push(MetadataEntry::new(
                Tag::AwbState,
                MetadataValue::Byte(vec![modes::awb_state_from_fw(result.awb_state) as u8]),
            ));
        }
        if commit(&mut committed.flash_state, result.flash_state) {
            out.push(MetadataEntry::new(
                Tag::FlashState,
                MetadataValue::Byte(vec![modes::flash_state_from_fw(result.flash_state) as u8]),
            ));
        }
        if commit(&mut committed.lens_state, result.lens_state) {
            out.push(MetadataEntry::new(
                Tag::LensState,
                MetadataValue::Byte(vec![modes::lens_state_from_fw(result.lens_state) as u8]),
            ));
        }
        if commit(&mut committed.scene_flicker, result.scene_flicker) {
            out.push(MetadataEntry::new(
                Tag::StatsSceneFlicker,
                MetadataValue::Byte(vec![modes::scene_flicker_from_fw(result.scene_flicker) as u8]),
            ));
        }

        if commit(&mut committed.precapture_id, result.precapture_id) {
            out.push(MetadataEntry::new(
                Tag::AePrecaptureId,
                MetadataValue::I32(vec![result.precapture_id as i32]),
            ));
        }
        if commit(&mut committed.af_trigger_id, result.af_trigger_id) {
            out.push(MetadataEntry::new(
                Tag::AfTriggerId,
                MetadataValue::I32(vec![result.af_trigger_id as i32]),
            ));
        }

        if valid & mask::LENS_FOCUS != 0 {
            if commit(&mut committed.focus_units, result.focus_units) {
                out.push(MetadataEntry::new(
                    Tag::LensFocusDistance,
                    MetadataValue::F32(vec![convert::units_to_diopters(result.focus_units)]),
                ));
            }
            let range = (result.focus_range_near_x100, result.focus_range_far_x100);
            if commit(&mut committed.focus_range, range) {
                out.push(MetadataEntry::new(
                    Tag::LensFocusRange,
                    MetadataValue::F32(vec![
                        convert::x100_to_f32(range.0),
                        convert::x100_to_f32(range.1),
                    ]),
                ));
            }
        }

        if valid & mask::CC_GAINS != 0 && commit(&mut committed.awb_gains, result.awb_gains) {
            out.push(MetadataEntry::new(
                Tag::ColorCorrectionGains,
                MetadataValue::F32(result.awb_gains.iter().map(|g| convert::x1000_to_gain(*g)).collect()),
            ));
        }

        if valid & mask::AE_REGIONS != 0 {
            let windows = (result.ae_window_count, result.ae_windows);
            if commit(&mut committed.ae_windows, windows) {
                out.push(MetadataEntry::new(
                    Tag::AeRegions,
                    MetadataValue::I32(unmap_exposure_regions(result, profile)),
                ));
            }
        }
        if valid & mask::AF_REGIONS != 0 {
            let windows = (result.af_window_count, result.af_windows);
            if commit(&mut committed.af_windows, windows) {
                out.push(MetadataEntry::new(
                    Tag::AfRegions,
                    MetadataValue::I32(unmap_focus_regions(result, profile)),
                ));
            }
        }

        trace!(
            fc_id = result.fc_id,
            entries = out.len(),
            "frame result unmapped"
        );
        out
    }
}

fn unmap_exposure_regions(result: &FwFrameResult, profile: &SensorProfile) -> Vec<i32> {
    let count = (result.ae_window_count as usize).min(FW_MAX_EXPOSURE_WINDOWS);
    let mut out = Vec::with_capacity(count * 4);
    for w in &result.ae_windows[..count] {
        let hal = GeometryMapper::window_to_hal(w, profile);
        out.extend_from_slice(&[
            hal.h_offset as i32,
            hal.v_offset as i32,
            hal.h_size as i32,
            hal.v_size as i32,
        ]);
    }
    out
}

fn unmap_focus_regions(result: &FwFrameResult, profile: &SensorProfile) -> Vec<i32> {
    let count = (result.af_window_count as usize).min(FW_MAX_FOCUS_WINDOWS);
    let mut out = Vec::with_capacity(count * 5);
    for w in &result.af_windows[..count] {
        let hal = GeometryMapper::focus_to_hal(w, profile);
        out.extend_from_slice(&[
            hal.x_min as i32,
            hal.y_min as i32,
            hal.x_max as i32,
            hal.y_max as i32,
            hal.weight as i32,
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinningMode;
    use isp_firmware::values;

    fn profile_binned() -> SensorProfile {
        SensorProfile::new(1, BinningMode::Binned2x2, 3264, 2448)
    }

    fn result_fixture() -> FwFrameResult {
        let mut af_windows = [FwFocusWindow::default(); FW_MAX_FOCUS_WINDOWS];
        af_windows[0] = FwFocusWindow {
            x_min: 0,
            y_min: 0,
            x_max: 400,
            y_max: 300,
            weight: 500,
        };
        FwFrameResult {
            handle: 0x1000,
            fc_id: 0,
            profile_id: 1,
            valid_mask: mask::SENSOR_EXPOSURE
                | mask::SENSOR_GAIN
                | mask::SENSOR_FRAME_DURATION
                | mask::AF_REGIONS
                | mask::LENS_FOCUS
                | mask::CC_GAINS,
            timestamp_ns: 1_000_000,
            exposure_us: 10_000,
            frame_duration_us: 33_333,
            gain_code: 8_000,
            rolling_shutter_skew_us: 10_000,
            ae_state: values::AE_STATE_CONVERGED,
            af_state: values::AF_STATE_PASSIVE_FOCUSED,
            awb_state: values::AWB_STATE_CONVERGED,
            flash_state: values::FLASH_STATE_READY,
            lens_state: values::LENS_STATIONARY,
            scene_flicker: values::FLICKER_NONE,
            focus_units: 250,
            focus_range_near_x100: 275,
            focus_range_far_x100: 225,
            awb_gains: [1450, 1000, 1000, 1520],
            af_window_count: 1,
            af_windows,
            ..Default::default()
        }
    }

    fn find(entries: &[MetadataEntry], tag: Tag) -> Option<&MetadataEntry> {
        entries.iter().find(|e| e.tag == tag)
    }

    #[test]
    fn test_first_result_publishes_everything() {
        let mut committed = CommittedState::new();
        let entries = FieldTranslator::unmap_frame_result(
            &result_fixture(),
            &profile_binned(),
            &mut committed,
        );

        let exposure = find(&entries, Tag::SensorExposureTime).unwrap();
        assert_eq!(exposure.value.as_i64(), Some(10_000_000));

        let iso = find(&entries, Tag::SensorSensitivity).unwrap();
        assert_eq!(iso.value.as_i32(), Some(800));

        let ae_state = find(&entries, Tag::AeState).unwrap();
        assert_eq!(ae_state.value.as_byte(), Some(values::AE_STATE_CONVERGED));

        let focus = find(&entries, Tag::LensFocusDistance).unwrap();
        assert!((focus.value.as_f32().unwrap() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_focus_regions_unmapped_to_full_resolution() {
        // Firmware {0,0,400,300,w=500} under 2x2 binning must come back as
        // {0,0,800,600,w=500}.
        let mut committed = CommittedState::new();
        let entries = FieldTranslator::unmap_frame_result(
            &result_fixture(),
            &profile_binned(),
            &mut committed,
        );
        let regions = find(&entries, Tag::AfRegions).unwrap();
        assert_eq!(
            regions.value.as_i32s(),
            Some(&[0, 0, 800, 600, 500][..])
        );
    }

    #[test]
    fn test_steady_state_is_suppressed() {
        let mut committed = CommittedState::new();
        let result = result_fixture();

        let first = FieldTranslator::unmap_frame_result(&result, &profile_binned(), &mut committed);
        assert!(!first.is_empty());

        // The identical result again: nothing changed, nothing published.
        let second =
            FieldTranslator::unmap_frame_result(&result, &profile_binned(), &mut committed);
        assert!(second.is_empty());

        // A new timestamp alone publishes exactly the timestamp.
        let mut advanced = result;
        advanced.timestamp_ns += 33_333_000;
        let third =
            FieldTranslator::unmap_frame_result(&advanced, &profile_binned(), &mut committed);
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].tag, Tag::SensorTimestamp);
    }

    #[test]
    fn test_reset_republishes() {
        let mut committed = CommittedState::new();
        let result = result_fixture();

        FieldTranslator::unmap_frame_result(&result, &profile_binned(), &mut committed);
        committed.reset();
        let entries =
            FieldTranslator::unmap_frame_result(&result, &profile_binned(), &mut committed);
        assert!(find(&entries, Tag::SensorExposureTime).is_some());
    }

    #[test]
    fn test_gated_groups_respect_valid_mask() {
        let mut committed = CommittedState::new();
        let mut result = result_fixture();
        result.valid_mask = 0;

        let entries =
            FieldTranslator::unmap_frame_result(&result, &profile_binned(), &mut committed);
        assert!(find(&entries, Tag::SensorExposureTime).is_none());
        assert!(find(&entries, Tag::AfRegions).is_none());
        // Ungated state fields still flow.
        assert!(find(&entries, Tag::AeState).is_some());
    }
}
