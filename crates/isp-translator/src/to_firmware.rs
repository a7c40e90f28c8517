//! Metadata -> firmware command translation
//!
//! Walks every translated tag, asks the delta detector whether the field
//! group needs reprogramming, converts units, and writes the firmware
//! command fields for the set groups. Statistics enables have no meaningful
//! previous state and are read every request.
//!
//! Failure policy: a missing or malformed entry clears the group for this
//! request and logs the reason. The firmware keeps the previously
//! programmed value, which is the last known good state.

use tracing::{debug, warn};

use isp_firmware::{
    FwFocusWindow, FwFrameControl, FwWindow, FW_MAX_EXPOSURE_WINDOWS, FW_MAX_FOCUS_WINDOWS,
    FW_TONEMAP_POINTS,
};
use isp_metadata::{DeltaDetector, FieldGroup, FieldMask, MetadataSnapshot, Tag};

use crate::convert;
use crate::error::TranslationError;
use crate::geometry::{GeometryMapper, SensorProfile};
use crate::modes;

/// Strength applied to correction blocks when the request omits one.
const NOMINAL_STRENGTH: u8 = 5;

/// Elements per exposure metering region (`h_offset, v_offset, h_size,
/// v_size`).
const EXPOSURE_REGION_STRIDE: usize = 4;
/// Elements per focus region (`x_min, y_min, x_max, y_max, weight`).
const FOCUS_REGION_STRIDE: usize = 5;

/// The metadata-to-firmware field translation engine.
pub struct FieldTranslator;

impl FieldTranslator {
    /// Translate one snapshot pair into a delta-encoded firmware command.
    ///
    /// Returns the mask of field groups written; the same mask is stored in
    /// the command's `valid_mask`. Translation is deterministic: the same
    /// snapshot pair always yields the same command and mask.
    pub fn map_frame_control(
        cur: &MetadataSnapshot,
        prev: Option<&MetadataSnapshot>,
        profile: &SensorProfile,
        cmd: &mut FwFrameControl,
    ) -> FieldMask {
        let mut mask = FieldMask::empty();
        cmd.profile_id = profile.id;

        map_scene(cur, prev, &mut mask, cmd);
        map_ae(cur, prev, profile, &mut mask, cmd);
        map_af(cur, prev, profile, &mut mask, cmd);
        map_awb(cur, prev, &mut mask, cmd);
        map_sensor(cur, prev, &mut mask, cmd);
        map_lens(cur, prev, &mut mask, cmd);
        map_flash(cur, prev, &mut mask, cmd);
        map_tonemap(cur, prev, &mut mask, cmd);
        map_image(cur, prev, &mut mask, cmd);
        map_crop(cur, prev, profile, &mut mask, cmd);
        map_stats(cur, &mut mask, cmd);

        cmd.valid_mask = mask.bits();
        debug!(
            valid_mask = format_args!("{:#x}", mask.bits()),
            profile = profile.id,
            "frame control mapped"
        );
        mask
    }
}

/// Changed single-byte value for `tag`, or `None` (with a log) when absent
/// or malformed.
fn updated_byte(tag: Tag, cur: &MetadataSnapshot, prev: Option<&MetadataSnapshot>) -> Option<u8> {
    let entry = DeltaDetector::updated(tag, cur, prev)?;
    match entry.value.as_byte() {
        Some(b) => Some(b),
        None => {
            warn!(error = %TranslationError::MalformedEntry { tag, reason: "expected one byte" });
            None
        }
    }
}

/// Current single-byte value for `tag` regardless of delta, used when a
/// group is rewritten because a sibling tag changed.
fn current_byte(tag: Tag, cur: &MetadataSnapshot) -> Option<u8> {
    cur.get(tag)?.value.as_byte()
}

fn map_scene(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    if let Some(b) = updated_byte(Tag::ControlMode, cur, prev) {
        cmd.scene.control_mode = modes::control_mode_to_fw(b);
        mask.set(FieldGroup::ControlMode);
    }
    if let Some(b) = updated_byte(Tag::SceneMode, cur, prev) {
        cmd.scene.scene_mode = modes::scene_mode_to_fw(b);
        mask.set(FieldGroup::SceneMode);
    }
    if let Some(b) = updated_byte(Tag::EffectMode, cur, prev) {
        cmd.scene.effect_mode = modes::effect_mode_to_fw(b);
        mask.set(FieldGroup::EffectMode);
    }
    if let Some(b) = updated_byte(Tag::VideoStabilizationMode, cur, prev) {
        cmd.scene.video_stabilization = modes::stabilization_to_fw(b);
        mask.set(FieldGroup::VideoStabilization);
    }
}

fn map_ae(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    profile: &SensorProfile,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    if let Some(b) = updated_byte(Tag::AeMode, cur, prev) {
        cmd.ae.mode = modes::ae_mode_to_fw(b);
        mask.set(FieldGroup::AeMode);
    }
    if let Some(b) = updated_byte(Tag::AeLock, cur, prev) {
        cmd.ae.lock = u8::from(b != 0);
        mask.set(FieldGroup::AeLock);
    }
    if let Some(b) = updated_byte(Tag::AeAntibandingMode, cur, prev) {
        cmd.ae.antibanding = modes::antibanding_to_fw(b);
        mask.set(FieldGroup::AeAntibanding);
    }

    if let Some(entry) = DeltaDetector::updated(Tag::AeExposureCompensation, cur, prev) {
        match entry.value.as_i32() {
            Some(steps) => {
                cmd.ae.ev_compensation_millis = convert::ev_steps_to_millis(steps);
                mask.set(FieldGroup::AeEvCompensation);
            }
            None => warn!(error = %TranslationError::MalformedEntry {
                tag: Tag::AeExposureCompensation,
                reason: "expected one i32",
            }),
        }
    }

    if let Some(entry) = DeltaDetector::updated(Tag::AeTargetFpsRange, cur, prev) {
        match entry.value.as_i32s() {
            Some([min_fps, max_fps]) => {
                let (min_us, max_us) = convert::fps_range_to_durations(*min_fps, *max_fps);
                cmd.ae.frame_duration_min_us = min_us;
                cmd.ae.frame_duration_max_us = max_us;
                mask.set(FieldGroup::AeFpsRange);
            }
            _ => warn!(error = %TranslationError::MalformedEntry {
                tag: Tag::AeTargetFpsRange,
                reason: "expected [min_fps, max_fps]",
            }),
        }
    }

    // The trigger group is written whenever the trigger or its id moves;
    // both fields go down together.
    if DeltaDetector::changed(Tag::AePrecaptureTrigger, cur, prev)
        || DeltaDetector::changed(Tag::AePrecaptureId, cur, prev)
    {
        match current_byte(Tag::AePrecaptureTrigger, cur) {
            Some(trigger) => {
                cmd.ae.precapture_trigger = modes::trigger_to_fw(trigger);
                cmd.ae.precapture_id = cur
                    .get(Tag::AePrecaptureId)
                    .and_then(|e| e.value.as_i32())
                    .unwrap_or(0)
                    .max(0) as u32;
                mask.set(FieldGroup::AeTrigger);
            }
            None => warn!(error = %TranslationError::MissingTag(Tag::AePrecaptureTrigger)),
        }
    }

    if DeltaDetector::changed(Tag::AeRegions, cur, prev) {
        if let Some(entry) = cur.get(Tag::AeRegions) {
            match parse_exposure_regions(entry.value.as_i32s().unwrap_or(&[]), profile) {
                Ok((count, windows)) => {
                    cmd.ae.window_count = count;
                    cmd.ae.windows = windows;
                    mask.set(FieldGroup::AeRegions);
                }
                Err(e) => warn!(error = %e),
            }
        }
    }
}

fn map_af(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    profile: &SensorProfile,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    if let Some(b) = updated_byte(Tag::AfMode, cur, prev) {
        cmd.af.mode = modes::af_mode_to_fw(b);
        mask.set(FieldGroup::AfMode);
    }

    if DeltaDetector::changed(Tag::AfTrigger, cur, prev)
        || DeltaDetector::changed(Tag::AfTriggerId, cur, prev)
    {
        match current_byte(Tag::AfTrigger, cur) {
            Some(trigger) => {
                cmd.af.trigger = modes::trigger_to_fw(trigger);
                cmd.af.trigger_id = cur
                    .get(Tag::AfTriggerId)
                    .and_then(|e| e.value.as_i32())
                    .unwrap_or(0)
                    .max(0) as u32;
                mask.set(FieldGroup::AfTrigger);
            }
            None => warn!(error = %TranslationError::MissingTag(Tag::AfTrigger)),
        }
    }

    if DeltaDetector::changed(Tag::AfRegions, cur, prev) {
        if let Some(entry) = cur.get(Tag::AfRegions) {
            match parse_focus_regions(entry.value.as_i32s().unwrap_or(&[]), profile) {
                Ok((count, windows)) => {
                    cmd.af.window_count = count;
                    cmd.af.windows = windows;
                    mask.set(FieldGroup::AfRegions);
                }
                Err(e) => warn!(error = %e),
            }
        }
    }
}

fn map_awb(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    if let Some(b) = updated_byte(Tag::AwbMode, cur, prev) {
        cmd.awb.mode = modes::awb_mode_to_fw(b);
        mask.set(FieldGroup::AwbMode);
    }
    if let Some(b) = updated_byte(Tag::AwbLock, cur, prev) {
        cmd.awb.lock = u8::from(b != 0);
        mask.set(FieldGroup::AwbLock);
    }
}

fn map_sensor(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    if let Some(entry) = DeltaDetector::updated(Tag::SensorExposureTime, cur, prev) {
        match entry.value.as_i64() {
            Some(ns) => {
                cmd.sensor.exposure_us = convert::ns_to_us(ns);
                mask.set(FieldGroup::SensorExposure);
            }
            None => warn!(error = %TranslationError::MalformedEntry {
                tag: Tag::SensorExposureTime,
                reason: "expected one i64",
            }),
        }
    }
    if let Some(entry) = DeltaDetector::updated(Tag::SensorFrameDuration, cur, prev) {
        match entry.value.as_i64() {
            Some(ns) => {
                cmd.sensor.frame_duration_us = convert::ns_to_us(ns);
                mask.set(FieldGroup::SensorFrameDuration);
            }
            None => warn!(error = %TranslationError::MalformedEntry {
                tag: Tag::SensorFrameDuration,
                reason: "expected one i64",
            }),
        }
    }
    if let Some(entry) = DeltaDetector::updated(Tag::SensorSensitivity, cur, prev) {
        match entry.value.as_i32() {
            Some(iso) => {
                cmd.sensor.gain_code = convert::iso_to_gain_code(iso);
                mask.set(FieldGroup::SensorGain);
            }
            None => warn!(error = %TranslationError::MalformedEntry {
                tag: Tag::SensorSensitivity,
                reason: "expected one i32",
            }),
        }
    }

    if DeltaDetector::changed(Tag::SensorTestPatternMode, cur, prev)
        || DeltaDetector::changed(Tag::SensorTestPatternData, cur, prev)
    {
        match current_byte(Tag::SensorTestPatternMode, cur) {
            Some(mode) => {
                cmd.sensor.test_pattern = modes::test_pattern_to_fw(mode);
                let mut data = [0u32; 4];
                if let Some(raw) = cur
                    .get(Tag::SensorTestPatternData)
                    .and_then(|e| e.value.as_i32s())
                {
                    for (dst, src) in data.iter_mut().zip(raw.iter()) {
                        *dst = (*src).max(0) as u32;
                    }
                }
                cmd.sensor.test_pattern_data = data;
                mask.set(FieldGroup::TestPattern);
            }
            None => warn!(error = %TranslationError::MissingTag(Tag::SensorTestPatternMode)),
        }
    }
}

fn map_lens(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    if let Some(entry) = DeltaDetector::updated(Tag::LensFocusDistance, cur, prev) {
        match entry.value.as_f32() {
            Some(diopters) => {
                cmd.lens.focus_units = convert::diopters_to_units(diopters);
                mask.set(FieldGroup::LensFocus);
            }
            None => warn!(error = %TranslationError::MalformedEntry {
                tag: Tag::LensFocusDistance,
                reason: "expected one f32",
            }),
        }
    }
    if let Some(entry) = DeltaDetector::updated(Tag::LensAperture, cur, prev) {
        if let Some(v) = entry.value.as_f32() {
            cmd.lens.aperture_x100 = convert::f32_to_x100(v);
            mask.set(FieldGroup::LensAperture);
        }
    }
    if let Some(entry) = DeltaDetector::updated(Tag::LensFilterDensity, cur, prev) {
        if let Some(v) = entry.value.as_f32() {
            cmd.lens.filter_density_x100 = convert::f32_to_x100(v);
            mask.set(FieldGroup::LensFilterDensity);
        }
    }
    if let Some(entry) = DeltaDetector::updated(Tag::LensFocalLength, cur, prev) {
        if let Some(v) = entry.value.as_f32() {
            cmd.lens.focal_length_x100 = convert::f32_to_x100(v);
            mask.set(FieldGroup::LensFocalLength);
        }
    }
    if let Some(b) = updated_byte(Tag::LensOpticalStabilizationMode, cur, prev) {
        cmd.lens.ois_enable = u8::from(b != 0);
        mask.set(FieldGroup::LensOis);
    }
}

fn map_flash(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    let flash_changed = DeltaDetector::changed(Tag::FlashMode, cur, prev)
        || DeltaDetector::changed(Tag::FlashFiringPower, cur, prev)
        || DeltaDetector::changed(Tag::FlashFiringTime, cur, prev);
    if !flash_changed {
        return;
    }
    match current_byte(Tag::FlashMode, cur) {
        Some(mode) => {
            cmd.flash.mode = modes::flash_mode_to_fw(mode);
            cmd.flash.power = current_byte(Tag::FlashFiringPower, cur).unwrap_or(0);
            cmd.flash.firing_time_us = cur
                .get(Tag::FlashFiringTime)
                .and_then(|e| e.value.as_i64())
                .map(convert::ns_to_us)
                .unwrap_or(0);
            mask.set(FieldGroup::Flash);
        }
        None => warn!(error = %TranslationError::MissingTag(Tag::FlashMode)),
    }
}

fn map_tonemap(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    if let Some(b) = updated_byte(Tag::TonemapMode, cur, prev) {
        cmd.tonemap.mode = modes::tonemap_mode_to_fw(b);
        mask.set(FieldGroup::TonemapMode);
    }

    let curve_changed = DeltaDetector::changed(Tag::TonemapCurveRed, cur, prev)
        || DeltaDetector::changed(Tag::TonemapCurveGreen, cur, prev)
        || DeltaDetector::changed(Tag::TonemapCurveBlue, cur, prev);
    if !curve_changed {
        return;
    }

    // All three channels go down together; a partial curve keeps the
    // previous firmware curve.
    let channels = [
        Tag::TonemapCurveRed,
        Tag::TonemapCurveGreen,
        Tag::TonemapCurveBlue,
    ];
    let mut curves = [[0u16; FW_TONEMAP_POINTS]; 3];
    let mut point_count = FW_TONEMAP_POINTS;
    for (i, tag) in channels.into_iter().enumerate() {
        let Some(samples) = cur.get(tag).and_then(|e| e.value.as_f32s()) else {
            warn!(error = %TranslationError::MissingTag(tag));
            return;
        };
        point_count = point_count.min(samples.len().min(FW_TONEMAP_POINTS));
        for (dst, src) in curves[i].iter_mut().zip(samples.iter()) {
            *dst = convert::tonemap_to_fw(*src);
        }
    }
    cmd.tonemap.point_count = point_count as u32;
    cmd.tonemap.curve_red = curves[0];
    cmd.tonemap.curve_green = curves[1];
    cmd.tonemap.curve_blue = curves[2];
    mask.set(FieldGroup::TonemapCurve);
}

fn map_image(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    if let Some(b) = updated_byte(Tag::ColorCorrectionMode, cur, prev) {
        cmd.image.cc_mode = modes::cc_mode_to_fw(b);
        mask.set(FieldGroup::CcMode);
    }
    if let Some(entry) = DeltaDetector::updated(Tag::ColorCorrectionTransform, cur, prev) {
        match entry.value.as_rationals() {
            Some(coeffs) if coeffs.len() == 9 => {
                for (dst, src) in cmd.image.cc_transform_q16.iter_mut().zip(coeffs.iter()) {
                    *dst = convert::rational_to_q16(*src);
                }
                mask.set(FieldGroup::CcTransform);
            }
            _ => warn!(error = %TranslationError::MalformedEntry {
                tag: Tag::ColorCorrectionTransform,
                reason: "expected 9 rationals",
            }),
        }
    }
    if let Some(entry) = DeltaDetector::updated(Tag::ColorCorrectionGains, cur, prev) {
        match entry.value.as_f32s() {
            Some(gains) if gains.len() == 4 => {
                for (dst, src) in cmd.image.cc_gains.iter_mut().zip(gains.iter()) {
                    *dst = convert::gain_to_x1000(*src);
                }
                mask.set(FieldGroup::CcGains);
            }
            _ => warn!(error = %TranslationError::MalformedEntry {
                tag: Tag::ColorCorrectionGains,
                reason: "expected 4 floats",
            }),
        }
    }
    if let Some(b) = updated_byte(Tag::ColorCorrectionAberrationMode, cur, prev) {
        cmd.image.cc_aberration_mode = modes::processing_mode_to_fw(b);
        mask.set(FieldGroup::CcAberration);
    }

    if DeltaDetector::changed(Tag::NoiseReductionMode, cur, prev)
        || DeltaDetector::changed(Tag::NoiseReductionStrength, cur, prev)
    {
        if let Some(mode) = current_byte(Tag::NoiseReductionMode, cur) {
            cmd.image.nr_mode = modes::processing_mode_to_fw(mode);
            cmd.image.nr_strength =
                current_byte(Tag::NoiseReductionStrength, cur).unwrap_or(NOMINAL_STRENGTH);
            mask.set(FieldGroup::NoiseReduction);
        } else {
            warn!(error = %TranslationError::MissingTag(Tag::NoiseReductionMode));
        }
    }
    if DeltaDetector::changed(Tag::EdgeMode, cur, prev)
        || DeltaDetector::changed(Tag::EdgeStrength, cur, prev)
    {
        if let Some(mode) = current_byte(Tag::EdgeMode, cur) {
            cmd.image.edge_mode = modes::processing_mode_to_fw(mode);
            cmd.image.edge_strength =
                current_byte(Tag::EdgeStrength, cur).unwrap_or(NOMINAL_STRENGTH);
            mask.set(FieldGroup::Edge);
        } else {
            warn!(error = %TranslationError::MissingTag(Tag::EdgeMode));
        }
    }
    if DeltaDetector::changed(Tag::ShadingMode, cur, prev)
        || DeltaDetector::changed(Tag::ShadingStrength, cur, prev)
    {
        if let Some(mode) = current_byte(Tag::ShadingMode, cur) {
            cmd.image.shading_mode = modes::processing_mode_to_fw(mode);
            cmd.image.shading_strength =
                current_byte(Tag::ShadingStrength, cur).unwrap_or(NOMINAL_STRENGTH);
            mask.set(FieldGroup::Shading);
        } else {
            warn!(error = %TranslationError::MissingTag(Tag::ShadingMode));
        }
    }
    if let Some(b) = updated_byte(Tag::HotPixelMode, cur, prev) {
        cmd.image.hot_pixel_mode = modes::processing_mode_to_fw(b);
        mask.set(FieldGroup::HotPixel);
    }
    if let Some(b) = updated_byte(Tag::DemosaicMode, cur, prev) {
        cmd.image.demosaic_mode = modes::demosaic_mode_to_fw(b);
        mask.set(FieldGroup::Demosaic);
    }
    if let Some(b) = updated_byte(Tag::BlackLevelLock, cur, prev) {
        cmd.image.black_level_lock = u8::from(b != 0);
        mask.set(FieldGroup::BlackLevelLock);
    }
}

fn map_crop(
    cur: &MetadataSnapshot,
    prev: Option<&MetadataSnapshot>,
    profile: &SensorProfile,
    mask: &mut FieldMask,
    cmd: &mut FwFrameControl,
) {
    if let Some(entry) = DeltaDetector::updated(Tag::ScalerCropRegion, cur, prev) {
        match entry.value.as_i32s() {
            Some([h_offset, v_offset, h_size, v_size]) => {
                let hal = FwWindow {
                    h_offset: (*h_offset).max(0) as u32,
                    v_offset: (*v_offset).max(0) as u32,
                    h_size: (*h_size).max(0) as u32,
                    v_size: (*v_size).max(0) as u32,
                };
                cmd.crop = GeometryMapper::window_to_fw(&hal, profile);
                mask.set(FieldGroup::ScalerCrop);
            }
            _ => warn!(error = %TranslationError::MalformedEntry {
                tag: Tag::ScalerCropRegion,
                reason: "expected [h_offset, v_offset, h_size, v_size]",
            }),
        }
    }
}

/// Statistics switches have no meaningful previous state on the firmware
/// side and are re-sent whenever the request carries them.
fn map_stats(cur: &MetadataSnapshot, mask: &mut FieldMask, cmd: &mut FwFrameControl) {
    if let Some(b) = current_byte(Tag::StatsFaceDetectMode, cur) {
        cmd.stats.face_detect_mode = modes::face_detect_to_fw(b);
        mask.set(FieldGroup::StatsFaceDetect);
    }
    if let Some(b) = current_byte(Tag::StatsHistogramMode, cur) {
        cmd.stats.histogram_enable = u8::from(b != 0);
        mask.set(FieldGroup::StatsHistogram);
    }
    if let Some(b) = current_byte(Tag::StatsSharpnessMapMode, cur) {
        cmd.stats.sharpness_map_enable = u8::from(b != 0);
        mask.set(FieldGroup::StatsSharpnessMap);
    }
    if let Some(b) = current_byte(Tag::StatsHotPixelMapMode, cur) {
        cmd.stats.hot_pixel_map_enable = u8::from(b != 0);
        mask.set(FieldGroup::StatsHotPixelMap);
    }
    if let Some(b) = current_byte(Tag::StatsLensShadingMapMode, cur) {
        cmd.stats.lens_shading_map_enable = u8::from(b != 0);
        mask.set(FieldGroup::StatsLensShadingMap);
    }
}

fn parse_exposure_regions(
    raw: &[i32],
    profile: &SensorProfile,
) -> Result<(u32, [FwWindow; FW_MAX_EXPOSURE_WINDOWS]), TranslationError> {
    if raw.len() % EXPOSURE_REGION_STRIDE != 0 {
        return Err(TranslationError::BadRegionList {
            tag: Tag::AeRegions,
            len: raw.len(),
            stride: EXPOSURE_REGION_STRIDE,
        });
    }
    let mut windows = [FwWindow::default(); FW_MAX_EXPOSURE_WINDOWS];
    let mut count = 0usize;
    for chunk in raw.chunks_exact(EXPOSURE_REGION_STRIDE) {
        if count == FW_MAX_EXPOSURE_WINDOWS {
            debug!(dropped = raw.len() / EXPOSURE_REGION_STRIDE - count, "exposure regions truncated");
            break;
        }
        let hal = FwWindow {
            h_offset: chunk[0].max(0) as u32,
            v_offset: chunk[1].max(0) as u32,
            h_size: chunk[2].max(0) as u32,
            v_size: chunk[3].max(0) as u32,
        };
        windows[count] = GeometryMapper::window_to_fw(&hal, profile);
        count += 1;
    }
    Ok((count as u32, windows))
}

fn parse_focus_regions(
    raw: &[i32],
    profile: &SensorProfile,
) -> Result<(u32, [FwFocusWindow; FW_MAX_FOCUS_WINDOWS]), TranslationError> {
    if raw.len() % FOCUS_REGION_STRIDE != 0 {
        return Err(TranslationError::BadRegionList {
            tag: Tag::AfRegions,
            len: raw.len(),
            stride: FOCUS_REGION_STRIDE,
        });
    }
    let mut windows = [FwFocusWindow::default(); FW_MAX_FOCUS_WINDOWS];
    let mut count = 0usize;
    for chunk in raw.chunks_exact(FOCUS_REGION_STRIDE) {
        if count == FW_MAX_FOCUS_WINDOWS {
            debug!(dropped = raw.len() / FOCUS_REGION_STRIDE - count, "focus regions truncated");
            break;
        }
        let weight = chunk[4].max(0) as u32;
        // The firmware does not accept zero-weight windows; they are
        // removed and the region count shrinks accordingly.
        if weight == 0 {
            debug!("zero-weight focus region dropped");
            continue;
        }
        let hal = FwFocusWindow {
            x_min: chunk[0].max(0) as u32,
            y_min: chunk[1].max(0) as u32,
            x_max: chunk[2].max(0) as u32,
            y_max: chunk[3].max(0) as u32,
            weight,
        };
        windows[count] = GeometryMapper::focus_to_fw(&hal, profile);
        count += 1;
    }
    Ok((count as u32, windows))
}
