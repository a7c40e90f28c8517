//! Enumeration mapping tables
//!
//! Total translation tables between framework byte encodings and firmware
//! encodings. The to-firmware direction parses the framework byte through
//! the typed vocabulary with a defined fallback for unknown values, then
//! matches exhaustively, so no firmware field is ever left uninitialized
//! and adding a variant forces both directions to be updated.

use isp_firmware::values;
use isp_metadata::{
    AeMode, AeState, AfMode, AfState, AntibandingMode, AwbMode, AwbState, ColorCorrectionMode,
    ControlMode, DemosaicMode, EffectMode, FaceDetectMode, FlashMode, FlashState, LensState,
    ProcessingMode, SceneFlicker, SceneMode, TestPatternMode, TonemapMode, TriggerValue,
    VideoStabilizationMode,
};

pub(crate) fn control_mode_to_fw(b: u8) -> u8 {
    match ControlMode::from_byte(b).unwrap_or(ControlMode::Auto) {
        ControlMode::Off => values::CTRL_OFF,
        ControlMode::Auto => values::CTRL_AUTO,
        ControlMode::UseSceneMode => values::CTRL_SCENE,
    }
}

pub(crate) fn ae_mode_to_fw(b: u8) -> u8 {
    match AeMode::from_byte(b).unwrap_or(AeMode::On) {
        AeMode::Off => values::AE_OFF,
        AeMode::On => values::AE_ON,
        AeMode::OnAutoFlash => values::AE_ON_AUTO_FLASH,
        AeMode::OnAlwaysFlash => values::AE_ON_ALWAYS_FLASH,
        AeMode::OnAutoFlashRedeye => values::AE_ON_AUTO_FLASH_REDEYE,
    }
}

pub(crate) fn antibanding_to_fw(b: u8) -> u8 {
    match AntibandingMode::from_byte(b).unwrap_or(AntibandingMode::Auto) {
        AntibandingMode::Off => values::BANDING_OFF,
        AntibandingMode::Hz50 => values::BANDING_50HZ,
        AntibandingMode::Hz60 => values::BANDING_60HZ,
        AntibandingMode::Auto => values::BANDING_AUTO,
    }
}

pub(crate) fn af_mode_to_fw(b: u8) -> u8 {
    match AfMode::from_byte(b).unwrap_or(AfMode::Off) {
        AfMode::Off => values::AF_FIXED,
        AfMode::Auto => values::AF_AUTO,
        AfMode::Macro => values::AF_MACRO,
        AfMode::ContinuousVideo => values::AF_CONTINUOUS_VIDEO,
        AfMode::ContinuousPicture => values::AF_CONTINUOUS_PICTURE,
        AfMode::Edof => values::AF_EDOF,
    }
}

pub(crate) fn awb_mode_to_fw(b: u8) -> u8 {
    match AwbMode::from_byte(b).unwrap_or(AwbMode::Auto) {
        AwbMode::Off => values::AWB_OFF,
        AwbMode::Auto => values::AWB_AUTO,
        AwbMode::Incandescent => values::AWB_INCANDESCENT,
        AwbMode::Fluorescent => values::AWB_FLUORESCENT,
        AwbMode::WarmFluorescent => values::AWB_WARM_FLUORESCENT,
        AwbMode::Daylight => values::AWB_DAYLIGHT,
        AwbMode::CloudyDaylight => values::AWB_CLOUDY,
        AwbMode::Twilight => values::AWB_TWILIGHT,
        AwbMode::Shade => values::AWB_SHADE,
    }
}

pub(crate) fn scene_mode_to_fw(b: u8) -> u8 {
    match SceneMode::from_byte(b).unwrap_or(SceneMode::Disabled) {
        SceneMode::Disabled => values::SCENE_DISABLED,
        SceneMode::Action => values::SCENE_ACTION,
        SceneMode::Portrait => values::SCENE_PORTRAIT,
        SceneMode::Landscape => values::SCENE_LANDSCAPE,
        SceneMode::Night => values::SCENE_NIGHT,
        SceneMode::NightPortrait => values::SCENE_NIGHT_PORTRAIT,
        SceneMode::Theatre => values::SCENE_THEATRE,
        SceneMode::Beach => values::SCENE_BEACH,
        SceneMode::Snow => values::SCENE_SNOW,
        SceneMode::Sunset => values::SCENE_SUNSET,
        SceneMode::SteadyPhoto => values::SCENE_STEADYPHOTO,
        SceneMode::Fireworks => values::SCENE_FIREWORKS,
        SceneMode::Sports => values::SCENE_SPORTS,
        SceneMode::Party => values::SCENE_PARTY,
        SceneMode::Candlelight => values::SCENE_CANDLELIGHT,
        SceneMode::Barcode => values::SCENE_BARCODE,
    }
}

pub(crate) fn effect_mode_to_fw(b: u8) -> u8 {
    match EffectMode::from_byte(b).unwrap_or(EffectMode::Off) {
        EffectMode::Off => values::EFFECT_OFF,
        EffectMode::Mono => values::EFFECT_MONO,
        EffectMode::Negative => values::EFFECT_NEGATIVE,
        EffectMode::Solarize => values::EFFECT_SOLARIZE,
        EffectMode::Sepia => values::EFFECT_SEPIA,
        EffectMode::Posterize => values::EFFECT_POSTERIZE,
        EffectMode::Whiteboard => values::EFFECT_WHITEBOARD,
        EffectMode::Blackboard => values::EFFECT_BLACKBOARD,
        EffectMode::Aqua => values::EFFECT_AQUA,
    }
}

pub(crate) fn stabilization_to_fw(b: u8) -> u8 {
    match VideoStabilizationMode::from_byte(b).unwrap_or(VideoStabilizationMode::Off) {
        VideoStabilizationMode::Off => 0,
        VideoStabilizationMode::On => 1,
    }
}

pub(crate) fn trigger_to_fw(b: u8) -> u8 {
    match TriggerValue::from_byte(b).unwrap_or(TriggerValue::Idle) {
        TriggerValue::Idle => values::TRIGGER_IDLE,
        TriggerValue::Start => values::TRIGGER_START,
        TriggerValue::Cancel => values::TRIGGER_CANCEL,
    }
}

pub(crate) fn test_pattern_to_fw(b: u8) -> u8 {
    match TestPatternMode::from_byte(b).unwrap_or(TestPatternMode::Off) {
        TestPatternMode::Off => values::PATTERN_OFF,
        TestPatternMode::SolidColor => values::PATTERN_SOLID_COLOR,
        TestPatternMode::ColorBars => values::PATTERN_COLOR_BARS,
        TestPatternMode::ColorBarsFadeToGray => values::PATTERN_COLOR_BARS_FADE,
        TestPatternMode::Pn9 => values::PATTERN_PN9,
    }
}

pub(crate) fn flash_mode_to_fw(b: u8) -> u8 {
    match FlashMode::from_byte(b).unwrap_or(FlashMode::Off) {
        FlashMode::Off => values::FLASH_OFF,
        FlashMode::Single => values::FLASH_SINGLE,
        FlashMode::Torch => values::FLASH_TORCH,
    }
}

pub(crate) fn tonemap_mode_to_fw(b: u8) -> u8 {
    match TonemapMode::from_byte(b).unwrap_or(TonemapMode::Fast) {
        TonemapMode::ContrastCurve => values::TONEMAP_CONTRAST_CURVE,
        TonemapMode::Fast => values::TONEMAP_FAST,
        TonemapMode::HighQuality => values::TONEMAP_HQ,
    }
}

/// Shared table for the off/fast/high-quality correction blocks.
pub(crate) fn processing_mode_to_fw(b: u8) -> u8 {
    match ProcessingMode::from_byte(b).unwrap_or(ProcessingMode::Fast) {
        ProcessingMode::Off => values::PROC_OFF,
        ProcessingMode::Fast => values::PROC_FAST,
        ProcessingMode::HighQuality => values::PROC_HQ,
    }
}

pub(crate) fn cc_mode_to_fw(b: u8) -> u8 {
    match ColorCorrectionMode::from_byte(b).unwrap_or(ColorCorrectionMode::Fast) {
        ColorCorrectionMode::TransformMatrix => values::CC_TRANSFORM_MATRIX,
        ColorCorrectionMode::Fast => values::CC_FAST,
        ColorCorrectionMode::HighQuality => values::CC_HQ,
    }
}

pub(crate) fn demosaic_mode_to_fw(b: u8) -> u8 {
    match DemosaicMode::from_byte(b).unwrap_or(DemosaicMode::Fast) {
        DemosaicMode::Fast => values::DEMOSAIC_FAST,
        DemosaicMode::HighQuality => values::DEMOSAIC_HQ,
    }
}

pub(crate) fn face_detect_to_fw(b: u8) -> u8 {
    match FaceDetectMode::from_byte(b).unwrap_or(FaceDetectMode::Off) {
        FaceDetectMode::Off => values::FD_OFF,
        FaceDetectMode::Simple => values::FD_SIMPLE,
        FaceDetectMode::Full => values::FD_FULL,
    }
}

// Result-state tables, firmware -> framework. Unknown firmware values fall
// back to the inactive/neutral state.

pub(crate) fn ae_state_from_fw(b: u8) -> AeState {
    match b {
        values::AE_STATE_INACTIVE => AeState::Inactive,
        values::AE_STATE_SEARCHING => AeState::Searching,
        values::AE_STATE_CONVERGED => AeState::Converged,
        values::AE_STATE_LOCKED => AeState::Locked,
        values::AE_STATE_FLASH_REQUIRED => AeState::FlashRequired,
        values::AE_STATE_PRECAPTURE => AeState::Precapture,
        _ => AeState::Inactive,
    }
}

pub(crate) fn af_state_from_fw(b: u8) -> AfState {
    match b {
        values::AF_STATE_INACTIVE => AfState::Inactive,
        values::AF_STATE_PASSIVE_SCAN => AfState::PassiveScan,
        values::AF_STATE_PASSIVE_FOCUSED => AfState::PassiveFocused,
        values::AF_STATE_ACTIVE_SCAN => AfState::ActiveScan,
        values::AF_STATE_FOCUSED => AfState::FocusedLocked,
        values::AF_STATE_NOT_FOCUSED => AfState::NotFocusedLocked,
        values::AF_STATE_PASSIVE_UNFOCUSED => AfState::PassiveUnfocused,
        _ => AfState::Inactive,
    }
}

pub(crate) fn awb_state_from_fw(b: u8) -> AwbState {
    match b {
        values::AWB_STATE_INACTIVE => AwbState::Inactive,
        values::AWB_STATE_SEARCHING => AwbState::Searching,
        values::AWB_STATE_CONVERGED => AwbState::Converged,
        values::AWB_STATE_LOCKED => AwbState::Locked,
        _ => AwbState::Inactive,
    }
}

pub(crate) fn flash_state_from_fw(b: u8) -> FlashState {
    match b {
        values::FLASH_STATE_UNAVAILABLE => FlashState::Unavailable,
        values::FLASH_STATE_CHARGING => FlashState::Charging,
        values::FLASH_STATE_READY => FlashState::Ready,
        values::FLASH_STATE_FIRED => FlashState::Fired,
        values::FLASH_STATE_PARTIAL => FlashState::Partial,
        _ => FlashState::Unavailable,
    }
}

pub(crate) fn lens_state_from_fw(b: u8) -> LensState {
    match b {
        values::LENS_MOVING => LensState::Moving,
        _ => LensState::Stationary,
    }
}

pub(crate) fn scene_flicker_from_fw(b: u8) -> SceneFlicker {
    match b {
        values::FLICKER_50HZ => SceneFlicker::Hz50,
        values::FLICKER_60HZ => SceneFlicker::Hz60,
        _ => SceneFlicker::None,
    }
}
