//! Metadata Tag Registry
//!
//! Tags follow the `section << 16 | index` numbering used by the framework
//! schema. Every tag carries a fixed entry type; snapshot updates are
//! validated against it.

use serde::{Deserialize, Serialize};

/// Section bases for tag numbering.
mod section {
    pub const COLOR_CORRECTION: u32 = 0x0 << 16;
    pub const CONTROL: u32 = 0x1 << 16;
    pub const DEMOSAIC: u32 = 0x2 << 16;
    pub const EDGE: u32 = 0x3 << 16;
    pub const FLASH: u32 = 0x4 << 16;
    pub const HOT_PIXEL: u32 = 0x5 << 16;
    pub const LENS: u32 = 0x6 << 16;
    pub const NOISE_REDUCTION: u32 = 0x7 << 16;
    pub const SCALER: u32 = 0x8 << 16;
    pub const SENSOR: u32 = 0x9 << 16;
    pub const SHADING: u32 = 0xA << 16;
    pub const STATISTICS: u32 = 0xB << 16;
    pub const TONEMAP: u32 = 0xC << 16;
    pub const BLACK_LEVEL: u32 = 0xD << 16;
}

/// Wire type of a metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Unsigned 8-bit values (modes, locks, triggers, states)
    Byte,
    /// Signed 32-bit values (regions, ranges, sensitivities)
    I32,
    /// Signed 64-bit values (timing fields, nanoseconds)
    I64,
    /// 32-bit floats (lens physical quantities, curves, gains)
    F32,
    /// Signed 32-bit rationals (color transform coefficients)
    Rational,
}

/// Control metadata tags translated by this driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Tag {
    // Color correction
    ColorCorrectionMode = section::COLOR_CORRECTION,
    ColorCorrectionTransform = section::COLOR_CORRECTION | 0x0001,
    ColorCorrectionGains = section::COLOR_CORRECTION | 0x0002,
    ColorCorrectionAberrationMode = section::COLOR_CORRECTION | 0x0003,

    // Control (3A and scene orchestration)
    ControlMode = section::CONTROL,
    AeAntibandingMode = section::CONTROL | 0x0001,
    AeExposureCompensation = section::CONTROL | 0x0002,
    AeLock = section::CONTROL | 0x0003,
    AeMode = section::CONTROL | 0x0004,
    AeRegions = section::CONTROL | 0x0005,
    AeTargetFpsRange = section::CONTROL | 0x0006,
    AePrecaptureTrigger = section::CONTROL | 0x0007,
    AePrecaptureId = section::CONTROL | 0x0008,
    AfMode = section::CONTROL | 0x0009,
    AfRegions = section::CONTROL | 0x000A,
    AfTrigger = section::CONTROL | 0x000B,
    AfTriggerId = section::CONTROL | 0x000C,
    AwbLock = section::CONTROL | 0x000D,
    AwbMode = section::CONTROL | 0x000E,
    EffectMode = section::CONTROL | 0x000F,
    SceneMode = section::CONTROL | 0x0010,
    VideoStabilizationMode = section::CONTROL | 0x0011,
    AeState = section::CONTROL | 0x0012,
    AfState = section::CONTROL | 0x0013,
    AwbState = section::CONTROL | 0x0014,

    // Demosaic
    DemosaicMode = section::DEMOSAIC,

    // Edge enhancement
    EdgeMode = section::EDGE,
    EdgeStrength = section::EDGE | 0x0001,

    // Flash
    FlashMode = section::FLASH,
    FlashFiringPower = section::FLASH | 0x0001,
    FlashFiringTime = section::FLASH | 0x0002,
    FlashState = section::FLASH | 0x0003,

    // Hot pixel correction
    HotPixelMode = section::HOT_PIXEL,

    // Lens
    LensAperture = section::LENS,
    LensFilterDensity = section::LENS | 0x0001,
    LensFocalLength = section::LENS | 0x0002,
    LensFocusDistance = section::LENS | 0x0003,
    LensOpticalStabilizationMode = section::LENS | 0x0004,
    LensFocusRange = section::LENS | 0x0005,
    LensState = section::LENS | 0x0006,

    // Noise reduction
    NoiseReductionMode = section::NOISE_REDUCTION,
    NoiseReductionStrength = section::NOISE_REDUCTION | 0x0001,

    // Scaler
    ScalerCropRegion = section::SCALER,

    // Sensor
    SensorExposureTime = section::SENSOR,
    SensorFrameDuration = section::SENSOR | 0x0001,
    SensorSensitivity = section::SENSOR | 0x0002,
    SensorTestPatternData = section::SENSOR | 0x0003,
    SensorTestPatternMode = section::SENSOR | 0x0004,
    SensorTimestamp = section::SENSOR | 0x0005,
    SensorRollingShutterSkew = section::SENSOR | 0x0006,

    // Lens shading
    ShadingMode = section::SHADING,
    ShadingStrength = section::SHADING | 0x0001,

    // Statistics
    StatsFaceDetectMode = section::STATISTICS,
    StatsHistogramMode = section::STATISTICS | 0x0001,
    StatsSharpnessMapMode = section::STATISTICS | 0x0002,
    StatsHotPixelMapMode = section::STATISTICS | 0x0003,
    StatsLensShadingMapMode = section::STATISTICS | 0x0004,
    StatsSceneFlicker = section::STATISTICS | 0x0005,

    // Tonemap
    TonemapCurveBlue = section::TONEMAP,
    TonemapCurveGreen = section::TONEMAP | 0x0001,
    TonemapCurveRed = section::TONEMAP | 0x0002,
    TonemapMode = section::TONEMAP | 0x0003,

    // Black level
    BlackLevelLock = section::BLACK_LEVEL,
}

impl Tag {
    /// Numeric tag code as carried on the framework interface.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a tag by its numeric code.
    pub fn from_code(code: u32) -> Option<Self> {
        use Tag::*;
        let tag = match code {
            c if c == ColorCorrectionMode.code() => ColorCorrectionMode,
            c if c == ColorCorrectionTransform.code() => ColorCorrectionTransform,
            c if c == ColorCorrectionGains.code() => ColorCorrectionGains,
            c if c == ColorCorrectionAberrationMode.code() => ColorCorrectionAberrationMode,
            c if c == ControlMode.code() => ControlMode,
            c if c == AeAntibandingMode.code() => AeAntibandingMode,
            c if c == AeExposureCompensation.code() => AeExposureCompensation,
            c if c == AeLock.code() => AeLock,
            c if c == AeMode.code() => AeMode,
            c if c == AeRegions.code() => AeRegions,
            c if c == AeTargetFpsRange.code() => AeTargetFpsRange,
            c if c == AePrecaptureTrigger.code() => AePrecaptureTrigger,
            c if c == AePrecaptureId.code() => AePrecaptureId,
            c if c == AfMode.code() => AfMode,
            c if c == AfRegions.code() => AfRegions,
            c if c == AfTrigger.code() => AfTrigger,
            c if c == AfTriggerId.code() => AfTriggerId,
            c if c == AwbLock.code() => AwbLock,
            c if c == AwbMode.code() => AwbMode,
            c if c == EffectMode.code() => EffectMode,
            c if c == SceneMode.code() => SceneMode,
            c if c == VideoStabilizationMode.code() => VideoStabilizationMode,
            c if c == AeState.code() => AeState,
            c if c == AfState.code() => AfState,
            c if c == AwbState.code() => AwbState,
            c if c == DemosaicMode.code() => DemosaicMode,
            c if c == EdgeMode.code() => EdgeMode,
            c if c == EdgeStrength.code() => EdgeStrength,
            c if c == FlashMode.code() => FlashMode,
            c if c == FlashFiringPower.code() => FlashFiringPower,
            c if c == FlashFiringTime.code() => FlashFiringTime,
            c if c == FlashState.code() => FlashState,
            c if c == HotPixelMode.code() => HotPixelMode,
            c if c == LensAperture.code() => LensAperture,
            c if c == LensFilterDensity.code() => LensFilterDensity,
            c if c == LensFocalLength.code() => LensFocalLength,
            c if c == LensFocusDistance.code() => LensFocusDistance,
            c if c == LensOpticalStabilizationMode.code() => LensOpticalStabilizationMode,
            c if c == LensFocusRange.code() => LensFocusRange,
            c if c == LensState.code() => LensState,
            c if c == NoiseReductionMode.code() => NoiseReductionMode,
            c if c == NoiseReductionStrength.code() => NoiseReductionStrength,
            c if c == ScalerCropRegion.code() => ScalerCropRegion,
            c if c == SensorExposureTime.code() => SensorExposureTime,
            c if c == SensorFrameDuration.code() => SensorFrameDuration,
            c if c == SensorSensitivity.code() => SensorSensitivity,
            c if c == SensorTestPatternData.code() => SensorTestPatternData,
            c if c == SensorTestPatternMode.code() => SensorTestPatternMode,
            c if c == SensorTimestamp.code() => SensorTimestamp,
            c if c == SensorRollingShutterSkew.code() => SensorRollingShutterSkew,
            c if c == ShadingMode.code() => ShadingMode,
            c if c == ShadingStrength.code() => ShadingStrength,
            c if c == StatsFaceDetectMode.code() => StatsFaceDetectMode,
            c if c == StatsHistogramMode.code() => StatsHistogramMode,
            c if c == StatsSharpnessMapMode.code() => StatsSharpnessMapMode,
            c if c == StatsHotPixelMapMode.code() => StatsHotPixelMapMode,
            c if c == StatsLensShadingMapMode.code() => StatsLensShadingMapMode,
            c if c == StatsSceneFlicker.code() => StatsSceneFlicker,
            c if c == TonemapCurveBlue.code() => TonemapCurveBlue,
            c if c == TonemapCurveGreen.code() => TonemapCurveGreen,
            c if c == TonemapCurveRed.code() => TonemapCurveRed,
            c if c == TonemapMode.code() => TonemapMode,
            c if c == BlackLevelLock.code() => BlackLevelLock,
            _ => return None,
        };
        Some(tag)
    }

    /// Expected entry type for this tag.
    pub fn entry_type(self) -> EntryType {
        use Tag::*;
        match self {
            ControlMode | AeAntibandingMode | AeLock | AeMode | AePrecaptureTrigger | AfMode
            | AfTrigger | AwbLock | AwbMode | EffectMode | SceneMode | VideoStabilizationMode
            | AeState | AfState | AwbState | ColorCorrectionMode
            | ColorCorrectionAberrationMode | DemosaicMode | EdgeMode | EdgeStrength
            | FlashMode | FlashFiringPower | FlashState | HotPixelMode
            | LensOpticalStabilizationMode | LensState | NoiseReductionMode
            | NoiseReductionStrength | ShadingMode | ShadingStrength | StatsFaceDetectMode
            | StatsHistogramMode | StatsSharpnessMapMode | StatsHotPixelMapMode
            | StatsLensShadingMapMode | StatsSceneFlicker | TonemapMode | BlackLevelLock
            | SensorTestPatternMode => EntryType::Byte,

            AeExposureCompensation | AeRegions | AeTargetFpsRange | AePrecaptureId
            | AfRegions | AfTriggerId | ScalerCropRegion | SensorSensitivity
            | SensorTestPatternData => EntryType::I32,

            SensorExposureTime | SensorFrameDuration | SensorTimestamp
            | SensorRollingShutterSkew | FlashFiringTime => EntryType::I64,

            LensAperture | LensFilterDensity | LensFocalLength | LensFocusDistance
            | LensFocusRange | ColorCorrectionGains | TonemapCurveBlue | TonemapCurveGreen
            | TonemapCurveRed => EntryType::F32,

            ColorCorrectionTransform => EntryType::Rational,
        }
    }
}
