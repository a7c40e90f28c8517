//! Framework-side control vocabulary
//!
//! Typed views of the byte-encoded enumeration tags. The translator matches
//! on these exhaustively so that adding a variant forces both mapping
//! directions to be revisited.

use serde::{Deserialize, Serialize};

/// Top-level 3A orchestration mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlMode {
    Off = 0,
    Auto = 1,
    UseSceneMode = 2,
}

impl ControlMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::Auto),
            2 => Some(Self::UseSceneMode),
            _ => None,
        }
    }
}

/// Auto-exposure operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AeMode {
    Off = 0,
    On = 1,
    OnAutoFlash = 2,
    OnAlwaysFlash = 3,
    OnAutoFlashRedeye = 4,
}

impl AeMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::On),
            2 => Some(Self::OnAutoFlash),
            3 => Some(Self::OnAlwaysFlash),
            4 => Some(Self::OnAutoFlashRedeye),
            _ => None,
        }
    }
}

/// Flicker-avoidance mode for auto-exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AntibandingMode {
    Off = 0,
    Hz50 = 1,
    Hz60 = 2,
    Auto = 3,
}

impl AntibandingMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::Hz50),
            2 => Some(Self::Hz60),
            3 => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Auto-focus operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AfMode {
    Off = 0,
    Auto = 1,
    Macro = 2,
    ContinuousVideo = 3,
    ContinuousPicture = 4,
    Edof = 5,
}

impl AfMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::Auto),
            2 => Some(Self::Macro),
            3 => Some(Self::ContinuousVideo),
            4 => Some(Self::ContinuousPicture),
            5 => Some(Self::Edof),
            _ => None,
        }
    }
}

/// Auto-white-balance operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AwbMode {
    Off = 0,
    Auto = 1,
    Incandescent = 2,
    Fluorescent = 3,
    WarmFluorescent = 4,
    Daylight = 5,
    CloudyDaylight = 6,
    Twilight = 7,
    Shade = 8,
}

impl AwbMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::Auto),
            2 => Some(Self::Incandescent),
            3 => Some(Self::Fluorescent),
            4 => Some(Self::WarmFluorescent),
            5 => Some(Self::Daylight),
            6 => Some(Self::CloudyDaylight),
            7 => Some(Self::Twilight),
            8 => Some(Self::Shade),
            _ => None,
        }
    }
}

/// Scene preset applied when `ControlMode::UseSceneMode` is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SceneMode {
    Disabled = 0,
    Action = 1,
    Portrait = 2,
    Landscape = 3,
    Night = 4,
    NightPortrait = 5,
    Theatre = 6,
    Beach = 7,
    Snow = 8,
    Sunset = 9,
    SteadyPhoto = 10,
    Fireworks = 11,
    Sports = 12,
    Party = 13,
    Candlelight = 14,
    Barcode = 15,
}

impl SceneMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Disabled),
            1 => Some(Self::Action),
            2 => Some(Self::Portrait),
            3 => Some(Self::Landscape),
            4 => Some(Self::Night),
            5 => Some(Self::NightPortrait),
            6 => Some(Self::Theatre),
            7 => Some(Self::Beach),
            8 => Some(Self::Snow),
            9 => Some(Self::Sunset),
            10 => Some(Self::SteadyPhoto),
            11 => Some(Self::Fireworks),
            12 => Some(Self::Sports),
            13 => Some(Self::Party),
            14 => Some(Self::Candlelight),
            15 => Some(Self::Barcode),
            _ => None,
        }
    }
}

/// Color effect applied by the processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EffectMode {
    Off = 0,
    Mono = 1,
    Negative = 2,
    Solarize = 3,
    Sepia = 4,
    Posterize = 5,
    Whiteboard = 6,
    Blackboard = 7,
    Aqua = 8,
}

impl EffectMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::Mono),
            2 => Some(Self::Negative),
            3 => Some(Self::Solarize),
            4 => Some(Self::Sepia),
            5 => Some(Self::Posterize),
            6 => Some(Self::Whiteboard),
            7 => Some(Self::Blackboard),
            8 => Some(Self::Aqua),
            _ => None,
        }
    }
}

/// Electronic video stabilization switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum VideoStabilizationMode {
    Off = 0,
    On = 1,
}

impl VideoStabilizationMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::On),
            _ => None,
        }
    }
}

/// Trigger value shared by the precapture and focus triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TriggerValue {
    #[default]
    Idle = 0,
    Start = 1,
    Cancel = 2,
}

impl TriggerValue {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Idle),
            1 => Some(Self::Start),
            2 => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Tonemapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TonemapMode {
    ContrastCurve = 0,
    Fast = 1,
    HighQuality = 2,
}

impl TonemapMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::ContrastCurve),
            1 => Some(Self::Fast),
            2 => Some(Self::HighQuality),
            _ => None,
        }
    }
}

/// Sensor test pattern generator mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TestPatternMode {
    Off = 0,
    SolidColor = 1,
    ColorBars = 2,
    ColorBarsFadeToGray = 3,
    Pn9 = 4,
}

impl TestPatternMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::SolidColor),
            2 => Some(Self::ColorBars),
            3 => Some(Self::ColorBarsFadeToGray),
            4 => Some(Self::Pn9),
            _ => None,
        }
    }
}

/// Flash unit mode for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlashMode {
    Off = 0,
    Single = 1,
    Torch = 2,
}

impl FlashMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::Single),
            2 => Some(Self::Torch),
            _ => None,
        }
    }
}

/// Off / fast / high-quality ladder shared by the correction blocks
/// (noise reduction, edge, shading, hot pixel, chromatic aberration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProcessingMode {
    Off = 0,
    Fast = 1,
    HighQuality = 2,
}

impl ProcessingMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::Fast),
            2 => Some(Self::HighQuality),
            _ => None,
        }
    }
}

/// Color correction matrix source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColorCorrectionMode {
    TransformMatrix = 0,
    Fast = 1,
    HighQuality = 2,
}

impl ColorCorrectionMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::TransformMatrix),
            1 => Some(Self::Fast),
            2 => Some(Self::HighQuality),
            _ => None,
        }
    }
}

/// Demosaic quality selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DemosaicMode {
    Fast = 0,
    HighQuality = 1,
}

impl DemosaicMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Fast),
            1 => Some(Self::HighQuality),
            _ => None,
        }
    }
}

/// Face detector operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FaceDetectMode {
    Off = 0,
    Simple = 1,
    Full = 2,
}

impl FaceDetectMode {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Off),
            1 => Some(Self::Simple),
            2 => Some(Self::Full),
            _ => None,
        }
    }
}

// Dynamic states reported back by the firmware.

/// Auto-exposure convergence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AeState {
    Inactive = 0,
    Searching = 1,
    Converged = 2,
    Locked = 3,
    FlashRequired = 4,
    Precapture = 5,
}

/// Auto-focus scan state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AfState {
    Inactive = 0,
    PassiveScan = 1,
    PassiveFocused = 2,
    ActiveScan = 3,
    FocusedLocked = 4,
    NotFocusedLocked = 5,
    PassiveUnfocused = 6,
}

/// Auto-white-balance convergence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AwbState {
    Inactive = 0,
    Searching = 1,
    Converged = 2,
    Locked = 3,
}

/// Flash unit hardware state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlashState {
    Unavailable = 0,
    Charging = 1,
    Ready = 2,
    Fired = 3,
    Partial = 4,
}

/// Lens actuator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LensState {
    Stationary = 0,
    Moving = 1,
}

/// Flicker frequency detected in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SceneFlicker {
    None = 0,
    Hz50 = 1,
    Hz60 = 2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trips() {
        assert_eq!(AeMode::from_byte(AeMode::OnAutoFlash as u8), Some(AeMode::OnAutoFlash));
        assert_eq!(AwbMode::from_byte(AwbMode::Shade as u8), Some(AwbMode::Shade));
        assert_eq!(SceneMode::from_byte(SceneMode::Barcode as u8), Some(SceneMode::Barcode));
    }

    #[test]
    fn test_unknown_bytes_rejected() {
        assert_eq!(AeMode::from_byte(200), None);
        assert_eq!(AfMode::from_byte(6), None);
        assert_eq!(TriggerValue::from_byte(3), None);
    }
}
