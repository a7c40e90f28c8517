//! Frame-control command layout (firmware ABI)
//!
//! These structures are submitted to the ISP firmware verbatim. Field order,
//! widths, and unit conventions are a binary contract and must not change
//! without a firmware interface revision.
//!
//! Unit conventions:
//! - timing fields are microseconds (`u32`)
//! - gains are 1000-based fixed point (gain 1.0 == 1000; ISO 100 == 1000)
//! - exposure compensation is millis of an EV (1/1000 EV)
//! - lens focus is diopters x100; aperture, focal length and filter density
//!   are their physical value x100
//! - tonemap curve samples are fixed point 0..=[`FW_TONEMAP_SCALE`]
//! - color transform coefficients are Q16.16 fixed point

/// Maximum exposure metering windows per command.
pub const FW_MAX_EXPOSURE_WINDOWS: usize = 3;
/// Maximum focus windows per command.
pub const FW_MAX_FOCUS_WINDOWS: usize = 3;
/// Maximum output buffers per command.
pub const FW_MAX_OUTPUT_BUFFERS: usize = 8;
/// Tonemap curve samples per channel.
pub const FW_TONEMAP_POINTS: usize = 32;
/// Full-scale value of a tonemap curve sample.
pub const FW_TONEMAP_SCALE: u16 = 1024;

/// Valid-mask bit assignments for [`FwFrameControl::valid_mask`].
///
/// A set bit tells the firmware to latch that field group from this command;
/// clear groups keep their previously programmed values.
pub mod mask {
    pub const CONTROL_MODE: u64 = 1 << 0;
    pub const SCENE_MODE: u64 = 1 << 1;
    pub const EFFECT_MODE: u64 = 1 << 2;
    pub const VIDEO_STABILIZATION: u64 = 1 << 3;
    pub const AE_MODE: u64 = 1 << 4;
    pub const AE_LOCK: u64 = 1 << 5;
    pub const AE_ANTIBANDING: u64 = 1 << 6;
    pub const AE_EV_COMPENSATION: u64 = 1 << 7;
    pub const AE_FPS_RANGE: u64 = 1 << 8;
    pub const AE_REGIONS: u64 = 1 << 9;
    pub const AE_TRIGGER: u64 = 1 << 10;
    pub const AF_MODE: u64 = 1 << 11;
    pub const AF_REGIONS: u64 = 1 << 12;
    pub const AF_TRIGGER: u64 = 1 << 13;
    pub const AWB_MODE: u64 = 1 << 14;
    pub const AWB_LOCK: u64 = 1 << 15;
    pub const SENSOR_EXPOSURE: u64 = 1 << 16;
    pub const SENSOR_FRAME_DURATION: u64 = 1 << 17;
    pub const SENSOR_GAIN: u64 = 1 << 18;
    pub const TEST_PATTERN: u64 = 1 << 19;
    pub const LENS_FOCUS: u64 = 1 << 20;
    pub const LENS_APERTURE: u64 = 1 << 21;
    pub const LENS_FILTER_DENSITY: u64 = 1 << 22;
    pub const LENS_FOCAL_LENGTH: u64 = 1 << 23;
    pub const LENS_OIS: u64 = 1 << 24;
    pub const FLASH: u64 = 1 << 25;
    pub const TONEMAP_MODE: u64 = 1 << 26;
    pub const TONEMAP_CURVE: u64 = 1 << 27;
    pub const CC_MODE: u64 = 1 << 28;
    pub const CC_TRANSFORM: u64 = 1 << 29;
    pub const CC_GAINS: u64 = 1 << 30;
    pub const CC_ABERRATION: u64 = 1 << 31;
    pub const NOISE_REDUCTION: u64 = 1 << 32;
    pub const EDGE: u64 = 1 << 33;
    pub const SHADING: u64 = 1 << 34;
    pub const HOT_PIXEL: u64 = 1 << 35;
    pub const DEMOSAIC: u64 = 1 << 36;
    pub const SCALER_CROP: u64 = 1 << 37;
    pub const BLACK_LEVEL_LOCK: u64 = 1 << 38;
    pub const STATS_FACE_DETECT: u64 = 1 << 39;
    pub const STATS_HISTOGRAM: u64 = 1 << 40;
    pub const STATS_SHARPNESS_MAP: u64 = 1 << 41;
    pub const STATS_HOT_PIXEL_MAP: u64 = 1 << 42;
    pub const STATS_LENS_SHADING_MAP: u64 = 1 << 43;
}

/// Firmware encodings for enumerated fields.
pub mod values {
    // 3A orchestration
    pub const CTRL_OFF: u8 = 0;
    pub const CTRL_AUTO: u8 = 1;
    pub const CTRL_SCENE: u8 = 2;

    // Auto exposure
    pub const AE_OFF: u8 = 0;
    pub const AE_ON: u8 = 1;
    pub const AE_ON_AUTO_FLASH: u8 = 2;
    pub const AE_ON_ALWAYS_FLASH: u8 = 3;
    pub const AE_ON_AUTO_FLASH_REDEYE: u8 = 4;

    pub const BANDING_OFF: u8 = 0;
    pub const BANDING_50HZ: u8 = 1;
    pub const BANDING_60HZ: u8 = 2;
    pub const BANDING_AUTO: u8 = 3;

    // Auto focus
    pub const AF_FIXED: u8 = 0;
    pub const AF_AUTO: u8 = 1;
    pub const AF_MACRO: u8 = 2;
    pub const AF_CONTINUOUS_VIDEO: u8 = 3;
    pub const AF_CONTINUOUS_PICTURE: u8 = 4;
    pub const AF_EDOF: u8 = 5;

    // Auto white balance
    pub const AWB_OFF: u8 = 0;
    pub const AWB_AUTO: u8 = 1;
    pub const AWB_INCANDESCENT: u8 = 2;
    pub const AWB_FLUORESCENT: u8 = 3;
    pub const AWB_WARM_FLUORESCENT: u8 = 4;
    pub const AWB_DAYLIGHT: u8 = 5;
    pub const AWB_CLOUDY: u8 = 6;
    pub const AWB_TWILIGHT: u8 = 7;
    pub const AWB_SHADE: u8 = 8;

    // Scene presets
    pub const SCENE_DISABLED: u8 = 0;
    pub const SCENE_ACTION: u8 = 1;
    pub const SCENE_PORTRAIT: u8 = 2;
    pub const SCENE_LANDSCAPE: u8 = 3;
    pub const SCENE_NIGHT: u8 = 4;
    pub const SCENE_NIGHT_PORTRAIT: u8 = 5;
    pub const SCENE_THEATRE: u8 = 6;
    pub const SCENE_BEACH: u8 = 7;
    pub const SCENE_SNOW: u8 = 8;
    pub const SCENE_SUNSET: u8 = 9;
    pub const SCENE_STEADYPHOTO: u8 = 10;
    pub const SCENE_FIREWORKS: u8 = 11;
    pub const SCENE_SPORTS: u8 = 12;
    pub const SCENE_PARTY: u8 = 13;
    pub const SCENE_CANDLELIGHT: u8 = 14;
    pub const SCENE_BARCODE: u8 = 15;

    // Color effects
    pub const EFFECT_OFF: u8 = 0;
    pub const EFFECT_MONO: u8 = 1;
    pub const EFFECT_NEGATIVE: u8 = 2;
    pub const EFFECT_SOLARIZE: u8 = 3;
    pub const EFFECT_SEPIA: u8 = 4;
    pub const EFFECT_POSTERIZE: u8 = 5;
    pub const EFFECT_WHITEBOARD: u8 = 6;
    pub const EFFECT_BLACKBOARD: u8 = 7;
    pub const EFFECT_AQUA: u8 = 8;

    // Triggers
    pub const TRIGGER_IDLE: u8 = 0;
    pub const TRIGGER_START: u8 = 1;
    pub const TRIGGER_CANCEL: u8 = 2;

    // Test patterns
    pub const PATTERN_OFF: u8 = 0;
    pub const PATTERN_SOLID_COLOR: u8 = 1;
    pub const PATTERN_COLOR_BARS: u8 = 2;
    pub const PATTERN_COLOR_BARS_FADE: u8 = 3;
    pub const PATTERN_PN9: u8 = 4;

    // Flash
    pub const FLASH_OFF: u8 = 0;
    pub const FLASH_SINGLE: u8 = 1;
    pub const FLASH_TORCH: u8 = 2;

    // Tonemap
    pub const TONEMAP_CONTRAST_CURVE: u8 = 0;
    pub const TONEMAP_FAST: u8 = 1;
    pub const TONEMAP_HQ: u8 = 2;

    // Shared off/fast/high-quality ladder (NR, edge, shading, hot pixel,
    // chromatic aberration)
    pub const PROC_OFF: u8 = 0;
    pub const PROC_FAST: u8 = 1;
    pub const PROC_HQ: u8 = 2;

    // Color correction
    pub const CC_TRANSFORM_MATRIX: u8 = 0;
    pub const CC_FAST: u8 = 1;
    pub const CC_HQ: u8 = 2;

    // Demosaic
    pub const DEMOSAIC_FAST: u8 = 0;
    pub const DEMOSAIC_HQ: u8 = 1;

    // Face detection
    pub const FD_OFF: u8 = 0;
    pub const FD_SIMPLE: u8 = 1;
    pub const FD_FULL: u8 = 2;

    // Statistics switches
    pub const STATS_DISABLE: u8 = 0;
    pub const STATS_ENABLE: u8 = 1;

    // Result states
    pub const AE_STATE_INACTIVE: u8 = 0;
    pub const AE_STATE_SEARCHING: u8 = 1;
    pub const AE_STATE_CONVERGED: u8 = 2;
    pub const AE_STATE_LOCKED: u8 = 3;
    pub const AE_STATE_FLASH_REQUIRED: u8 = 4;
    pub const AE_STATE_PRECAPTURE: u8 = 5;

    pub const AF_STATE_INACTIVE: u8 = 0;
    pub const AF_STATE_PASSIVE_SCAN: u8 = 1;
    pub const AF_STATE_PASSIVE_FOCUSED: u8 = 2;
    pub const AF_STATE_ACTIVE_SCAN: u8 = 3;
    pub const AF_STATE_FOCUSED: u8 = 4;
    pub const AF_STATE_NOT_FOCUSED: u8 = 5;
    pub const AF_STATE_PASSIVE_UNFOCUSED: u8 = 6;

    pub const AWB_STATE_INACTIVE: u8 = 0;
    pub const AWB_STATE_SEARCHING: u8 = 1;
    pub const AWB_STATE_CONVERGED: u8 = 2;
    pub const AWB_STATE_LOCKED: u8 = 3;

    pub const FLASH_STATE_UNAVAILABLE: u8 = 0;
    pub const FLASH_STATE_CHARGING: u8 = 1;
    pub const FLASH_STATE_READY: u8 = 2;
    pub const FLASH_STATE_FIRED: u8 = 3;
    pub const FLASH_STATE_PARTIAL: u8 = 4;

    pub const LENS_STATIONARY: u8 = 0;
    pub const LENS_MOVING: u8 = 1;

    pub const FLICKER_NONE: u8 = 0;
    pub const FLICKER_50HZ: u8 = 1;
    pub const FLICKER_60HZ: u8 = 2;
}

/// Rectangular window in firmware (binning-adjusted) coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwWindow {
    pub h_offset: u32,
    pub v_offset: u32,
    pub h_size: u32,
    pub v_size: u32,
}

/// Weighted focus window in firmware coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwFocusWindow {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
    pub weight: u32,
}

/// Output buffer descriptor handed to the firmware with the command.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwBufferDesc {
    pub address: u64,
    pub fourcc: u32,
    pub stride: u32,
    pub width: u32,
    pub height: u32,
}

/// Scene orchestration fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwSceneControl {
    pub control_mode: u8,
    pub scene_mode: u8,
    pub effect_mode: u8,
    pub video_stabilization: u8,
}

/// Auto-exposure engine fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwAeControl {
    pub mode: u8,
    pub lock: u8,
    pub precapture_trigger: u8,
    pub antibanding: u8,
    /// 1/1000 EV
    pub ev_compensation_millis: i32,
    /// Frame duration bounds derived from the target fps range, microseconds.
    pub frame_duration_min_us: u32,
    pub frame_duration_max_us: u32,
    pub window_count: u32,
    pub windows: [FwWindow; FW_MAX_EXPOSURE_WINDOWS],
    pub precapture_id: u32,
}

/// Auto-focus engine fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwAfControl {
    pub mode: u8,
    pub trigger: u8,
    pub reserved: [u8; 2],
    pub window_count: u32,
    pub windows: [FwFocusWindow; FW_MAX_FOCUS_WINDOWS],
    pub trigger_id: u32,
}

/// Auto-white-balance engine fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwAwbControl {
    pub mode: u8,
    pub lock: u8,
    pub reserved: [u8; 2],
}

/// Sensor programming fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwSensorControl {
    pub exposure_us: u32,
    pub frame_duration_us: u32,
    /// 1000-based fixed-point analog gain (ISO 100 == 1000).
    pub gain_code: u32,
    pub test_pattern: u8,
    pub reserved: [u8; 3],
    pub test_pattern_data: [u32; 4],
}

/// Lens actuator fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwLensControl {
    /// Diopters x100.
    pub focus_units: u32,
    pub aperture_x100: u32,
    pub filter_density_x100: u32,
    pub focal_length_x100: u32,
    pub ois_enable: u8,
    pub reserved: [u8; 3],
}

/// Flash unit fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwFlashControl {
    pub mode: u8,
    pub power: u8,
    pub reserved: [u8; 2],
    pub firing_time_us: u32,
}

/// Tonemap curve fields. Samples are fixed point 0..=[`FW_TONEMAP_SCALE`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwTonemapControl {
    pub mode: u8,
    pub reserved: [u8; 3],
    pub point_count: u32,
    pub curve_red: [u16; FW_TONEMAP_POINTS],
    pub curve_green: [u16; FW_TONEMAP_POINTS],
    pub curve_blue: [u16; FW_TONEMAP_POINTS],
}

/// Image processing block fields (color correction, noise reduction, edge,
/// shading, hot pixel, demosaic, black level).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwImageControl {
    pub cc_mode: u8,
    pub cc_aberration_mode: u8,
    pub nr_mode: u8,
    pub nr_strength: u8,
    pub edge_mode: u8,
    pub edge_strength: u8,
    pub shading_mode: u8,
    pub shading_strength: u8,
    pub hot_pixel_mode: u8,
    pub demosaic_mode: u8,
    pub black_level_lock: u8,
    pub reserved: u8,
    /// Row-major 3x3, Q16.16.
    pub cc_transform_q16: [i32; 9],
    /// R, G_even, G_odd, B gains, x1000.
    pub cc_gains: [u32; 4],
}

/// Statistics generation switches, re-read by the firmware every request.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwStatsControl {
    pub face_detect_mode: u8,
    pub histogram_enable: u8,
    pub sharpness_map_enable: u8,
    pub hot_pixel_map_enable: u8,
    pub lens_shading_map_enable: u8,
    pub reserved: [u8; 3],
}

/// The per-request frame-control command submitted to the ISP firmware.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FwFrameControl {
    /// Device memory address of this command slot; echoed back in the
    /// completion as the correlation handle.
    pub handle: u64,
    /// Zero-based per-stream frame-control id.
    pub fc_id: u32,
    pub profile_id: u32,
    /// Bit-tagged valid mask, see [`mask`].
    pub valid_mask: u64,
    pub scene: FwSceneControl,
    pub ae: FwAeControl,
    pub af: FwAfControl,
    pub awb: FwAwbControl,
    pub sensor: FwSensorControl,
    pub lens: FwLensControl,
    pub flash: FwFlashControl,
    pub tonemap: FwTonemapControl,
    pub image: FwImageControl,
    pub stats: FwStatsControl,
    /// Output crop in firmware coordinates.
    pub crop: FwWindow,
    pub buffer_count: u32,
    pub buffers: [FwBufferDesc; FW_MAX_OUTPUT_BUFFERS],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_bits_distinct() {
        let bits = [
            mask::CONTROL_MODE,
            mask::AE_MODE,
            mask::AE_REGIONS,
            mask::AF_REGIONS,
            mask::SENSOR_EXPOSURE,
            mask::TONEMAP_CURVE,
            mask::STATS_LENS_SHADING_MAP,
        ];
        let mut seen = 0u64;
        for b in bits {
            assert_eq!(b.count_ones(), 1);
            assert_eq!(seen & b, 0);
            seen |= b;
        }
    }

    #[test]
    fn test_default_command_is_all_clear() {
        let cmd = FwFrameControl::default();
        assert_eq!(cmd.valid_mask, 0);
        assert_eq!(cmd.ae.window_count, 0);
        assert_eq!(cmd.buffer_count, 0);
    }
}
