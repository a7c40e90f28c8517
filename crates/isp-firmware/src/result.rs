//! Frame result layout and completion events

use crate::command::{
    FwFocusWindow, FwWindow, FW_MAX_EXPOSURE_WINDOWS, FW_MAX_FOCUS_WINDOWS,
};

/// Per-frame result reported by the firmware.
///
/// Same ABI discipline as the command: fixed layout, microsecond timing,
/// 1000-based gains, x100 lens units. `buffer_error_mask` has bit `i` set
/// when output buffer `i` of the originating command failed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FwFrameResult {
    /// Correlation handle of the originating command slot.
    pub handle: u64,
    pub fc_id: u32,
    pub profile_id: u32,
    /// Bit-tagged mask of result groups present, same bit layout as the
    /// command mask.
    pub valid_mask: u64,
    /// Start-of-exposure timestamp, nanoseconds.
    pub timestamp_ns: u64,
    pub exposure_us: u32,
    pub frame_duration_us: u32,
    pub gain_code: u32,
    pub rolling_shutter_skew_us: u32,
    pub ae_state: u8,
    pub af_state: u8,
    pub awb_state: u8,
    pub flash_state: u8,
    pub lens_state: u8,
    pub scene_flicker: u8,
    pub reserved: [u8; 2],
    pub precapture_id: u32,
    pub af_trigger_id: u32,
    /// Diopters x100.
    pub focus_units: u32,
    pub focus_range_near_x100: u32,
    pub focus_range_far_x100: u32,
    /// R, G_even, G_odd, B gains applied by AWB, x1000.
    pub awb_gains: [u32; 4],
    pub ae_window_count: u32,
    pub ae_windows: [FwWindow; FW_MAX_EXPOSURE_WINDOWS],
    pub af_window_count: u32,
    pub af_windows: [FwFocusWindow; FW_MAX_FOCUS_WINDOWS],
    pub buffer_count: u32,
    pub buffer_error_mask: u32,
}

/// Completion event delivered by the firmware transport.
///
/// A shutter event precedes the frame-done event for the same handle and
/// carries only the start-of-exposure timestamp.
#[derive(Debug, Clone)]
pub enum FwEvent {
    Shutter {
        handle: u64,
        camera_id: u32,
        timestamp_ns: u64,
    },
    FrameDone {
        handle: u64,
        camera_id: u32,
        result: Box<FwFrameResult>,
    },
}

impl FwEvent {
    pub fn handle(&self) -> u64 {
        match self {
            FwEvent::Shutter { handle, .. } => *handle,
            FwEvent::FrameDone { handle, .. } => *handle,
        }
    }

    pub fn camera_id(&self) -> u32 {
        match self {
            FwEvent::Shutter { camera_id, .. } => *camera_id,
            FwEvent::FrameDone { camera_id, .. } => *camera_id,
        }
    }
}
