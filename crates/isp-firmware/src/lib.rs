//! ISP Firmware Interface
//!
//! Defines the binary ABI shared with the ISP firmware: the fixed-layout
//! frame-control command and per-frame result structures with their
//! bit-tagged valid masks, the submission boundary trait, the command-slot
//! correlation-handle allocator, and an in-process mock firmware used by the
//! pipeline tests.

mod channel;
mod command;
mod result;

pub use channel::{CommandSlots, FirmwareChannel, FwStatus, MockFirmware, SubmitError};
pub use command::{
    mask, values, FwAeControl, FwAfControl, FwAwbControl, FwBufferDesc, FwFlashControl,
    FwFocusWindow, FwFrameControl, FwImageControl, FwLensControl, FwSceneControl,
    FwSensorControl, FwStatsControl, FwTonemapControl, FwWindow, FW_MAX_EXPOSURE_WINDOWS,
    FW_MAX_FOCUS_WINDOWS, FW_MAX_OUTPUT_BUFFERS, FW_TONEMAP_POINTS, FW_TONEMAP_SCALE,
};
pub use result::{FwEvent, FwFrameResult};
