//! Firmware submission boundary and mock firmware
//!
//! The real transport (shared-memory mailbox to the ISP) lives outside this
//! repository; the [`FirmwareChannel`] trait is the seam. [`MockFirmware`]
//! implements the same contract in-process: it latches delta commands the
//! way the hardware does, synthesizes per-frame results from the latched
//! state, and delivers completions over a channel so tests can exercise the
//! asynchronous completion path, including out-of-order delivery.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::command::{mask, values, FwFrameControl};
use crate::result::{FwEvent, FwFrameResult};

/// Numeric status codes returned by the firmware mailbox.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FwStatus {
    Ok = 0,
    Busy = -1,
    BadCommand = -2,
    BadHandle = -3,
    NoMemory = -4,
    Fatal = -9,
    Unknown = -99,
}

impl From<i32> for FwStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            -1 => Self::Busy,
            -2 => Self::BadCommand,
            -3 => Self::BadHandle,
            -4 => Self::NoMemory,
            -9 => Self::Fatal,
            _ => Self::Unknown,
        }
    }
}

/// Errors surfaced synchronously by command submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Firmware interface not attached or not streaming
    #[error("firmware interface not ready")]
    NotReady,

    /// No free command slot
    #[error("firmware command queue full")]
    QueueFull,

    /// Firmware rejected the command
    #[error("firmware rejected command: {0:?}")]
    Rejected(FwStatus),

    /// Completion channel closed (consumer gone)
    #[error("completion channel closed")]
    ChannelClosed,
}

/// Submission side of the firmware boundary.
///
/// Completions arrive asynchronously as [`FwEvent`]s on the channel handed
/// out by the transport; a submission must never block on them.
pub trait FirmwareChannel: Send + Sync {
    fn submit(&self, camera_id: u32, command: &FwFrameControl) -> Result<(), SubmitError>;
}

/// Fixed pool of firmware command slots.
///
/// Each slot is a region of device memory; its address doubles as the
/// correlation handle the firmware echoes back in completions. Handles are
/// unique among outstanding commands by construction and recycled on
/// release.
pub struct CommandSlots {
    base: u64,
    slot_size: u64,
    count: usize,
    free: Mutex<Vec<u64>>,
}

impl CommandSlots {
    pub fn new(base: u64, slot_size: u64, count: usize) -> Self {
        // Reverse order so acquire hands out ascending addresses first.
        let free = (0..count as u64).rev().map(|i| base + i * slot_size).collect();
        Self {
            base,
            slot_size,
            count,
            free: Mutex::new(free),
        }
    }

    /// Claim a slot address, or `None` when all slots are outstanding.
    pub fn acquire(&self) -> Option<u64> {
        self.free.lock().expect("slot lock poisoned").pop()
    }

    /// Return a slot to the pool. Rejects addresses outside the pool and
    /// double releases.
    pub fn release(&self, handle: u64) -> bool {
        if handle < self.base
            || handle >= self.base + self.count as u64 * self.slot_size
            || (handle - self.base) % self.slot_size != 0
        {
            warn!(handle, "release of foreign command slot ignored");
            return false;
        }
        let mut free = self.free.lock().expect("slot lock poisoned");
        if free.contains(&handle) {
            warn!(handle, "double release of command slot ignored");
            return false;
        }
        free.push(handle);
        true
    }

    pub fn capacity(&self) -> usize {
        self.count
    }

    pub fn available(&self) -> usize {
        self.free.lock().expect("slot lock poisoned").len()
    }
}

/// A submitted command awaiting completion inside the mock.
#[derive(Debug, Clone, Copy)]
struct PendingFrame {
    camera_id: u32,
    handle: u64,
    fc_id: u32,
    profile_id: u32,
    buffer_count: u32,
}

#[derive(Default)]
struct MockState {
    /// Latched register state per camera, merged by valid mask.
    applied: HashMap<u32, FwFrameControl>,
    pending: VecDeque<PendingFrame>,
    fail_next: Option<FwStatus>,
    buffer_error_mask: u32,
    frame_clock_ns: u64,
}

/// In-process firmware model.
///
/// Completion order is controlled by the caller: [`MockFirmware::fire_next`]
/// completes in submission order, [`MockFirmware::fire_handle`] completes a
/// specific command to simulate out-of-order hardware behavior.
pub struct MockFirmware {
    events: mpsc::Sender<FwEvent>,
    state: Mutex<MockState>,
}

impl MockFirmware {
    /// Create the mock and the completion channel consumed by the driver.
    pub fn new(event_capacity: usize) -> (Arc<Self>, mpsc::Receiver<FwEvent>) {
        let (tx, rx) = mpsc::channel(event_capacity);
        let fw = Arc::new(Self {
            events: tx,
            state: Mutex::new(MockState::default()),
        });
        (fw, rx)
    }

    /// Number of submitted commands not yet completed.
    pub fn pending(&self) -> usize {
        self.state.lock().expect("mock lock poisoned").pending.len()
    }

    /// Make the next submission fail with the given status.
    pub fn set_fail_next(&self, status: FwStatus) {
        self.state.lock().expect("mock lock poisoned").fail_next = Some(status);
    }

    /// Per-buffer error bits reported in subsequent results.
    pub fn set_buffer_error_mask(&self, mask: u32) {
        self.state.lock().expect("mock lock poisoned").buffer_error_mask = mask;
    }

    /// Latched register state for a camera, as the firmware sees it.
    pub fn applied(&self, camera_id: u32) -> Option<FwFrameControl> {
        self.state
            .lock()
            .expect("mock lock poisoned")
            .applied
            .get(&camera_id)
            .copied()
    }

    /// Complete the oldest pending command. Returns false when idle.
    pub fn fire_next(&self) -> bool {
        let mut state = self.state.lock().expect("mock lock poisoned");
        match state.pending.pop_front() {
            Some(frame) => {
                self.deliver(&mut state, frame);
                true
            }
            None => false,
        }
    }

    /// Complete the pending command with the given handle, regardless of its
    /// position in the submission order.
    pub fn fire_handle(&self, handle: u64) -> bool {
        let mut state = self.state.lock().expect("mock lock poisoned");
        let Some(pos) = state.pending.iter().position(|p| p.handle == handle) else {
            return false;
        };
        match state.pending.remove(pos) {
            Some(frame) => {
                self.deliver(&mut state, frame);
                true
            }
            None => false,
        }
    }

    /// Complete everything pending, in submission order.
    pub fn fire_all(&self) -> usize {
        let mut fired = 0;
        while self.fire_next() {
            fired += 1;
        }
        fired
    }

    fn deliver(&self, state: &mut MockState, frame: PendingFrame) {
        let result = Self::synthesize(state, &frame);
        let shutter = FwEvent::Shutter {
            handle: frame.handle,
            camera_id: frame.camera_id,
            timestamp_ns: result.timestamp_ns,
        };
        let done = FwEvent::FrameDone {
            handle: frame.handle,
            camera_id: frame.camera_id,
            result: Box::new(result),
        };
        for event in [shutter, done] {
            if self.events.try_send(event).is_err() {
                warn!(
                    handle = frame.handle,
                    "completion channel full or closed, event dropped"
                );
            }
        }
    }

    /// Build a frame result from the latched state, advancing the frame
    /// clock by one frame duration.
    fn synthesize(state: &mut MockState, frame: &PendingFrame) -> FwFrameResult {
        let applied = state.applied.get(&frame.camera_id).copied().unwrap_or_default();

        let frame_duration_us = if applied.sensor.frame_duration_us != 0 {
            applied.sensor.frame_duration_us
        } else {
            33_333
        };
        state.frame_clock_ns += u64::from(frame_duration_us) * 1_000;

        let ae_state = if applied.ae.lock != 0 {
            values::AE_STATE_LOCKED
        } else if applied.ae.mode == values::AE_OFF {
            values::AE_STATE_INACTIVE
        } else {
            values::AE_STATE_CONVERGED
        };
        let af_state = match applied.af.mode {
            values::AF_FIXED => values::AF_STATE_INACTIVE,
            values::AF_CONTINUOUS_VIDEO | values::AF_CONTINUOUS_PICTURE => {
                values::AF_STATE_PASSIVE_FOCUSED
            }
            _ if applied.af.trigger == values::TRIGGER_START => values::AF_STATE_FOCUSED,
            _ => values::AF_STATE_INACTIVE,
        };
        let awb_state = if applied.awb.lock != 0 {
            values::AWB_STATE_LOCKED
        } else if applied.awb.mode == values::AWB_OFF {
            values::AWB_STATE_INACTIVE
        } else {
            values::AWB_STATE_CONVERGED
        };
        let flash_state = if applied.flash.mode == values::FLASH_OFF {
            values::FLASH_STATE_READY
        } else {
            values::FLASH_STATE_FIRED
        };
        let scene_flicker = match applied.ae.antibanding {
            values::BANDING_50HZ => values::FLICKER_50HZ,
            values::BANDING_60HZ => values::FLICKER_60HZ,
            _ => values::FLICKER_NONE,
        };
        let awb_gains = if applied.awb.mode == values::AWB_OFF {
            [1000; 4]
        } else {
            [1450, 1000, 1000, 1520]
        };

        FwFrameResult {
            handle: frame.handle,
            fc_id: frame.fc_id,
            profile_id: frame.profile_id,
            valid_mask: mask::SENSOR_EXPOSURE
                | mask::SENSOR_FRAME_DURATION
                | mask::SENSOR_GAIN
                | mask::AE_REGIONS
                | mask::AF_REGIONS
                | mask::LENS_FOCUS
                | mask::CC_GAINS,
            timestamp_ns: state.frame_clock_ns,
            exposure_us: applied.sensor.exposure_us,
            frame_duration_us,
            gain_code: applied.sensor.gain_code,
            rolling_shutter_skew_us: 10_000,
            ae_state,
            af_state,
            awb_state,
            flash_state,
            lens_state: values::LENS_STATIONARY,
            scene_flicker,
            reserved: [0; 2],
            precapture_id: applied.ae.precapture_id,
            af_trigger_id: applied.af.trigger_id,
            focus_units: applied.lens.focus_units,
            focus_range_near_x100: applied.lens.focus_units + 25,
            focus_range_far_x100: applied.lens.focus_units.saturating_sub(25),
            awb_gains,
            ae_window_count: applied.ae.window_count,
            ae_windows: applied.ae.windows,
            af_window_count: applied.af.window_count,
            af_windows: applied.af.windows,
            buffer_count: frame.buffer_count,
            buffer_error_mask: state.buffer_error_mask,
        }
    }
}

impl FirmwareChannel for MockFirmware {
    fn submit(&self, camera_id: u32, command: &FwFrameControl) -> Result<(), SubmitError> {
        let mut state = self.state.lock().expect("mock lock poisoned");
        if let Some(status) = state.fail_next.take() {
            return Err(SubmitError::Rejected(status));
        }
        if self.events.is_closed() {
            return Err(SubmitError::ChannelClosed);
        }

        let applied = state.applied.entry(camera_id).or_default();
        merge_command(applied, command);
        state.pending.push_back(PendingFrame {
            camera_id,
            handle: command.handle,
            fc_id: command.fc_id,
            profile_id: command.profile_id,
            buffer_count: command.buffer_count,
        });
        debug!(
            camera_id,
            handle = command.handle,
            fc_id = command.fc_id,
            valid_mask = format_args!("{:#x}", command.valid_mask),
            "command accepted"
        );
        Ok(())
    }
}

/// Latch the valid groups of `cmd` into the persistent register state,
/// exactly as the hardware does for a delta-encoded command.
fn merge_command(dst: &mut FwFrameControl, cmd: &FwFrameControl) {
    let m = cmd.valid_mask;

    dst.handle = cmd.handle;
    dst.fc_id = cmd.fc_id;
    dst.profile_id = cmd.profile_id;
    dst.buffer_count = cmd.buffer_count;
    dst.buffers = cmd.buffers;

    if m & mask::CONTROL_MODE != 0 {
        dst.scene.control_mode = cmd.scene.control_mode;
    }
    if m & mask::SCENE_MODE != 0 {
        dst.scene.scene_mode = cmd.scene.scene_mode;
    }
    if m & mask::EFFECT_MODE != 0 {
        dst.scene.effect_mode = cmd.scene.effect_mode;
    }
    if m & mask::VIDEO_STABILIZATION != 0 {
        dst.scene.video_stabilization = cmd.scene.video_stabilization;
    }
    if m & mask::AE_MODE != 0 {
        dst.ae.mode = cmd.ae.mode;
    }
    if m & mask::AE_LOCK != 0 {
        dst.ae.lock = cmd.ae.lock;
    }
    if m & mask::AE_ANTIBANDING != 0 {
        dst.ae.antibanding = cmd.ae.antibanding;
    }
    if m & mask::AE_EV_COMPENSATION != 0 {
        dst.ae.ev_compensation_millis = cmd.ae.ev_compensation_millis;
    }
    if m & mask::AE_FPS_RANGE != 0 {
        dst.ae.frame_duration_min_us = cmd.ae.frame_duration_min_us;
        dst.ae.frame_duration_max_us = cmd.ae.frame_duration_max_us;
    }
    if m & mask::AE_REGIONS != 0 {
        dst.ae.window_count = cmd.ae.window_count;
        dst.ae.windows = cmd.ae.windows;
    }
    if m & mask::AE_TRIGGER != 0 {
        dst.ae.precapture_trigger = cmd.ae.precapture_trigger;
        dst.ae.precapture_id = cmd.ae.precapture_id;
    }
    if m & mask::AF_MODE != 0 {
        dst.af.mode = cmd.af.mode;
    }
    if m & mask::AF_REGIONS != 0 {
        dst.af.window_count = cmd.af.window_count;
        dst.af.windows = cmd.af.windows;
    }
    if m & mask::AF_TRIGGER != 0 {
        dst.af.trigger = cmd.af.trigger;
        dst.af.trigger_id = cmd.af.trigger_id;
    }
    if m & mask::AWB_MODE != 0 {
        dst.awb.mode = cmd.awb.mode;
    }
    if m & mask::AWB_LOCK != 0 {
        dst.awb.lock = cmd.awb.lock;
    }
    if m & mask::SENSOR_EXPOSURE != 0 {
        dst.sensor.exposure_us = cmd.sensor.exposure_us;
    }
    if m & mask::SENSOR_FRAME_DURATION != 0 {
        dst.sensor.frame_duration_us = cmd.sensor.frame_duration_us;
    }
    if m & mask::SENSOR_GAIN != 0 {
        dst.sensor.gain_code = cmd.sensor.gain_code;
    }
    if m & mask::TEST_PATTERN != 0 {
        dst.sensor.test_pattern = cmd.sensor.test_pattern;
        dst.sensor.test_pattern_data = cmd.sensor.test_pattern_data;
    }
    if m & mask::LENS_FOCUS != 0 {
        dst.lens.focus_units = cmd.lens.focus_units;
    }
    if m & mask::LENS_APERTURE != 0 {
        dst.lens.aperture_x100 = cmd.lens.aperture_x100;
    }
    if m & mask::LENS_FILTER_DENSITY != 0 {
        dst.lens.filter_density_x100 = cmd.lens.filter_density_x100;
    }
    if m & mask::LENS_FOCAL_LENGTH != 0 {
        dst.lens.focal_length_x100 = cmd.lens.focal_length_x100;
    }
    if m & mask::LENS_OIS != 0 {
        dst.lens.ois_enable = cmd.lens.ois_enable;
    }
    if m & mask::FLASH != 0 {
        dst.flash = cmd.flash;
    }
    if m & mask::TONEMAP_MODE != 0 {
        dst.tonemap.mode = cmd.tonemap.mode;
    }
    if m & mask::TONEMAP_CURVE != 0 {
        dst.tonemap.point_count = cmd.tonemap.point_count;
        dst.tonemap.curve_red = cmd.tonemap.curve_red;
        dst.tonemap.curve_green = cmd.tonemap.curve_green;
        dst.tonemap.curve_blue = cmd.tonemap.curve_blue;
    }
    if m & mask::CC_MODE != 0 {
        dst.image.cc_mode = cmd.image.cc_mode;
    }
    if m & mask::CC_TRANSFORM != 0 {
        dst.image.cc_transform_q16 = cmd.image.cc_transform_q16;
    }
    if m & mask::CC_GAINS != 0 {
        dst.image.cc_gains = cmd.image.cc_gains;
    }
    if m & mask::CC_ABERRATION != 0 {
        dst.image.cc_aberration_mode = cmd.image.cc_aberration_mode;
    }
    if m & mask::NOISE_REDUCTION != 0 {
        dst.image.nr_mode = cmd.image.nr_mode;
        dst.image.nr_strength = cmd.image.nr_strength;
    }
    if m & mask::EDGE != 0 {
        dst.image.edge_mode = cmd.image.edge_mode;
        dst.image.edge_strength = cmd.image.edge_strength;
    }
    if m & mask::SHADING != 0 {
        dst.image.shading_mode = cmd.image.shading_mode;
        dst.image.shading_strength = cmd.image.shading_strength;
    }
    if m & mask::HOT_PIXEL != 0 {
        dst.image.hot_pixel_mode = cmd.image.hot_pixel_mode;
    }
    if m & mask::DEMOSAIC != 0 {
        dst.image.demosaic_mode = cmd.image.demosaic_mode;
    }
    if m & mask::SCALER_CROP != 0 {
        dst.crop = cmd.crop;
    }
    if m & mask::BLACK_LEVEL_LOCK != 0 {
        dst.image.black_level_lock = cmd.image.black_level_lock;
    }
    if m & mask::STATS_FACE_DETECT != 0 {
        dst.stats.face_detect_mode = cmd.stats.face_detect_mode;
    }
    if m & mask::STATS_HISTOGRAM != 0 {
        dst.stats.histogram_enable = cmd.stats.histogram_enable;
    }
    if m & mask::STATS_SHARPNESS_MAP != 0 {
        dst.stats.sharpness_map_enable = cmd.stats.sharpness_map_enable;
    }
    if m & mask::STATS_HOT_PIXEL_MAP != 0 {
        dst.stats.hot_pixel_map_enable = cmd.stats.hot_pixel_map_enable;
    }
    if m & mask::STATS_LENS_SHADING_MAP != 0 {
        dst.stats.lens_shading_map_enable = cmd.stats.lens_shading_map_enable;
    }

    dst.valid_mask |= m;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(handle: u64, fc_id: u32) -> FwFrameControl {
        FwFrameControl {
            handle,
            fc_id,
            profile_id: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_slots_acquire_release() {
        let slots = CommandSlots::new(0x4000_0000, 0x1000, 3);
        assert_eq!(slots.available(), 3);

        let a = slots.acquire().unwrap();
        let b = slots.acquire().unwrap();
        let c = slots.acquire().unwrap();
        assert_eq!(a, 0x4000_0000);
        assert_eq!(b, 0x4000_1000);
        assert_eq!(c, 0x4000_2000);
        assert!(slots.acquire().is_none());

        assert!(slots.release(b));
        assert!(!slots.release(b)); // double release
        assert!(!slots.release(0xDEAD_0000)); // foreign address
        assert_eq!(slots.available(), 1);
    }

    #[tokio::test]
    async fn test_mock_latches_delta_commands() {
        let (fw, _rx) = MockFirmware::new(16);

        let mut first = command(0x1000, 0);
        first.valid_mask = mask::SENSOR_EXPOSURE | mask::SENSOR_GAIN;
        first.sensor.exposure_us = 10_000;
        first.sensor.gain_code = 2000;
        fw.submit(0, &first).unwrap();

        // Second command only updates gain; exposure must persist.
        let mut second = command(0x2000, 1);
        second.valid_mask = mask::SENSOR_GAIN;
        second.sensor.gain_code = 4000;
        fw.submit(0, &second).unwrap();

        let applied = fw.applied(0).unwrap();
        assert_eq!(applied.sensor.exposure_us, 10_000);
        assert_eq!(applied.sensor.gain_code, 4000);
    }

    #[tokio::test]
    async fn test_fail_next_rejects_without_enqueue() {
        let (fw, _rx) = MockFirmware::new(16);
        fw.set_fail_next(FwStatus::Busy);

        let err = fw.submit(0, &command(0x1000, 0)).unwrap_err();
        assert!(matches!(err, SubmitError::Rejected(FwStatus::Busy)));
        assert_eq!(fw.pending(), 0);

        // Next submission goes through.
        fw.submit(0, &command(0x1000, 0)).unwrap();
        assert_eq!(fw.pending(), 1);
    }

    #[tokio::test]
    async fn test_shutter_precedes_frame_done() {
        let (fw, mut rx) = MockFirmware::new(16);
        fw.submit(0, &command(0x1000, 0)).unwrap();
        assert!(fw.fire_next());

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, FwEvent::Shutter { handle: 0x1000, .. }));
        match second {
            FwEvent::FrameDone { handle, result, .. } => {
                assert_eq!(handle, 0x1000);
                assert_eq!(result.fc_id, 0);
                assert!(result.timestamp_ns > 0);
            }
            other => panic!("expected FrameDone, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_out_of_order_fire_by_handle() {
        let (fw, mut rx) = MockFirmware::new(16);
        fw.submit(0, &command(0x1000, 0)).unwrap();
        fw.submit(0, &command(0x2000, 1)).unwrap();
        fw.submit(0, &command(0x3000, 2)).unwrap();

        assert!(fw.fire_handle(0x2000));
        assert!(!fw.fire_handle(0x2000)); // already completed

        let shutter = rx.recv().await.unwrap();
        assert_eq!(shutter.handle(), 0x2000);
        assert_eq!(fw.pending(), 2);
    }
}
