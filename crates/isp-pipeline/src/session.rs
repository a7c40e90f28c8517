//! Per-camera session state machine
//!
//! A session owns one camera's pipeline, its active profile, and the
//! trigger/lock bookkeeping. The session state field uses an async lock
//! that may legitimately be held across the queue-drain await during
//! teardown and profile switches; the submission and completion paths only
//! ever take it briefly.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use isp_metadata::{AeState, AfState, AwbState, MetadataSnapshot, Tag, TriggerValue};
use isp_translator::SensorProfile;

use crate::error::SessionError;
use crate::pipeline::{CaptureResult, FrameControlPipeline, PipelineConfig};
use crate::queue::OutputBuffer;

/// Lifecycle state of one camera session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Ready,
    Streaming,
    TearingDown,
    Error,
}

/// One-shot trigger sub-state (precapture metering and focus sweep).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerState {
    #[default]
    Idle,
    Start,
    Cancel,
}

/// Exposure / white-balance lock sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LockState {
    #[default]
    Unlocked,
    Converging,
    Locked,
}

#[derive(Debug, Default, Clone, Copy)]
struct TriggerBook {
    precapture: TriggerState,
    precapture_id: u32,
    focus: TriggerState,
    focus_id: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct LockBook {
    ae: LockState,
    awb: LockState,
}

/// One physical camera's session.
pub struct CameraSession {
    camera_id: u32,
    pipeline: Arc<FrameControlPipeline>,
    state: AsyncMutex<SessionState>,
    profile: Mutex<Option<SensorProfile>>,
    triggers: Mutex<TriggerBook>,
    locks: Mutex<LockBook>,
    config: PipelineConfig,
}

impl CameraSession {
    pub fn new(camera_id: u32, pipeline: Arc<FrameControlPipeline>, config: PipelineConfig) -> Self {
        Self {
            camera_id,
            pipeline,
            state: AsyncMutex::new(SessionState::Ready),
            profile: Mutex::new(None),
            triggers: Mutex::new(TriggerBook::default()),
            locks: Mutex::new(LockBook::default()),
            config,
        }
    }

    pub fn camera_id(&self) -> u32 {
        self.camera_id
    }

    pub fn pipeline(&self) -> &Arc<FrameControlPipeline> {
        &self.pipeline
    }

    pub async fn state(&self) -> SessionState {
        *self.state.lock().await
    }

    pub fn profile(&self) -> Option<SensorProfile> {
        *self.profile.lock().expect("profile lock poisoned")
    }

    /// Current trigger sub-states (precapture, focus).
    pub fn triggers(&self) -> (TriggerState, TriggerState) {
        let book = self.triggers.lock().expect("trigger lock poisoned");
        (book.precapture, book.focus)
    }

    /// Current lock sub-states (exposure, white balance).
    pub fn locks(&self) -> (LockState, LockState) {
        let book = self.locks.lock().expect("lock book poisoned");
        (book.ae, book.awb)
    }

    /// `Ready -> Streaming` with the given profile.
    pub async fn open(&self, profile: SensorProfile) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        match *state {
            SessionState::Ready => {
                *self.profile.lock().expect("profile lock poisoned") = Some(profile);
                self.pipeline.reset_stream();
                *state = SessionState::Streaming;
                info!(camera_id = self.camera_id, profile = profile.id, "session streaming");
                Ok(())
            }
            SessionState::Streaming | SessionState::TearingDown => {
                Err(SessionError::AlreadyStreaming)
            }
            SessionState::Error => Err(SessionError::Faulted),
        }
    }

    /// Close the stream, waiting for outstanding requests to drain.
    ///
    /// Outstanding requests are never cancelled; the firmware completes
    /// what it accepted. On drain timeout the session faults and the
    /// failure surfaces to the caller.
    pub async fn close(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        match *state {
            SessionState::Ready => return Ok(()),
            SessionState::Streaming => {}
            SessionState::TearingDown => return Err(SessionError::NotStreaming),
            SessionState::Error => return Err(SessionError::Faulted),
        }

        *state = SessionState::TearingDown;
        match self.pipeline.wait_drained(self.config.drain_timeout()).await {
            Ok(()) => {
                self.finish_teardown();
                *state = SessionState::Ready;
                info!(camera_id = self.camera_id, "session closed");
                Ok(())
            }
            Err(outstanding) => {
                *state = SessionState::Error;
                warn!(
                    camera_id = self.camera_id,
                    outstanding, "drain timed out, session faulted"
                );
                Err(SessionError::DrainTimeout { outstanding })
            }
        }
    }

    /// Switch the active profile.
    ///
    /// With an empty queue the switch happens in place and the session
    /// keeps streaming. With requests outstanding the session tears down,
    /// waits for the drain, and re-opens under the new profile. Either way
    /// per-stream state (fc-id origin, snapshot history, committed cache)
    /// restarts, so the first request under the new profile translates in
    /// full.
    pub async fn switch_profile(&self, profile: SensorProfile) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if *state != SessionState::Streaming {
            return Err(SessionError::NotStreaming);
        }

        if self.pipeline.outstanding() == 0 {
            *self.profile.lock().expect("profile lock poisoned") = Some(profile);
            self.pipeline.reset_stream();
            info!(
                camera_id = self.camera_id,
                profile = profile.id,
                "profile switched in place"
            );
            return Ok(());
        }

        *state = SessionState::TearingDown;
        match self.pipeline.wait_drained(self.config.drain_timeout()).await {
            Ok(()) => {
                self.finish_teardown();
                *self.profile.lock().expect("profile lock poisoned") = Some(profile);
                *state = SessionState::Streaming;
                info!(
                    camera_id = self.camera_id,
                    profile = profile.id,
                    "profile switched after drain"
                );
                Ok(())
            }
            Err(outstanding) => {
                *state = SessionState::Error;
                warn!(
                    camera_id = self.camera_id,
                    outstanding, "drain timed out during profile switch"
                );
                Err(SessionError::DrainTimeout { outstanding })
            }
        }
    }

    /// Recover a faulted session after the caller has reset the hardware.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        self.finish_teardown();
        *state = SessionState::Ready;
        info!(camera_id = self.camera_id, "session reset");
    }

    /// Submit one capture request on the streaming session.
    pub async fn submit(
        &self,
        external_id: u64,
        metadata: MetadataSnapshot,
        buffers: Vec<OutputBuffer>,
    ) -> Result<u32, SessionError> {
        let state = self.state.lock().await;
        if *state != SessionState::Streaming {
            return Err(SessionError::NotStreaming);
        }
        let profile = self
            .profile
            .lock()
            .expect("profile lock poisoned")
            .ok_or(SessionError::NotStreaming)?;

        self.note_request(&metadata);
        let fc_id = self
            .pipeline
            .submit_request(external_id, &profile, metadata, buffers)?;
        Ok(fc_id)
    }

    /// Advance the trigger/lock sub-states from an incoming request.
    fn note_request(&self, metadata: &MetadataSnapshot) {
        let mut triggers = self.triggers.lock().expect("trigger lock poisoned");
        if let Some(value) = byte_of(metadata, Tag::AePrecaptureTrigger) {
            triggers.precapture = trigger_state(value);
            if let Some(id) = metadata
                .get(Tag::AePrecaptureId)
                .and_then(|e| e.value.as_i32())
            {
                triggers.precapture_id = id.max(0) as u32;
            }
        }
        if let Some(value) = byte_of(metadata, Tag::AfTrigger) {
            triggers.focus = trigger_state(value);
            if let Some(id) = metadata.get(Tag::AfTriggerId).and_then(|e| e.value.as_i32()) {
                triggers.focus_id = id.max(0) as u32;
            }
        }
        drop(triggers);

        let mut locks = self.locks.lock().expect("lock book poisoned");
        if let Some(value) = byte_of(metadata, Tag::AeLock) {
            locks.ae = requested_lock(locks.ae, value);
        }
        if let Some(value) = byte_of(metadata, Tag::AwbLock) {
            locks.awb = requested_lock(locks.awb, value);
        }
    }

    /// Advance the sub-states from a published result.
    pub fn note_result(&self, result: &CaptureResult) {
        let CaptureResult::Frame { metadata, .. } = result else {
            return;
        };

        let mut locks = self.locks.lock().expect("lock book poisoned");
        let mut triggers = self.triggers.lock().expect("trigger lock poisoned");
        for entry in metadata {
            match entry.tag {
                Tag::AeState => {
                    let Some(b) = entry.value.as_byte() else { continue };
                    if b == AeState::Locked as u8 {
                        locks.ae = LockState::Locked;
                    }
                    // Precapture sequence has run its course once the
                    // engine settles.
                    if triggers.precapture == TriggerState::Start
                        && (b == AeState::Converged as u8
                            || b == AeState::Locked as u8
                            || b == AeState::FlashRequired as u8)
                    {
                        triggers.precapture = TriggerState::Idle;
                    }
                }
                Tag::AwbState => {
                    if entry.value.as_byte() == Some(AwbState::Locked as u8) {
                        locks.awb = LockState::Locked;
                    }
                }
                Tag::AfState => {
                    let Some(b) = entry.value.as_byte() else { continue };
                    if triggers.focus == TriggerState::Start
                        && (b == AfState::FocusedLocked as u8
                            || b == AfState::NotFocusedLocked as u8)
                    {
                        triggers.focus = TriggerState::Idle;
                    }
                }
                _ => {}
            }
        }
    }

    fn finish_teardown(&self) {
        self.pipeline.reset_stream();
        *self.triggers.lock().expect("trigger lock poisoned") = TriggerBook::default();
        *self.locks.lock().expect("lock book poisoned") = LockBook::default();
    }
}

fn byte_of(metadata: &MetadataSnapshot, tag: Tag) -> Option<u8> {
    metadata.get(tag).and_then(|e| e.value.as_byte())
}

fn trigger_state(value: u8) -> TriggerState {
    match TriggerValue::from_byte(value).unwrap_or(TriggerValue::Idle) {
        TriggerValue::Idle => TriggerState::Idle,
        TriggerValue::Start => TriggerState::Start,
        TriggerValue::Cancel => TriggerState::Cancel,
    }
}

fn requested_lock(current: LockState, value: u8) -> LockState {
    if value == 0 {
        LockState::Unlocked
    } else if current == LockState::Locked {
        LockState::Locked
    } else {
        LockState::Converging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isp_firmware::{FwEvent, MockFirmware};
    use isp_metadata::MetadataValue;
    use isp_translator::BinningMode;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn profile_full() -> SensorProfile {
        SensorProfile::new(0, BinningMode::None, 3264, 2448)
    }

    fn profile_binned() -> SensorProfile {
        SensorProfile::new(1, BinningMode::Binned2x2, 3264, 2448)
    }

    fn short_config() -> PipelineConfig {
        PipelineConfig {
            worst_case_frame: Duration::from_millis(5),
            ..Default::default()
        }
    }

    fn metadata() -> MetadataSnapshot {
        let mut s = MetadataSnapshot::new();
        s.update(Tag::AeMode, MetadataValue::Byte(vec![1])).unwrap();
        s.update(Tag::SensorExposureTime, MetadataValue::I64(vec![10_000_000]))
            .unwrap();
        s
    }

    fn session_with_mock(
        config: PipelineConfig,
    ) -> (Arc<MockFirmware>, mpsc::Receiver<FwEvent>, CameraSession) {
        let (fw, rx) = MockFirmware::new(64);
        let pipeline = Arc::new(FrameControlPipeline::new(0, fw.clone(), &config));
        let session = CameraSession::new(0, pipeline, config);
        (fw, rx, session)
    }

    /// Pump every delivered firmware event through the pipeline.
    async fn pump(session: &CameraSession, rx: &mut mpsc::Receiver<FwEvent>) {
        while session.pipeline().outstanding() > 0 {
            let event = rx.recv().await.expect("event channel closed");
            if let Some(result) = session.pipeline().on_event(event) {
                session.note_result(&result);
            }
        }
    }

    #[tokio::test]
    async fn test_open_submit_close() {
        let (fw, mut rx, session) = session_with_mock(short_config());

        assert_eq!(session.state().await, SessionState::Ready);
        session.open(profile_full()).await.unwrap();
        assert_eq!(session.state().await, SessionState::Streaming);

        let fc_id = session.submit(10, metadata(), vec![]).await.unwrap();
        assert_eq!(fc_id, 0);

        fw.fire_all();
        pump(&session, &mut rx).await;

        session.close().await.unwrap();
        assert_eq!(session.state().await, SessionState::Ready);
    }

    #[tokio::test]
    async fn test_submit_requires_streaming() {
        let (_fw, _rx, session) = session_with_mock(short_config());
        let err = session.submit(0, metadata(), vec![]).await.unwrap_err();
        assert!(matches!(err, SessionError::NotStreaming));
    }

    #[tokio::test]
    async fn test_close_times_out_into_error_state() {
        let (_fw, _rx, session) = session_with_mock(short_config());
        session.open(profile_full()).await.unwrap();
        session.submit(0, metadata(), vec![]).await.unwrap();

        // Firmware never completes; the bounded drain must fault the
        // session instead of blocking forever.
        let err = session.close().await.unwrap_err();
        assert!(matches!(err, SessionError::DrainTimeout { outstanding: 1 }));
        assert_eq!(session.state().await, SessionState::Error);

        session.reset().await;
        assert_eq!(session.state().await, SessionState::Ready);
        session.open(profile_full()).await.unwrap();
    }

    #[tokio::test]
    async fn test_profile_switch_in_place_when_idle() {
        let (fw, mut rx, session) = session_with_mock(short_config());
        session.open(profile_full()).await.unwrap();
        session.submit(10, metadata(), vec![]).await.unwrap();
        fw.fire_all();
        pump(&session, &mut rx).await;

        session.switch_profile(profile_binned()).await.unwrap();
        assert_eq!(session.state().await, SessionState::Streaming);
        assert_eq!(session.profile().unwrap().id, 1);

        // fc ids restart from zero under the new profile.
        let fc_id = session.submit(11, metadata(), vec![]).await.unwrap();
        assert_eq!(fc_id, 0);
    }

    #[tokio::test]
    async fn test_profile_switch_drains_outstanding() {
        let (fw, mut rx, session) = session_with_mock(PipelineConfig {
            worst_case_frame: Duration::from_millis(500),
            ..Default::default()
        });
        let session = Arc::new(session);
        session.open(profile_full()).await.unwrap();
        session.submit(0, metadata(), vec![]).await.unwrap();
        session.submit(1, metadata(), vec![]).await.unwrap();

        // Completion side runs concurrently with the blocked switch.
        let pump_task = {
            let session = session.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                fw.fire_all();
                pump(&session, &mut rx).await;
            })
        };

        session.switch_profile(profile_binned()).await.unwrap();
        pump_task.await.unwrap();

        assert_eq!(session.state().await, SessionState::Streaming);
        assert_eq!(session.profile().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_trigger_and_lock_bookkeeping() {
        let (fw, mut rx, session) = session_with_mock(short_config());
        session.open(profile_full()).await.unwrap();

        let mut request = metadata();
        request
            .update(Tag::AePrecaptureTrigger, MetadataValue::Byte(vec![1]))
            .unwrap();
        request
            .update(Tag::AePrecaptureId, MetadataValue::I32(vec![3]))
            .unwrap();
        request.update(Tag::AeLock, MetadataValue::Byte(vec![1])).unwrap();
        session.submit(0, request, vec![]).await.unwrap();

        assert_eq!(session.triggers().0, TriggerState::Start);
        assert_eq!(session.locks().0, LockState::Converging);

        // Mock firmware reports AE locked; the lock converges and the
        // precapture trigger returns to idle.
        fw.fire_all();
        pump(&session, &mut rx).await;
        assert_eq!(session.locks().0, LockState::Locked);
        assert_eq!(session.triggers().0, TriggerState::Idle);
    }
}
