//! ISP Frame-Control Pipeline
//!
//! Ties the metadata model, the translation engine and the firmware
//! boundary together: per-camera request queues and sessions, the
//! completion consumer, and the caller-facing driver surface
//! (`enqueue_request` / `dequeue_result`).

mod error;
mod pipeline;
mod queue;
mod session;

pub use error::{DriverError, PipelineError, SessionError};
pub use pipeline::{CaptureResult, FrameControlPipeline, PipelineConfig, PipelineStats};
pub use queue::{
    BufferStatus, CompletionStatus, FrameControlRequest, OutputBuffer, RequestQueue, Resolution,
};
pub use session::{CameraSession, LockState, SessionState, TriggerState};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use isp_firmware::{FirmwareChannel, FwEvent};
use isp_metadata::MetadataSnapshot;
use isp_translator::SensorProfile;

/// Profile table supplied by the profile/config collaborator.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    profiles: Vec<SensorProfile>,
}

impl ProfileTable {
    pub fn new(profiles: Vec<SensorProfile>) -> Self {
        Self { profiles }
    }

    pub fn get(&self, id: u32) -> Option<SensorProfile> {
        self.profiles.iter().find(|p| p.id == id).copied()
    }
}

/// Explicit, single-owner driver context.
///
/// Owns the firmware interface handle and the static configuration for the
/// lifetime of the driver attach; there is no global process state.
pub struct SystemContext {
    pub firmware: Arc<dyn FirmwareChannel>,
    pub profiles: ProfileTable,
    pub config: PipelineConfig,
}

/// The framework-facing driver: one session per physical camera plus the
/// completion consumer and per-camera result queues.
pub struct IspDriver {
    sessions: Vec<Arc<CameraSession>>,
    results: Vec<Mutex<VecDeque<CaptureResult>>>,
    profiles: ProfileTable,
    next_request_id: AtomicU64,
}

impl IspDriver {
    /// Attach the driver for `cameras` physical cameras.
    pub fn new(context: SystemContext, cameras: u32) -> Arc<Self> {
        let sessions = (0..cameras)
            .map(|camera_id| {
                let pipeline = Arc::new(FrameControlPipeline::new(
                    camera_id,
                    context.firmware.clone(),
                    &context.config,
                ));
                Arc::new(CameraSession::new(
                    camera_id,
                    pipeline,
                    context.config.clone(),
                ))
            })
            .collect();
        let results = (0..cameras).map(|_| Mutex::new(VecDeque::new())).collect();
        info!(cameras, "driver attached");
        Arc::new(Self {
            sessions,
            results,
            profiles: context.profiles,
            next_request_id: AtomicU64::new(0),
        })
    }

    /// Spawn the single completion consumer draining the firmware event
    /// channel into the per-camera result queues.
    pub fn spawn_completion_consumer(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<FwEvent>,
    ) -> JoinHandle<()> {
        let driver = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                driver.dispatch_event(event);
            }
            info!("completion channel closed, consumer exiting");
        })
    }

    /// Route one firmware event to its camera's pipeline and queue the
    /// published result. Callable directly from a callback context.
    pub fn dispatch_event(&self, event: FwEvent) {
        let camera_id = event.camera_id();
        let Some(session) = self.sessions.get(camera_id as usize) else {
            warn!(camera_id, "event for unknown camera dropped");
            return;
        };
        if let Some(result) = session.pipeline().on_event(event) {
            session.note_result(&result);
            self.results[camera_id as usize]
                .lock()
                .expect("result queue lock poisoned")
                .push_back(result);
        }
    }

    /// Open a camera session under a profile from the profile table.
    pub async fn open_session(&self, camera_id: u32, profile_id: u32) -> Result<(), DriverError> {
        let profile = self
            .profiles
            .get(profile_id)
            .ok_or(DriverError::UnknownProfile(profile_id))?;
        self.session(camera_id)?.open(profile).await?;
        Ok(())
    }

    /// Switch a streaming session to another profile.
    pub async fn switch_profile(&self, camera_id: u32, profile_id: u32) -> Result<(), DriverError> {
        let profile = self
            .profiles
            .get(profile_id)
            .ok_or(DriverError::UnknownProfile(profile_id))?;
        self.session(camera_id)?.switch_profile(profile).await?;
        Ok(())
    }

    /// Close a camera session, draining outstanding requests.
    pub async fn close_session(&self, camera_id: u32) -> Result<(), DriverError> {
        self.session(camera_id)?.close().await?;
        Ok(())
    }

    /// Accept one capture request. Returns the framework-facing request id.
    pub async fn enqueue_request(
        &self,
        camera_id: u32,
        metadata: MetadataSnapshot,
        buffers: Vec<OutputBuffer>,
    ) -> Result<u64, DriverError> {
        let session = self.session(camera_id)?;
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        session.submit(request_id, metadata, buffers).await?;
        Ok(request_id)
    }

    /// Pop the next pending result for a camera, shutter events and frame
    /// results alike, in completion order.
    pub fn dequeue_result(&self, camera_id: u32) -> Option<CaptureResult> {
        self.results
            .get(camera_id as usize)?
            .lock()
            .expect("result queue lock poisoned")
            .pop_front()
    }

    /// Pipeline counters for one camera.
    pub fn stats(&self, camera_id: u32) -> Result<PipelineStats, DriverError> {
        Ok(self.session(camera_id)?.pipeline().stats())
    }

    pub fn session(&self, camera_id: u32) -> Result<&Arc<CameraSession>, DriverError> {
        self.sessions
            .get(camera_id as usize)
            .ok_or(DriverError::UnknownCamera(camera_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isp_firmware::MockFirmware;
    use isp_metadata::{MetadataValue, Tag};
    use isp_translator::BinningMode;
    use std::time::Duration;

    fn profiles() -> ProfileTable {
        ProfileTable::new(vec![
            SensorProfile::new(0, BinningMode::None, 3264, 2448),
            SensorProfile::new(1, BinningMode::Binned2x2, 3264, 2448),
        ])
    }

    fn request_metadata() -> MetadataSnapshot {
        let mut s = MetadataSnapshot::new();
        s.update(Tag::AeMode, MetadataValue::Byte(vec![1])).unwrap();
        s.update(Tag::AwbMode, MetadataValue::Byte(vec![1])).unwrap();
        s.update(Tag::SensorExposureTime, MetadataValue::I64(vec![10_000_000]))
            .unwrap();
        s.update(Tag::SensorSensitivity, MetadataValue::I32(vec![200]))
            .unwrap();
        s
    }

    async fn drain_results(driver: &Arc<IspDriver>, camera_id: u32, want: usize) -> Vec<CaptureResult> {
        let mut out = Vec::new();
        for _ in 0..200 {
            while let Some(result) = driver.dequeue_result(camera_id) {
                out.push(result);
            }
            if out.len() >= want {
                return out;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("expected {want} results, got {}", out.len());
    }

    #[tokio::test]
    async fn test_end_to_end_capture_loop() {
        let (fw, events) = MockFirmware::new(64);
        let driver = IspDriver::new(
            SystemContext {
                firmware: fw.clone(),
                profiles: profiles(),
                config: PipelineConfig::default(),
            },
            1,
        );
        let _consumer = driver.spawn_completion_consumer(events);

        driver.open_session(0, 0).await.unwrap();
        for _ in 0..3 {
            driver
                .enqueue_request(0, request_metadata(), vec![])
                .await
                .unwrap();
        }
        fw.fire_all();

        // Each frame yields a shutter event and a frame result.
        let results = drain_results(&driver, 0, 6).await;
        let shutters: Vec<_> = results
            .iter()
            .filter(|r| matches!(r, CaptureResult::Shutter { .. }))
            .collect();
        let frames: Vec<_> = results
            .iter()
            .filter_map(|r| match r {
                CaptureResult::Frame { fc_id, status, metadata, .. } => {
                    Some((*fc_id, *status, metadata.len()))
                }
                _ => None,
            })
            .collect();

        assert_eq!(shutters.len(), 3);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].0, 0);
        assert_eq!(frames[2].0, 2);
        assert!(frames.iter().all(|(_, status, _)| *status == CompletionStatus::Ok));
        // First frame publishes the full result set; steady-state frames
        // shrink to the moving fields.
        assert!(frames[0].2 > frames[1].2);

        driver.close_session(0).await.unwrap();
        let stats = driver.stats(0).unwrap();
        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.shutters, 3);
    }

    #[tokio::test]
    async fn test_unknown_camera_and_profile() {
        let (fw, _events) = MockFirmware::new(8);
        let driver = IspDriver::new(
            SystemContext {
                firmware: fw,
                profiles: profiles(),
                config: PipelineConfig::default(),
            },
            1,
        );

        assert!(matches!(
            driver.open_session(5, 0).await,
            Err(DriverError::UnknownCamera(5))
        ));
        assert!(matches!(
            driver.open_session(0, 9).await,
            Err(DriverError::UnknownProfile(9))
        ));
    }

    #[tokio::test]
    async fn test_results_are_per_camera() {
        let (fw, events) = MockFirmware::new(64);
        let driver = IspDriver::new(
            SystemContext {
                firmware: fw.clone(),
                profiles: profiles(),
                config: PipelineConfig::default(),
            },
            2,
        );
        let _consumer = driver.spawn_completion_consumer(events);

        driver.open_session(0, 0).await.unwrap();
        driver.open_session(1, 1).await.unwrap();
        driver
            .enqueue_request(0, request_metadata(), vec![])
            .await
            .unwrap();
        driver
            .enqueue_request(1, request_metadata(), vec![])
            .await
            .unwrap();
        fw.fire_all();

        let cam0 = drain_results(&driver, 0, 2).await;
        let cam1 = drain_results(&driver, 1, 2).await;
        assert_eq!(cam0.len(), 2);
        assert_eq!(cam1.len(), 2);
        assert!(driver.dequeue_result(0).is_none());
    }
}
