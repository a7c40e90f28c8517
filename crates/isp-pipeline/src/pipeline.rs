//! Frame-control pipeline
//!
//! Submission side: snapshot the request metadata, translate the delta into
//! a firmware command, enqueue, submit. Completion side: resolve the
//! correlation handle against the queue (recovering out-of-order
//! completions), translate the firmware result back into metadata, mark
//! buffer statuses, and publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use isp_firmware::{
    CommandSlots, FirmwareChannel, FwBufferDesc, FwEvent, FwFrameControl, FW_MAX_OUTPUT_BUFFERS,
};
use isp_metadata::{MetadataEntry, MetadataSnapshot, SnapshotHistory};
use isp_translator::{CommittedState, FieldTranslator, SensorProfile};

use crate::error::PipelineError;
use crate::queue::{
    BufferStatus, CompletionStatus, FrameControlRequest, OutputBuffer, RequestQueue, Resolution,
};

/// Pipeline tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Firmware command slots per camera; bounds the outstanding requests.
    pub max_outstanding: usize,
    /// Upper bound on one frame's lifetime, used to scale the drain timeout.
    pub worst_case_frame: Duration,
    /// Device address of the first command slot.
    pub slot_base: u64,
    /// Command slot stride in device memory.
    pub slot_size: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_outstanding: 8,
            worst_case_frame: Duration::from_millis(100),
            slot_base: 0x4000_0000,
            slot_size: 0x1000,
        }
    }
}

impl PipelineConfig {
    /// Teardown deadline: every outstanding request gets a worst-case frame.
    pub fn drain_timeout(&self) -> Duration {
        self.worst_case_frame * self.max_outstanding as u32
    }
}

#[derive(Debug, Default)]
struct PipelineCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    recovered: AtomicU64,
    invalid: AtomicU64,
    shutters: AtomicU64,
}

/// Counter snapshot for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub submitted: u64,
    pub completed: u64,
    pub recovered: u64,
    pub invalid: u64,
    pub shutters: u64,
}

/// Result published to the framework for one completion event.
#[derive(Debug)]
pub enum CaptureResult {
    /// Timestamp-only shutter notification, precedes the frame result.
    Shutter { fc_id: u32, timestamp_ns: u64 },
    /// Full frame completion.
    Frame {
        fc_id: u32,
        status: CompletionStatus,
        metadata: Vec<MetadataEntry>,
        buffers: Vec<OutputBuffer>,
    },
}

/// Per-camera request/response pipeline.
pub struct FrameControlPipeline {
    camera_id: u32,
    firmware: Arc<dyn FirmwareChannel>,
    slots: CommandSlots,
    queue: RequestQueue,
    history: Mutex<SnapshotHistory>,
    committed: Mutex<CommittedState>,
    /// External id of the first accepted request of the current stream.
    origin: Mutex<Option<u64>>,
    drained: Notify,
    counters: PipelineCounters,
}

impl FrameControlPipeline {
    pub fn new(camera_id: u32, firmware: Arc<dyn FirmwareChannel>, config: &PipelineConfig) -> Self {
        // Each camera gets its own slot range so handles are unique across
        // the device.
        let base = config.slot_base
            + u64::from(camera_id) * config.slot_size * config.max_outstanding as u64;
        Self {
            camera_id,
            firmware,
            slots: CommandSlots::new(base, config.slot_size, config.max_outstanding),
            queue: RequestQueue::new(),
            history: Mutex::new(SnapshotHistory::new()),
            committed: Mutex::new(CommittedState::new()),
            origin: Mutex::new(None),
            drained: Notify::new(),
            counters: PipelineCounters::default(),
        }
    }

    /// Accept one capture request: translate, enqueue, submit.
    ///
    /// Returns the zero-based firmware `fc_id`. On submission failure the
    /// request is fully unwound (not enqueued, slot released, snapshot not
    /// published) and the error surfaces to the caller.
    pub fn submit_request(
        &self,
        external_id: u64,
        profile: &SensorProfile,
        metadata: MetadataSnapshot,
        mut buffers: Vec<OutputBuffer>,
    ) -> Result<u32, PipelineError> {
        let (fc_id, origin_was_new) = {
            let mut origin = self.origin.lock().expect("origin lock poisoned");
            let was_new = origin.is_none();
            let base = *origin.get_or_insert(external_id);
            (external_id.wrapping_sub(base) as u32, was_new)
        };

        let Some(handle) = self.slots.acquire() else {
            if origin_was_new {
                self.clear_origin();
            }
            return Err(PipelineError::NoCommandSlot);
        };

        let snapshot = Arc::new(metadata);
        let previous = {
            let history = self.history.lock().expect("history lock poisoned");
            history.current().cloned()
        };

        let mut cmd = FwFrameControl {
            handle,
            fc_id,
            ..Default::default()
        };
        FieldTranslator::map_frame_control(&snapshot, previous.as_deref(), profile, &mut cmd);

        if buffers.len() > FW_MAX_OUTPUT_BUFFERS {
            warn!(
                camera_id = self.camera_id,
                count = buffers.len(),
                "output buffer list truncated"
            );
            buffers.truncate(FW_MAX_OUTPUT_BUFFERS);
        }
        cmd.buffer_count = buffers.len() as u32;
        for (dst, src) in cmd.buffers.iter_mut().zip(buffers.iter()) {
            *dst = FwBufferDesc {
                address: src.address,
                fourcc: src.fourcc,
                stride: src.stride,
                width: src.width,
                height: src.height,
            };
        }

        self.queue.push(FrameControlRequest {
            fc_id,
            external_id,
            camera_id: self.camera_id,
            handle,
            profile: *profile,
            snapshot: snapshot.clone(),
            buffers,
        });

        if let Err(e) = self.firmware.submit(self.camera_id, &cmd) {
            self.queue.remove_by_handle(handle);
            self.slots.release(handle);
            if origin_was_new {
                self.clear_origin();
            }
            warn!(camera_id = self.camera_id, fc_id, error = %e, "submission failed");
            return Err(e.into());
        }

        self.history
            .lock()
            .expect("history lock poisoned")
            .publish(snapshot);
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(camera_id = self.camera_id, fc_id, handle, "request submitted");
        Ok(fc_id)
    }

    /// Resolve one firmware event against the queue.
    ///
    /// Safe to call directly from the completion callback context: critical
    /// sections are short and nothing blocks.
    pub fn on_event(&self, event: FwEvent) -> Option<CaptureResult> {
        match event {
            FwEvent::Shutter {
                handle,
                timestamp_ns,
                ..
            } => match self.queue.peek_identity(handle) {
                Some((fc_id, _)) => {
                    self.counters.shutters.fetch_add(1, Ordering::Relaxed);
                    Some(CaptureResult::Shutter { fc_id, timestamp_ns })
                }
                None => {
                    warn!(camera_id = self.camera_id, handle, "shutter for unknown handle");
                    None
                }
            },
            FwEvent::FrameDone { handle, result, .. } => {
                let (request, status) = match self.queue.resolve(handle) {
                    Resolution::InOrder(req) => (req, CompletionStatus::Ok),
                    Resolution::Recovered(req) => {
                        self.counters.recovered.fetch_add(1, Ordering::Relaxed);
                        (req, CompletionStatus::OutOfOrderRecovered)
                    }
                    Resolution::Unmatched => {
                        self.counters.invalid.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            camera_id = self.camera_id,
                            handle, "completion matches no enqueued request"
                        );
                        // Invalid-pointer completions are reported, never
                        // translated.
                        return Some(CaptureResult::Frame {
                            fc_id: result.fc_id,
                            status: CompletionStatus::InvalidHandle,
                            metadata: Vec::new(),
                            buffers: Vec::new(),
                        });
                    }
                };

                self.slots.release(request.handle);

                let metadata = {
                    let mut committed = self.committed.lock().expect("committed lock poisoned");
                    FieldTranslator::unmap_frame_result(&result, &request.profile, &mut committed)
                };

                let mut buffers = request.buffers;
                for (i, buffer) in buffers.iter_mut().enumerate() {
                    buffer.status = if result.buffer_error_mask & (1 << i) != 0 {
                        BufferStatus::Error
                    } else {
                        BufferStatus::Ok
                    };
                }

                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                if self.queue.is_empty() {
                    self.drained.notify_waiters();
                }

                Some(CaptureResult::Frame {
                    fc_id: request.fc_id,
                    status,
                    metadata,
                    buffers,
                })
            }
        }
    }

    /// Outstanding request count, lock-free.
    pub fn outstanding(&self) -> usize {
        self.queue.len()
    }

    /// Block until the queue drains or the deadline passes. On timeout the
    /// number of still-outstanding requests is returned.
    pub async fn wait_drained(&self, limit: Duration) -> Result<(), usize> {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            let notified = self.drained.notified();
            if self.queue.is_empty() {
                return Ok(());
            }
            match tokio::time::timeout_at(deadline, notified).await {
                Ok(()) => continue,
                Err(_) => {
                    return if self.queue.is_empty() {
                        Ok(())
                    } else {
                        Err(self.queue.len())
                    };
                }
            }
        }
    }

    /// Reset per-stream state: fc-id origin, snapshot history, committed
    /// result cache. Called on stream close and profile switch, with the
    /// queue already drained.
    pub fn reset_stream(&self) {
        self.clear_origin();
        self.history
            .lock()
            .expect("history lock poisoned")
            .reset();
        self.committed
            .lock()
            .expect("committed lock poisoned")
            .reset();
        info!(camera_id = self.camera_id, "stream state reset");
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            recovered: self.counters.recovered.load(Ordering::Relaxed),
            invalid: self.counters.invalid.load(Ordering::Relaxed),
            shutters: self.counters.shutters.load(Ordering::Relaxed),
        }
    }

    fn clear_origin(&self) {
        *self.origin.lock().expect("origin lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isp_firmware::{FwStatus, MockFirmware};
    use isp_metadata::{MetadataValue, Tag};
    use isp_translator::BinningMode;
    use tokio::sync::mpsc;

    fn profile() -> SensorProfile {
        SensorProfile::new(0, BinningMode::None, 3264, 2448)
    }

    fn metadata(exposure_ns: i64) -> MetadataSnapshot {
        let mut s = MetadataSnapshot::new();
        s.update(Tag::SensorExposureTime, MetadataValue::I64(vec![exposure_ns]))
            .unwrap();
        s.update(Tag::AeMode, MetadataValue::Byte(vec![1])).unwrap();
        s
    }

    fn setup() -> (
        Arc<MockFirmware>,
        mpsc::Receiver<FwEvent>,
        FrameControlPipeline,
        PipelineConfig,
    ) {
        let (fw, rx) = MockFirmware::new(64);
        let config = PipelineConfig::default();
        let pipeline = FrameControlPipeline::new(0, fw.clone(), &config);
        (fw, rx, pipeline, config)
    }

    /// Handle of the n-th slot acquired by camera 0.
    fn slot(config: &PipelineConfig, n: u64) -> u64 {
        config.slot_base + n * config.slot_size
    }

    #[tokio::test]
    async fn test_in_order_completions() {
        let (fw, mut rx, pipeline, _config) = setup();

        for i in 0..3u64 {
            let fc_id = pipeline
                .submit_request(100 + i, &profile(), metadata(10_000_000 * (i as i64 + 1)), vec![])
                .unwrap();
            assert_eq!(fc_id, i as u32);
        }
        assert_eq!(pipeline.outstanding(), 3);

        fw.fire_all();
        let mut frames = Vec::new();
        let mut shutters = 0;
        while frames.len() < 3 {
            match pipeline.on_event(rx.recv().await.unwrap()) {
                Some(CaptureResult::Frame { fc_id, status, .. }) => frames.push((fc_id, status)),
                Some(CaptureResult::Shutter { .. }) => shutters += 1,
                None => {}
            }
        }

        assert_eq!(shutters, 3);
        assert_eq!(
            frames,
            vec![
                (0, CompletionStatus::Ok),
                (1, CompletionStatus::Ok),
                (2, CompletionStatus::Ok),
            ]
        );
        assert_eq!(pipeline.outstanding(), 0);
        let stats = pipeline.stats();
        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.recovered, 0);
    }

    #[tokio::test]
    async fn test_out_of_order_completions_recovered() {
        // Requests A, B, C; firmware completes B, A, C. The first two are
        // recovered with the anomaly flag, the third is clean.
        let (fw, mut rx, pipeline, config) = setup();

        for i in 0..3u64 {
            pipeline
                .submit_request(i, &profile(), metadata(10_000_000), vec![])
                .unwrap();
        }

        for n in [1, 0, 2] {
            assert!(fw.fire_handle(slot(&config, n)));
        }

        let mut frames = Vec::new();
        while frames.len() < 3 {
            if let Some(CaptureResult::Frame { fc_id, status, .. }) =
                pipeline.on_event(rx.recv().await.unwrap())
            {
                frames.push((fc_id, status));
            }
        }

        assert_eq!(
            frames,
            vec![
                (1, CompletionStatus::OutOfOrderRecovered),
                (0, CompletionStatus::OutOfOrderRecovered),
                (2, CompletionStatus::Ok),
            ]
        );
        assert_eq!(pipeline.stats().recovered, 2);
        assert_eq!(pipeline.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_submission_failure_unwinds() {
        let (fw, _rx, pipeline, _config) = setup();

        fw.set_fail_next(FwStatus::Busy);
        let err = pipeline
            .submit_request(0, &profile(), metadata(10_000_000), vec![])
            .unwrap_err();
        assert!(matches!(err, PipelineError::Submit(_)));
        assert_eq!(pipeline.outstanding(), 0);
        assert_eq!(pipeline.stats().submitted, 0);

        // The failed request did not pin the fc-id origin.
        let fc_id = pipeline
            .submit_request(5, &profile(), metadata(10_000_000), vec![])
            .unwrap();
        assert_eq!(fc_id, 0);
    }

    #[tokio::test]
    async fn test_invalid_handle_reported_untranslated() {
        let (_fw, _rx, pipeline, _config) = setup();

        pipeline
            .submit_request(0, &profile(), metadata(10_000_000), vec![])
            .unwrap();

        let bogus = FwEvent::FrameDone {
            handle: 0xDEAD_0000,
            camera_id: 0,
            result: Box::new(isp_firmware::FwFrameResult {
                fc_id: 42,
                ..Default::default()
            }),
        };
        match pipeline.on_event(bogus) {
            Some(CaptureResult::Frame {
                fc_id,
                status,
                metadata,
                buffers,
            }) => {
                assert_eq!(fc_id, 42);
                assert_eq!(status, CompletionStatus::InvalidHandle);
                assert!(metadata.is_empty());
                assert!(buffers.is_empty());
            }
            other => panic!("expected frame result, got {other:?}"),
        }
        // The real request is still outstanding.
        assert_eq!(pipeline.outstanding(), 1);
        assert_eq!(pipeline.stats().invalid, 1);
    }

    #[tokio::test]
    async fn test_buffer_errors_marked() {
        let (fw, mut rx, pipeline, _config) = setup();
        fw.set_buffer_error_mask(0b01);

        let buffers = vec![
            OutputBuffer::new(0x9000_0000, u32::from_le_bytes(*b"NV12"), 1920, 1920, 1080),
            OutputBuffer::new(0x9100_0000, u32::from_le_bytes(*b"NV12"), 1920, 1920, 1080),
        ];
        pipeline
            .submit_request(0, &profile(), metadata(10_000_000), buffers)
            .unwrap();
        fw.fire_all();

        loop {
            if let Some(CaptureResult::Frame { buffers, .. }) =
                pipeline.on_event(rx.recv().await.unwrap())
            {
                assert_eq!(buffers[0].status, BufferStatus::Error);
                assert_eq!(buffers[1].status, BufferStatus::Ok);
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_delta_encoding_across_requests() {
        let (fw, _rx, pipeline, _config) = setup();

        pipeline
            .submit_request(0, &profile(), metadata(10_000_000), vec![])
            .unwrap();
        // Identical metadata: nothing changed, the second command carries
        // an empty valid mask but still goes down.
        pipeline
            .submit_request(1, &profile(), metadata(10_000_000), vec![])
            .unwrap();

        let applied = fw.applied(0).unwrap();
        assert_eq!(applied.fc_id, 1);
        assert_eq!(applied.sensor.exposure_us, 10_000);
        assert_eq!(fw.pending(), 2);
    }

    #[tokio::test]
    async fn test_wait_drained_times_out() {
        let (_fw, _rx, pipeline, _config) = setup();

        pipeline
            .submit_request(0, &profile(), metadata(10_000_000), vec![])
            .unwrap();

        let outcome = pipeline.wait_drained(Duration::from_millis(20)).await;
        assert_eq!(outcome, Err(1));
    }

    #[tokio::test]
    async fn test_wait_drained_wakes_on_completion() {
        let (fw, mut rx, pipeline, _config) = setup();
        let pipeline = Arc::new(pipeline);

        pipeline
            .submit_request(0, &profile(), metadata(10_000_000), vec![])
            .unwrap();

        let waiter = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.wait_drained(Duration::from_secs(5)).await })
        };

        fw.fire_all();
        while let Some(event) = rx.recv().await {
            pipeline.on_event(event);
            if pipeline.outstanding() == 0 {
                break;
            }
        }
        assert_eq!(waiter.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_slots_exhaust_then_recycle() {
        let (fw, mut rx, pipeline, config) = setup();

        for i in 0..config.max_outstanding as u64 {
            pipeline
                .submit_request(i, &profile(), metadata(10_000_000), vec![])
                .unwrap();
        }
        let err = pipeline
            .submit_request(99, &profile(), metadata(10_000_000), vec![])
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoCommandSlot));

        fw.fire_next();
        while let Some(event) = rx.recv().await {
            let done = matches!(event, FwEvent::FrameDone { .. });
            pipeline.on_event(event);
            if done {
                break;
            }
        }
        // A slot came back; submission works again.
        pipeline
            .submit_request(100, &profile(), metadata(20_000_000), vec![])
            .unwrap();
    }
}
