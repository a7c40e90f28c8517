//! Per-camera FIFO of in-flight frame-control requests
//!
//! The queue is the single point of truth for what is outstanding. Only the
//! submission path appends and only the completion path removes; both share
//! a short lock safe for use from the completion callback context, and the
//! outstanding count is readable lock-free for diagnostics.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use isp_metadata::MetadataSnapshot;
use isp_translator::SensorProfile;

/// Completion status of a resolved request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    /// Completion matched the queue head
    Ok,
    /// Completion matched a request behind the head; recovered, flagged
    OutOfOrderRecovered,
    /// Completion handle matched no enqueued request
    InvalidHandle,
}

/// Status of one output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferStatus {
    Pending,
    Ok,
    Error,
}

/// Output buffer descriptor supplied by the buffer collaborator. The core
/// only ever touches `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBuffer {
    pub address: u64,
    pub fourcc: u32,
    pub stride: u32,
    pub width: u32,
    pub height: u32,
    pub status: BufferStatus,
}

impl OutputBuffer {
    pub fn new(address: u64, fourcc: u32, stride: u32, width: u32, height: u32) -> Self {
        Self {
            address,
            fourcc,
            stride,
            width,
            height,
            status: BufferStatus::Pending,
        }
    }
}

/// One in-flight capture request.
///
/// Owned exclusively by the queue from enqueue until completion resolution,
/// at which point ownership moves to the result-publication path.
#[derive(Debug)]
pub struct FrameControlRequest {
    /// Zero-based per-stream id, as seen by the firmware.
    pub fc_id: u32,
    /// Framework-facing request id.
    pub external_id: u64,
    pub camera_id: u32,
    /// Correlation handle: the command slot's device address.
    pub handle: u64,
    /// Profile the request's coordinates were expressed under.
    pub profile: SensorProfile,
    pub snapshot: Arc<MetadataSnapshot>,
    pub buffers: Vec<OutputBuffer>,
}

/// Outcome of matching a frame completion against the queue.
#[derive(Debug)]
pub enum Resolution {
    /// Completion matched the head; normal in-order case.
    InOrder(FrameControlRequest),
    /// Completion matched an entry behind the head. The matched entry is
    /// authoritative for this completion and the popped head has been
    /// returned to the queue.
    Recovered(FrameControlRequest),
    /// No enqueued request carries this handle.
    Unmatched,
}

/// Thread-safe FIFO of in-flight requests for one camera.
#[derive(Debug, Default)]
pub struct RequestQueue {
    inner: Mutex<VecDeque<FrameControlRequest>>,
    outstanding: AtomicUsize,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request at the tail. Submission path only.
    pub fn push(&self, request: FrameControlRequest) {
        let mut inner = self.inner.lock().expect("request queue lock poisoned");
        inner.push_back(request);
        self.outstanding.store(inner.len(), Ordering::Release);
    }

    /// Match a frame completion against the queue. Completion path only.
    ///
    /// Pops the head; on a handle mismatch the rest of the queue is scanned
    /// for the matching entry, which is completed in the head's place while
    /// the head re-enters the queue at the tail. A completion is never
    /// dropped: when no entry matches anywhere, the queue is left untouched
    /// and [`Resolution::Unmatched`] is returned.
    pub fn resolve(&self, handle: u64) -> Resolution {
        let mut inner = self.inner.lock().expect("request queue lock poisoned");
        let Some(head) = inner.pop_front() else {
            return Resolution::Unmatched;
        };
        if head.handle == handle {
            self.outstanding.store(inner.len(), Ordering::Release);
            return Resolution::InOrder(head);
        }

        let matched = inner
            .iter()
            .position(|r| r.handle == handle)
            .and_then(|pos| inner.remove(pos));
        match matched {
            Some(request) => {
                warn!(
                    camera_id = request.camera_id,
                    fc_id = request.fc_id,
                    handle,
                    head_handle = head.handle,
                    "out-of-order completion recovered"
                );
                inner.push_back(head);
                self.outstanding.store(inner.len(), Ordering::Release);
                Resolution::Recovered(request)
            }
            None => {
                inner.push_front(head);
                Resolution::Unmatched
            }
        }
    }

    /// Remove a just-enqueued request after a failed submission. Submission
    /// path only; part of the enqueue unwind, not a cancellation primitive.
    pub fn remove_by_handle(&self, handle: u64) -> Option<FrameControlRequest> {
        let mut inner = self.inner.lock().expect("request queue lock poisoned");
        let pos = inner.iter().position(|r| r.handle == handle)?;
        let request = inner.remove(pos);
        self.outstanding.store(inner.len(), Ordering::Release);
        request
    }

    /// Identity of the request carrying `handle`, without removing it.
    /// Used to resolve shutter events, which precede the frame completion.
    pub fn peek_identity(&self, handle: u64) -> Option<(u32, u64)> {
        let inner = self.inner.lock().expect("request queue lock poisoned");
        inner
            .iter()
            .find(|r| r.handle == handle)
            .map(|r| (r.fc_id, r.external_id))
    }

    /// Outstanding request count, lock-free.
    pub fn len(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isp_translator::BinningMode;

    fn request(fc_id: u32, handle: u64) -> FrameControlRequest {
        FrameControlRequest {
            fc_id,
            external_id: u64::from(fc_id) + 100,
            camera_id: 0,
            handle,
            profile: SensorProfile::new(0, BinningMode::None, 3264, 2448),
            snapshot: Arc::new(MetadataSnapshot::new()),
            buffers: Vec::new(),
        }
    }

    #[test]
    fn test_in_order_resolution() {
        let queue = RequestQueue::new();
        queue.push(request(0, 0xA));
        queue.push(request(1, 0xB));

        match queue.resolve(0xA) {
            Resolution::InOrder(req) => assert_eq!(req.fc_id, 0),
            other => panic!("expected in-order, got {other:?}"),
        }
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_out_of_order_permutation_recovery() {
        // Handles [A, B, C]; completions arrive [B, A, C]. The first two
        // are recovered with the anomaly flag, the third matches the head
        // normally.
        let queue = RequestQueue::new();
        queue.push(request(0, 0xA));
        queue.push(request(1, 0xB));
        queue.push(request(2, 0xC));

        match queue.resolve(0xB) {
            Resolution::Recovered(req) => assert_eq!(req.fc_id, 1),
            other => panic!("expected recovery, got {other:?}"),
        }
        match queue.resolve(0xA) {
            Resolution::Recovered(req) => assert_eq!(req.fc_id, 0),
            other => panic!("expected recovery, got {other:?}"),
        }
        match queue.resolve(0xC) {
            Resolution::InOrder(req) => assert_eq!(req.fc_id, 2),
            other => panic!("expected in-order, got {other:?}"),
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unmatched_leaves_queue_intact() {
        let queue = RequestQueue::new();
        queue.push(request(0, 0xA));
        queue.push(request(1, 0xB));

        assert!(matches!(queue.resolve(0xDEAD), Resolution::Unmatched));
        assert_eq!(queue.len(), 2);

        // Order preserved: the head still resolves in order.
        match queue.resolve(0xA) {
            Resolution::InOrder(req) => assert_eq!(req.fc_id, 0),
            other => panic!("expected in-order, got {other:?}"),
        }
    }

    #[test]
    fn test_peek_identity_does_not_remove() {
        let queue = RequestQueue::new();
        queue.push(request(7, 0xA));

        assert_eq!(queue.peek_identity(0xA), Some((7, 107)));
        assert_eq!(queue.peek_identity(0xB), None);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_any_permutation_resolves_every_request() {
        use proptest::prelude::*;

        // Whatever order the firmware completes in, every completion
        // resolves to the request that owns its handle and nothing is
        // dropped.
        proptest!(|(perm in Just((0u64..6).collect::<Vec<_>>()).prop_shuffle())| {
            let queue = RequestQueue::new();
            for i in 0..6u64 {
                queue.push(request(i as u32, 0xA000 + i));
            }
            for &i in &perm {
                match queue.resolve(0xA000 + i) {
                    Resolution::InOrder(req) | Resolution::Recovered(req) => {
                        prop_assert_eq!(req.fc_id, i as u32);
                    }
                    Resolution::Unmatched => prop_assert!(false, "completion dropped"),
                }
            }
            prop_assert!(queue.is_empty());
        });
    }

    #[test]
    fn test_remove_by_handle_unwinds_enqueue() {
        let queue = RequestQueue::new();
        queue.push(request(0, 0xA));
        queue.push(request(1, 0xB));

        let removed = queue.remove_by_handle(0xB).unwrap();
        assert_eq!(removed.fc_id, 1);
        assert_eq!(queue.len(), 1);
        assert!(queue.remove_by_handle(0xB).is_none());
    }
}
