//! Pipeline Error Types

use isp_firmware::SubmitError;
use thiserror::Error;

/// Errors surfaced synchronously on the submission path.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// All firmware command slots are outstanding
    #[error("no free firmware command slot")]
    NoCommandSlot,

    /// Firmware rejected the command; the request was not enqueued
    #[error("firmware submission failed: {0}")]
    Submit(#[from] SubmitError),
}

/// Errors raised by the per-camera session state machine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Operation requires a streaming session
    #[error("session is not streaming")]
    NotStreaming,

    /// Open on an already-streaming session
    #[error("session already streaming")]
    AlreadyStreaming,

    /// Session is in the error state and needs a reset
    #[error("session is in the error state")]
    Faulted,

    /// Outstanding requests did not drain before the teardown deadline
    #[error("queue drain timed out with {outstanding} requests outstanding")]
    DrainTimeout { outstanding: usize },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Errors raised by the driver surface.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Camera index outside the attached set
    #[error("unknown camera {0}")]
    UnknownCamera(u32),

    /// Profile id not present in the profile table
    #[error("unknown profile {0}")]
    UnknownProfile(u32),

    #[error(transparent)]
    Session(#[from] SessionError),
}
