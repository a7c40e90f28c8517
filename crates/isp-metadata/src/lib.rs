//! Capture-Control Metadata Model
//!
//! This crate provides the tagged metadata schema exchanged with the camera
//! framework: typed per-tag entries, immutable snapshots, the two-slot
//! current/previous history used for delta detection, and the field-group
//! bitmask that drives delta-encoded firmware commands.

mod controls;
mod delta;
mod error;
mod snapshot;
mod tags;
mod value;

pub use controls::{
    AeMode, AeState, AfMode, AfState, AntibandingMode, AwbMode, AwbState, ColorCorrectionMode,
    ControlMode, DemosaicMode, EffectMode, FaceDetectMode, FlashMode, FlashState, LensState,
    ProcessingMode, SceneFlicker, SceneMode, TestPatternMode, TonemapMode, TriggerValue,
    VideoStabilizationMode,
};
pub use delta::{DeltaDetector, FieldGroup, FieldMask};
pub use error::MetadataError;
pub use snapshot::{MetadataSnapshot, SnapshotHistory};
pub use tags::{EntryType, Tag};
pub use value::{MetadataEntry, MetadataValue, Rational};
