//! Metadata <-> Firmware Field Translation
//!
//! The translation engine between the framework's tagged metadata and the
//! firmware frame-control ABI. The to-firmware direction is delta-encoded:
//! only field groups whose tags changed since the previous snapshot are
//! written and flagged in the valid mask. The from-firmware direction maps
//! per-frame results back into metadata entries, suppressing values that
//! match the last committed result.

mod convert;
mod error;
mod from_firmware;
mod geometry;
mod modes;
mod to_firmware;

pub use convert::EV_STEP_DENOMINATOR;
pub use error::TranslationError;
pub use from_firmware::CommittedState;
pub use geometry::{BinningMode, GeometryMapper, SensorProfile};
pub use to_firmware::FieldTranslator;
