//! Metadata Error Types

use thiserror::Error;

use crate::tags::{EntryType, Tag};

/// Errors raised by the metadata model.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Value type does not match the tag's declared wire type
    #[error("type mismatch for {tag:?}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        tag: Tag,
        expected: EntryType,
        actual: EntryType,
    },

    /// Tag code not present in the registry
    #[error("unknown metadata tag 0x{0:08X}")]
    UnknownTag(u32),
}
