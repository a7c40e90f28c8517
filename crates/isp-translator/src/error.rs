//! Translation Error Types

use isp_metadata::Tag;
use thiserror::Error;

/// Field-level translation failures.
///
/// These are recovered locally: the offending field group is skipped for the
/// request (its valid bit stays clear, the firmware keeps the previously
/// programmed value) and the error is logged. They never abort a request.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// Required tag absent from the snapshot
    #[error("missing required tag {0:?}")]
    MissingTag(Tag),

    /// Entry present but with the wrong shape for its tag
    #[error("malformed entry for {tag:?}: {reason}")]
    MalformedEntry { tag: Tag, reason: &'static str },

    /// Region list length not a multiple of the region stride
    #[error("region list for {tag:?} has length {len}, not a multiple of {stride}")]
    BadRegionList { tag: Tag, len: usize, stride: usize },
}
