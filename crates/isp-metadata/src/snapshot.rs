//! Metadata snapshots and the two-slot history

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::MetadataError;
use crate::tags::Tag;
use crate::value::{MetadataEntry, MetadataValue};

/// One deep-copied set of per-request control metadata, keyed by tag code.
///
/// A snapshot is built on the submission path and never mutated once it has
/// been published into a [`SnapshotHistory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSnapshot {
    entries: BTreeMap<u32, MetadataEntry>,
}

impl MetadataSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, validating the value against the tag's
    /// declared wire type.
    pub fn update(&mut self, tag: Tag, value: MetadataValue) -> Result<(), MetadataError> {
        if value.entry_type() != tag.entry_type() {
            return Err(MetadataError::TypeMismatch {
                tag,
                expected: tag.entry_type(),
                actual: value.entry_type(),
            });
        }
        self.entries.insert(tag.code(), MetadataEntry::new(tag, value));
        Ok(())
    }

    /// Look up an entry by tag.
    pub fn get(&self, tag: Tag) -> Option<&MetadataEntry> {
        self.entries.get(&tag.code())
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.contains_key(&tag.code())
    }

    /// Entries in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = &MetadataEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Two-slot current/previous snapshot ring.
///
/// Publishing demotes the current snapshot to the previous slot by move, so
/// at most two snapshots are alive per camera and neither is ever observed
/// half-updated.
#[derive(Debug, Default)]
pub struct SnapshotHistory {
    current: Option<Arc<MetadataSnapshot>>,
    previous: Option<Arc<MetadataSnapshot>>,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new snapshot, retiring the current one to the previous slot.
    pub fn publish(&mut self, snapshot: Arc<MetadataSnapshot>) {
        self.previous = self.current.take();
        self.current = Some(snapshot);
        debug!(
            entries = self.current.as_ref().map(|s| s.len()).unwrap_or(0),
            has_previous = self.previous.is_some(),
            "published metadata snapshot"
        );
    }

    pub fn current(&self) -> Option<&Arc<MetadataSnapshot>> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Arc<MetadataSnapshot>> {
        self.previous.as_ref()
    }

    /// Drop both slots. Used on stream close and profile switch so the first
    /// request of the next stream sees no previous snapshot.
    pub fn reset(&mut self) {
        self.current = None;
        self.previous = None;
    }
}
