//! Per-tag change detection and the field-group mask
//!
//! The firmware command is delta-encoded: a group bit is set only when a
//! metadata tag owned by that group changed since the previous request, and
//! the firmware re-reads only the fields of set groups.

use serde::{Deserialize, Serialize};

use crate::snapshot::MetadataSnapshot;
use crate::tags::Tag;
use crate::value::MetadataEntry;

/// One bit per translated firmware field group.
///
/// Bit positions are firmware ABI: they match the `valid_mask` layout of the
/// frame-control command and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FieldGroup {
    ControlMode = 0,
    SceneMode = 1,
    EffectMode = 2,
    VideoStabilization = 3,
    AeMode = 4,
    AeLock = 5,
    AeAntibanding = 6,
    AeEvCompensation = 7,
    AeFpsRange = 8,
    AeRegions = 9,
    AeTrigger = 10,
    AfMode = 11,
    AfRegions = 12,
    AfTrigger = 13,
    AwbMode = 14,
    AwbLock = 15,
    SensorExposure = 16,
    SensorFrameDuration = 17,
    SensorGain = 18,
    TestPattern = 19,
    LensFocus = 20,
    LensAperture = 21,
    LensFilterDensity = 22,
    LensFocalLength = 23,
    LensOis = 24,
    Flash = 25,
    TonemapMode = 26,
    TonemapCurve = 27,
    CcMode = 28,
    CcTransform = 29,
    CcGains = 30,
    CcAberration = 31,
    NoiseReduction = 32,
    Edge = 33,
    Shading = 34,
    HotPixel = 35,
    Demosaic = 36,
    ScalerCrop = 37,
    BlackLevelLock = 38,
    StatsFaceDetect = 39,
    StatsHistogram = 40,
    StatsSharpnessMap = 41,
    StatsHotPixelMap = 42,
    StatsLensShadingMap = 43,
}

impl FieldGroup {
    /// Mask bit for this group.
    pub fn bit(self) -> u64 {
        1u64 << (self as u8)
    }
}

/// Accumulator of changed field groups for one frame-control command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMask(u64);

impl FieldMask {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn set(&mut self, group: FieldGroup) {
        self.0 |= group.bit();
    }

    /// Clear a group bit. Used by the fail-open path when a field turns out
    /// to be untranslatable this request.
    pub fn clear(&mut self, group: FieldGroup) {
        self.0 &= !group.bit();
    }

    pub fn contains(self, group: FieldGroup) -> bool {
        self.0 & group.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: FieldMask) -> FieldMask {
        FieldMask(self.0 | other.0)
    }
}

/// Snapshot-pair change detection.
pub struct DeltaDetector;

impl DeltaDetector {
    /// True when `cur` carries `tag` and its value differs from `prev`.
    ///
    /// A missing previous snapshot, or a previous snapshot without the tag,
    /// always counts as changed: nothing may be silently skipped on the
    /// first request of a stream.
    pub fn changed(tag: Tag, cur: &MetadataSnapshot, prev: Option<&MetadataSnapshot>) -> bool {
        let Some(cur_entry) = cur.get(tag) else {
            return false;
        };
        match prev.and_then(|p| p.get(tag)) {
            None => true,
            Some(prev_entry) => cur_entry.value != prev_entry.value,
        }
    }

    /// The current entry for `tag`, when present and changed against `prev`.
    pub fn updated<'a>(
        tag: Tag,
        cur: &'a MetadataSnapshot,
        prev: Option<&MetadataSnapshot>,
    ) -> Option<&'a MetadataEntry> {
        if Self::changed(tag, cur, prev) {
            cur.get(tag)
        } else {
            None
        }
    }
}
