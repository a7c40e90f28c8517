//! ROI coordinate mapping between framework and firmware spaces
//!
//! The framework always expresses region coordinates in full sensor
//! resolution. Binned readout profiles halve the pixel pitch on the binned
//! axes, so regions are scaled down on the way to the firmware and scaled
//! back up on the way out. Weights are dimensionless and never scaled.

use serde::{Deserialize, Serialize};

use isp_firmware::{FwFocusWindow, FwWindow};

/// Sensor readout binning classification of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinningMode {
    /// Full-resolution readout
    None,
    /// 2x2 binning, both axes halved
    Binned2x2,
    /// Vertical 2x binning, vertical axis halved only
    VerticalBin2x,
}

impl BinningMode {
    /// Horizontal scale divisor.
    pub fn h_factor(self) -> u32 {
        match self {
            BinningMode::Binned2x2 => 2,
            BinningMode::None | BinningMode::VerticalBin2x => 1,
        }
    }

    /// Vertical scale divisor.
    pub fn v_factor(self) -> u32 {
        match self {
            BinningMode::Binned2x2 | BinningMode::VerticalBin2x => 2,
            BinningMode::None => 1,
        }
    }
}

/// One named sensor readout configuration.
///
/// Region coordinates are only comparable within the same profile; every
/// mapped region implicitly carries the profile it was expressed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorProfile {
    pub id: u32,
    pub binning: BinningMode,
    /// Full sensor active array, the framework-facing coordinate space.
    pub active_width: u32,
    pub active_height: u32,
}

impl SensorProfile {
    pub fn new(id: u32, binning: BinningMode, active_width: u32, active_height: u32) -> Self {
        Self {
            id,
            binning,
            active_width,
            active_height,
        }
    }
}

/// Stateless coordinate mapper.
pub struct GeometryMapper;

impl GeometryMapper {
    /// Framework -> firmware: divide by the binning factors.
    pub fn window_to_fw(w: &FwWindow, profile: &SensorProfile) -> FwWindow {
        let h = profile.binning.h_factor();
        let v = profile.binning.v_factor();
        FwWindow {
            h_offset: w.h_offset / h,
            v_offset: w.v_offset / v,
            h_size: w.h_size / h,
            v_size: w.v_size / v,
        }
    }

    /// Firmware -> framework: exact inverse of [`Self::window_to_fw`].
    pub fn window_to_hal(w: &FwWindow, profile: &SensorProfile) -> FwWindow {
        let h = profile.binning.h_factor();
        let v = profile.binning.v_factor();
        FwWindow {
            h_offset: w.h_offset * h,
            v_offset: w.v_offset * v,
            h_size: w.h_size * h,
            v_size: w.v_size * v,
        }
    }

    /// Framework -> firmware for the five-field focus window form.
    pub fn focus_to_fw(w: &FwFocusWindow, profile: &SensorProfile) -> FwFocusWindow {
        let h = profile.binning.h_factor();
        let v = profile.binning.v_factor();
        FwFocusWindow {
            x_min: w.x_min / h,
            y_min: w.y_min / v,
            x_max: w.x_max / h,
            y_max: w.y_max / v,
            weight: w.weight,
        }
    }

    /// Firmware -> framework for the five-field focus window form.
    pub fn focus_to_hal(w: &FwFocusWindow, profile: &SensorProfile) -> FwFocusWindow {
        let h = profile.binning.h_factor();
        let v = profile.binning.v_factor();
        FwFocusWindow {
            x_min: w.x_min * h,
            y_min: w.y_min * v,
            x_max: w.x_max * h,
            y_max: w.y_max * v,
            weight: w.weight,
        }
    }
}
