//! # Unit Types
//!
//! Type-safe wrappers for the metric units used by the estimation engine.
//! They are plain f64 newtypes, serialized as bare numbers.
//!
//! ## Metric Units
//!
//! - Room geometry: meters (m), square meters (m²)
//! - Tile faces: centimeters (cm)
//! - Grout joints and tile thickness: millimeters (mm)
//! - Mortar and grout: kilograms (kg)
//!
//! ## Example
//!
//! ```rust
//! use revest_core::units::{Centimeters, Meters, Millimeters};
//!
//! let tile = Centimeters(60.0);
//! let tile_m: Meters = tile.into();
//! let tile_mm: Millimeters = tile.into();
//! assert_eq!(tile_m.0, 0.6);
//! assert_eq!(tile_mm.0, 600.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Mul;

// ============================================================================
// Length Units
// ============================================================================

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl From<Centimeters> for Meters {
    fn from(cm: Centimeters) -> Self {
        Meters(cm.0 / 100.0)
    }
}

impl From<Centimeters> for Millimeters {
    fn from(cm: Centimeters) -> Self {
        Millimeters(cm.0 * 10.0)
    }
}

impl Meters {
    /// Area of the rectangle spanned by two lengths
    pub fn by(self, other: Meters) -> SquareMeters {
        SquareMeters(self.0 * other.0)
    }
}

// ============================================================================
// Area Units
// ============================================================================

/// Area in square meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMeters(pub f64);

// ============================================================================
// Mass Units
// ============================================================================

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

impl Mul<f64> for SquareMeters {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        SquareMeters(self.0 * rhs)
    }
}
