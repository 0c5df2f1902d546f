//! # Tiling Material Estimate
//!
//! Estimates the materials needed to tile a rectangular floor: tile units,
//! adhesive mortar bags and grout mass.
//!
//! ## Method
//!
//! 1. Floor area `A = length × width`
//! 2. Area with waste `Aw = A × (1 + waste% / 100)`
//! 3. Tiles `= ⌈Aw / (tile_length_m × tile_width_m)⌉` (partial tiles are not usable)
//! 4. Mortar bags `= ⌈Aw × consumption / bag_weight⌉` (partial bags are not sold)
//! 5. Grout consumption per m² `= ((L + W) × H × J × ρ) / (L × W)` with tile
//!    faces `L`, `W` and thickness `H` in mm, joint width `J` in mm and grout
//!    density `ρ = 1.58`; grout mass `= consumption × Aw`, rounded to 2 decimals.
//!
//! ## Example
//!
//! ```rust
//! use revest_core::calculations::tiling::{compute, RoomSpec};
//!
//! let spec = RoomSpec::new(4.0, 3.0, 60.0, 60.0, 3.0);
//! let result = compute(&spec).unwrap();
//!
//! assert_eq!(result.tiles_units, 37);
//! assert_eq!(result.mortar_bags, 4);
//! assert_eq!(result.grout_kg, 0.17);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::{Centimeters, Kilograms, Meters, Millimeters, SquareMeters};

/// Default cutting-loss allowance in percent
pub const DEFAULT_WASTE_MARGIN_PCT: f64 = 10.0;

/// Default adhesive mortar consumption in kg per m²
pub const DEFAULT_MORTAR_CONSUMPTION_KG_PER_M2: f64 = 6.0;

/// Default mortar bag weight in kg
pub const DEFAULT_MORTAR_BAG_WEIGHT_KG: f64 = 20.0;

/// Assumed tile thickness for the grout estimate (mm)
pub const TILE_THICKNESS_MM: f64 = 8.0;

/// Grout density factor used by the coverage formula
pub const GROUT_DENSITY: f64 = 1.58;

/// Largest tile or bag count stored; every integer up to 2^53 is exact in f64
pub const MAX_COUNT: u64 = 1 << 53;

fn default_waste_margin() -> f64 {
    DEFAULT_WASTE_MARGIN_PCT
}

fn default_mortar_consumption() -> f64 {
    DEFAULT_MORTAR_CONSUMPTION_KG_PER_M2
}

fn default_mortar_bag_weight() -> f64 {
    DEFAULT_MORTAR_BAG_WEIGHT_KG
}

/// Room geometry and tiling parameters.
///
/// Older records used unsuffixed names (`length`, `tileLength`,
/// `cementWeight`, ...); those are accepted when reading.
///
/// ## JSON Example
///
/// ```json
/// {
///   "length_m": 4.0,
///   "width_m": 3.0,
///   "tileLength_cm": 60.0,
///   "tileWidth_cm": 60.0,
///   "groutJoint_mm": 3.0,
///   "wasteMargin_pct": 10.0,
///   "mortarConsumption_kg_per_m2": 6.0,
///   "mortarBagWeight_kg": 20.0
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomSpec {
    /// Room length in meters
    #[serde(rename = "length_m", alias = "length")]
    pub length_m: f64,

    /// Room width in meters
    #[serde(rename = "width_m", alias = "width")]
    pub width_m: f64,

    /// Tile length in centimeters
    #[serde(rename = "tileLength_cm", alias = "tileLength")]
    pub tile_length_cm: f64,

    /// Tile width in centimeters
    #[serde(rename = "tileWidth_cm", alias = "tileWidth")]
    pub tile_width_cm: f64,

    /// Gap between adjacent tiles in millimeters
    #[serde(rename = "groutJoint_mm", alias = "groutJoint")]
    pub grout_joint_mm: f64,

    /// Extra area for cutting loss, in percent
    #[serde(
        rename = "wasteMargin_pct",
        alias = "wasteMargin",
        default = "default_waste_margin"
    )]
    pub waste_margin_pct: f64,

    /// Adhesive mortar consumption in kg per m²
    #[serde(
        rename = "mortarConsumption_kg_per_m2",
        default = "default_mortar_consumption"
    )]
    pub mortar_consumption_kg_per_m2: f64,

    /// Weight of one mortar bag in kg
    #[serde(
        rename = "mortarBagWeight_kg",
        alias = "cementWeight",
        default = "default_mortar_bag_weight"
    )]
    pub mortar_bag_weight_kg: f64,
}

impl RoomSpec {
    /// Create a spec with the default waste margin and mortar parameters.
    pub fn new(length_m: f64, width_m: f64, tile_length_cm: f64, tile_width_cm: f64, grout_joint_mm: f64) -> Self {
        RoomSpec {
            length_m,
            width_m,
            tile_length_cm,
            tile_width_cm,
            grout_joint_mm,
            waste_margin_pct: DEFAULT_WASTE_MARGIN_PCT,
            mortar_consumption_kg_per_m2: DEFAULT_MORTAR_CONSUMPTION_KG_PER_M2,
            mortar_bag_weight_kg: DEFAULT_MORTAR_BAG_WEIGHT_KG,
        }
    }

    pub fn with_waste_margin(mut self, waste_margin_pct: f64) -> Self {
        self.waste_margin_pct = waste_margin_pct;
        self
    }

    pub fn with_mortar(mut self, consumption_kg_per_m2: f64, bag_weight_kg: f64) -> Self {
        self.mortar_consumption_kg_per_m2 = consumption_kg_per_m2;
        self.mortar_bag_weight_kg = bag_weight_kg;
        self
    }

    /// Validate input parameters.
    ///
    /// Room and tile dimensions must be positive finite numbers. The joint,
    /// waste margin and mortar consumption may be zero but not negative, and
    /// the bag weight must be positive.
    pub fn validate(&self) -> CalcResult<()> {
        require_positive("length_m", self.length_m, "Room length must be a positive number")?;
        require_positive("width_m", self.width_m, "Room width must be a positive number")?;
        require_positive(
            "tileLength_cm",
            self.tile_length_cm,
            "Tile length must be a positive number",
        )?;
        require_positive(
            "tileWidth_cm",
            self.tile_width_cm,
            "Tile width must be a positive number",
        )?;
        require_non_negative(
            "groutJoint_mm",
            self.grout_joint_mm,
            "Grout joint cannot be negative",
        )?;
        require_non_negative(
            "wasteMargin_pct",
            self.waste_margin_pct,
            "Waste margin cannot be negative",
        )?;
        require_non_negative(
            "mortarConsumption_kg_per_m2",
            self.mortar_consumption_kg_per_m2,
            "Mortar consumption cannot be negative",
        )?;
        require_positive(
            "mortarBagWeight_kg",
            self.mortar_bag_weight_kg,
            "Bag weight must be a positive number",
        )?;
        Ok(())
    }

    /// Floor area A = length × width
    pub fn area(&self) -> SquareMeters {
        Meters(self.length_m).by(Meters(self.width_m))
    }

    /// Floor area including the waste margin
    pub fn area_with_waste(&self) -> SquareMeters {
        self.area() * (1.0 + self.waste_margin_pct / 100.0)
    }

    /// Face area of a single tile
    pub fn tile_area(&self) -> SquareMeters {
        let length: Meters = Centimeters(self.tile_length_cm).into();
        let width: Meters = Centimeters(self.tile_width_cm).into();
        length.by(width)
    }

    /// Grout consumption per m² of tiled floor
    pub fn grout_consumption_kg_per_m2(&self) -> Kilograms {
        let length: Millimeters = Centimeters(self.tile_length_cm).into();
        let width: Millimeters = Centimeters(self.tile_width_cm).into();
        let (l, w) = (length.0, width.0);
        Kilograms(((l + w) * TILE_THICKNESS_MM * self.grout_joint_mm * GROUT_DENSITY) / (l * w))
    }
}

fn require_positive(field: &str, value: f64, reason: &str) -> CalcResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), reason))
    }
}

fn require_non_negative(field: &str, value: f64, reason: &str) -> CalcResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), reason))
    }
}

/// Derived quantity must be finite and non-negative.
fn require_quantity(field: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CalcError::invalid_input(
            field,
            value.to_string(),
            "Dimensions are out of range for this estimate",
        ))
    }
}

/// Round a count up and check it fits in [`MAX_COUNT`].
fn whole_count(field: &str, value: f64) -> CalcResult<u64> {
    let count = require_quantity(field, value)?.ceil();
    if count > MAX_COUNT as f64 {
        return Err(CalcError::invalid_input(
            field,
            count.to_string(),
            "Count is too large to estimate",
        ));
    }
    Ok(count as u64)
}

/// Materials required for one room.
///
/// Derived from a [`RoomSpec`] by [`compute`]; never edited by hand.
///
/// ## JSON Example
///
/// ```json
/// {
///   "area_m2": 12.0,
///   "areaWithWaste_m2": 13.2,
///   "tiles_units": 37,
///   "mortarBags": 4,
///   "groutKg": 0.17
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialResult {
    /// Floor area in m², rounded to 2 decimals
    #[serde(rename = "area_m2", alias = "area")]
    pub area_m2: f64,

    /// Floor area including the waste margin, in m²
    #[serde(rename = "areaWithWaste_m2", default)]
    pub area_with_waste_m2: f64,

    /// Number of whole tiles
    #[serde(rename = "tiles_units", alias = "tiles")]
    pub tiles_units: u64,

    /// Number of whole mortar bags
    #[serde(rename = "mortarBags", alias = "mortar")]
    pub mortar_bags: u64,

    /// Grout mass in kg, rounded to 2 decimals
    #[serde(rename = "groutKg", alias = "grout")]
    pub grout_kg: f64,
}

/// Compute the materials for a room.
///
/// # Arguments
///
/// * `spec` - Room geometry and tiling parameters
///
/// # Returns
///
/// * `Ok(MaterialResult)` - Estimated quantities
/// * `Err(CalcError::InvalidInput)` - If any dimension is not a positive finite
///   number, or the derived quantities overflow (see [`MAX_COUNT`])
pub fn compute(spec: &RoomSpec) -> CalcResult<MaterialResult> {
    spec.validate()?;

    let area = require_quantity("area_m2", spec.area().0)?;
    let area_with_waste = require_quantity("areaWithWaste_m2", spec.area_with_waste().0)?;
    let tile_area = spec.tile_area().0;
    if tile_area <= 0.0 {
        return Err(CalcError::invalid_input(
            "tileLength_cm",
            spec.tile_length_cm.to_string(),
            "Tile is too small to estimate",
        ));
    }

    let tiles_units = whole_count("tiles_units", area_with_waste / tile_area)?;
    let mortar_bags = whole_count(
        "mortarBags",
        area_with_waste * spec.mortar_consumption_kg_per_m2 / spec.mortar_bag_weight_kg,
    )?;
    let grout = require_quantity("groutKg", spec.grout_consumption_kg_per_m2().0 * area_with_waste)?;

    let result = MaterialResult {
        area_m2: round_to_cents(area),
        area_with_waste_m2: area_with_waste,
        tiles_units,
        mortar_bags,
        grout_kg: round_to_cents(grout),
    };
    debug!(
        "estimate: {}x{} m, tile {}x{} cm -> {} tiles, {} bags, {} kg grout",
        spec.length_m,
        spec.width_m,
        spec.tile_length_cm,
        spec.tile_width_cm,
        result.tiles_units,
        result.mortar_bags,
        result.grout_kg
    );
    Ok(result)
}

/// Round to 2 decimal places, resolving exact half-cent ties away from zero.
///
/// `format!("{:.2}")` rounds the exact binary value but breaks ties to even;
/// the only exactly representable ties are odd multiples of 1/8.
pub fn round_to_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let is_tie = (value * 8.0).fract() == 0.0 && (value * 4.0).fract() != 0.0;
    if is_tie {
        return (value * 100.0).round() / 100.0;
    }
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_spec() -> RoomSpec {
        RoomSpec::new(4.0, 3.0, 60.0, 60.0, 3.0)
    }

    #[test]
    fn test_reference_room() {
        let result = compute(&test_spec()).unwrap();

        assert_eq!(result.area_m2, 12.0);
        assert!((result.area_with_waste_m2 - 13.2).abs() < 1e-9);
        // 13.2 / 0.36 = 36.67 -> 37
        assert_eq!(result.tiles_units, 37);
        // 13.2 * 6 / 20 = 3.96 -> 4
        assert_eq!(result.mortar_bags, 4);
        // (12000 * 8 * 3 * 1.58) / 36e6 = 0.01264 kg/m², * 13.2 = 0.1668
        assert_eq!(result.grout_kg, 0.17);
    }

    #[test]
    fn test_grout_consumption() {
        let consumption = test_spec().grout_consumption_kg_per_m2();
        assert!((consumption.0 - 0.01264).abs() < 1e-9);
    }

    #[test]
    fn test_rounding_up_invariant() {
        for length in [1.0, 2.35, 3.7, 5.05, 8.4] {
            for tile in [15.0, 30.0, 45.0, 60.0, 120.0] {
                let spec = RoomSpec::new(length, 2.2, tile, tile / 2.0, 2.0);
                let result = compute(&spec).unwrap();

                let exact_tiles = spec.area_with_waste().0 / spec.tile_area().0;
                assert!(result.tiles_units as f64 >= exact_tiles);
                assert!((result.tiles_units as f64) < exact_tiles + 1.0);

                let exact_bags = spec.area_with_waste().0 * spec.mortar_consumption_kg_per_m2
                    / spec.mortar_bag_weight_kg;
                assert!(result.mortar_bags as f64 >= exact_bags);
                assert!((result.mortar_bags as f64) < exact_bags + 1.0);
            }
        }
    }

    #[test]
    fn test_exact_fit_does_not_round_up() {
        // 1.0 x 0.5 floor with 50x50 tiles and no waste: exactly 2 tiles
        let spec = RoomSpec::new(1.0, 0.5, 50.0, 50.0, 2.0).with_waste_margin(0.0);
        let result = compute(&spec).unwrap();
        assert_eq!(result.tiles_units, 2);
    }

    #[test]
    fn test_deterministic() {
        let spec = RoomSpec::new(5.3, 2.7, 45.0, 45.0, 2.5).with_mortar(5.0, 25.0);
        assert_eq!(compute(&spec).unwrap(), compute(&spec).unwrap());
    }

    #[test]
    fn test_invalid_dimensions() {
        let cases: [fn(&mut RoomSpec); 8] = [
            |s| s.length_m = 0.0,
            |s| s.width_m = -3.0,
            |s| s.tile_length_cm = f64::NAN,
            |s| s.tile_width_cm = f64::INFINITY,
            |s| s.length_m = f64::NEG_INFINITY,
            |s| s.width_m = 0.0,
            |s| s.tile_length_cm = -60.0,
            |s| s.tile_width_cm = 0.0,
        ];
        for mutate in cases {
            let mut spec = test_spec();
            mutate(&mut spec);
            let err = compute(&spec).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_INPUT");
        }
    }

    #[test]
    fn test_invalid_field_is_named() {
        let mut spec = test_spec();
        spec.tile_width_cm = -1.0;
        match compute(&spec) {
            Err(CalcError::InvalidInput { field, .. }) => assert_eq!(field, "tileWidth_cm"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_bag_weight_rejected() {
        let spec = test_spec().with_mortar(6.0, 0.0);
        assert!(compute(&spec).is_err());
    }

    #[test]
    fn test_zero_joint_and_waste_allowed() {
        let spec = RoomSpec::new(2.0, 2.0, 25.0, 25.0, 0.0).with_waste_margin(0.0);
        let result = compute(&spec).unwrap();
        assert_eq!(result.tiles_units, 64);
        assert_eq!(result.grout_kg, 0.0);
    }

    #[test]
    fn test_overflowing_area_rejected() {
        let spec = RoomSpec::new(1e200, 1e200, 60.0, 60.0, 3.0);
        match compute(&spec) {
            Err(CalcError::InvalidInput { field, .. }) => assert_eq!(field, "area_m2"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_underflowing_tile_rejected() {
        let spec = RoomSpec::new(4.0, 3.0, 1e-200, 1e-200, 3.0);
        assert_eq!(compute(&spec).unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_count_limit() {
        // 1e8 m² of 1 cm² tiles is 1.1e12 tiles: allowed
        let spec = RoomSpec::new(1e4, 1e4, 1.0, 1.0, 3.0);
        let result = compute(&spec).unwrap();
        assert!(result.tiles_units <= MAX_COUNT);

        // 1e16 m² of 1 cm² tiles is past 2^53
        let spec = RoomSpec::new(1e8, 1e8, 1.0, 1.0, 3.0);
        match compute(&spec) {
            Err(CalcError::InvalidInput { field, .. }) => assert_eq!(field, "tiles_units"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(0.166848), 0.17);
        assert_eq!(round_to_cents(0.0556), 0.06);
        // exact ties go up
        assert_eq!(round_to_cents(0.125), 0.13);
        assert_eq!(round_to_cents(2.375), 2.38);
        // 1.005 is stored just below the tie
        assert_eq!(round_to_cents(1.005), 1.0);
        assert_eq!(round_to_cents(12.0), 12.0);
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(test_spec()).unwrap();
        assert_eq!(json["tileLength_cm"], 60.0);
        assert_eq!(json["mortarBagWeight_kg"], 20.0);

        let result = compute(&test_spec()).unwrap();
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["tiles_units"], 37);
        assert_eq!(json["groutKg"], 0.17);
    }

    #[test]
    fn test_defaults_applied_when_missing() {
        let spec: RoomSpec = serde_json::from_str(
            r#"{"length_m": 4, "width_m": 3, "tileLength_cm": 60, "tileWidth_cm": 60, "groutJoint_mm": 3}"#,
        )
        .unwrap();
        assert_eq!(spec, test_spec());
    }

    #[test]
    fn test_legacy_field_names() {
        let spec: RoomSpec = serde_json::from_str(
            r#"{"length": 4, "width": 3, "tileLength": 60, "tileWidth": 60,
                "groutJoint": 3, "wasteMargin": 10, "cementWeight": 20}"#,
        )
        .unwrap();
        assert_eq!(spec, test_spec());

        let result: MaterialResult =
            serde_json::from_str(r#"{"area": 12, "tiles": 37, "mortar": 4, "grout": 0.17}"#).unwrap();
        assert_eq!(result.tiles_units, 37);
        assert_eq!(result.area_with_waste_m2, 0.0);
    }
}
