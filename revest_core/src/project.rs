//! # Project Data Structures
//!
//! A [`Project`] is a named, ordered collection of [`Room`]s. Each room keeps
//! its [`RoomSpec`] together with the [`MaterialResult`] computed from it.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── id, name, created, modified
//! └── rooms: Vec<Room> (display order)
//!     ├── id, name
//!     ├── spec: RoomSpec (flattened into the room record)
//!     └── results: MaterialResult (cached)
//! ```
//!
//! Rooms are immutable values: editing a room builds a new [`Room`] with the
//! same id, so a cached result can never drift from its spec.
//!
//! ## Example
//!
//! ```rust
//! use revest_core::calculations::RoomSpec;
//! use revest_core::project::{Project, Room, RoomId};
//!
//! let mut project = Project::new("Beach House");
//! let room = Room::new(RoomId::generate(), "Kitchen", RoomSpec::new(4.0, 3.0, 60.0, 60.0, 3.0)).unwrap();
//! project.push_room(room);
//!
//! assert_eq!(project.totals().tiles_units, 37);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{compute, MaterialResult, RoomSpec};
use crate::errors::{CalcError, CalcResult};

/// Name given to a project created with a blank name
pub const DEFAULT_PROJECT_NAME: &str = "Untitled project";

/// Name given to a room saved with a blank name
pub const DEFAULT_ROOM_NAME: &str = "Room";

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random (v4 UUID) id
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

define_id!(
    /// Opaque project identifier.
    ///
    /// New ids are UUIDs; any string read from storage is accepted.
    ProjectId
);

define_id!(
    /// Opaque room identifier, unique within the store.
    RoomId
);

fn normalize_name(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A tiled room: its spec and the materials computed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    id: RoomId,
    name: String,
    #[serde(flatten)]
    spec: RoomSpec,
    results: MaterialResult,
}

impl Room {
    /// Build a room, computing its materials.
    ///
    /// A blank name becomes [`DEFAULT_ROOM_NAME`].
    ///
    /// # Errors
    ///
    /// * `CalcError::InvalidInput` - If the spec fails validation
    pub fn new(id: RoomId, name: &str, spec: RoomSpec) -> CalcResult<Self> {
        let results = compute(&spec)?;
        Ok(Room {
            id,
            name: normalize_name(name, DEFAULT_ROOM_NAME),
            spec,
            results,
        })
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &RoomSpec {
        &self.spec
    }

    /// Cached materials for the current spec
    pub fn results(&self) -> &MaterialResult {
        &self.results
    }
}

/// Aggregate materials across all rooms of a project.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectTotals {
    #[serde(rename = "area_m2")]
    pub area_m2: f64,

    #[serde(rename = "areaWithWaste_m2")]
    pub area_with_waste_m2: f64,

    #[serde(rename = "tiles_units")]
    pub tiles_units: u64,

    #[serde(rename = "mortarBags")]
    pub mortar_bags: u64,

    #[serde(rename = "groutKg")]
    pub grout_kg: f64,

    #[serde(rename = "roomCount")]
    pub room_count: usize,
}

impl ProjectTotals {
    fn accumulate(mut self, results: &MaterialResult) -> Self {
        self.area_m2 += results.area_m2;
        self.area_with_waste_m2 += results.area_with_waste_m2;
        self.tiles_units = self.tiles_units.saturating_add(results.tiles_units);
        self.mortar_bags = self.mortar_bags.saturating_add(results.mortar_bags);
        self.grout_kg += results.grout_kg;
        self.room_count += 1;
        self
    }
}

/// One line of the project overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    #[serde(rename = "roomCount")]
    pub room_count: usize,
    #[serde(rename = "totalArea_m2")]
    pub total_area_m2: f64,
}

/// A named collection of rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: String,
    #[serde(default)]
    rooms: Vec<Room>,
    #[serde(default = "Utc::now")]
    created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    modified: DateTime<Utc>,
}

impl Project {
    /// Create an empty project with a fresh id.
    ///
    /// A blank name becomes [`DEFAULT_PROJECT_NAME`].
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Project {
            id: ProjectId::generate(),
            name: normalize_name(name, DEFAULT_PROJECT_NAME),
            rooms: Vec::new(),
            created: now,
            modified: now,
        }
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rooms in display order
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == *id)
    }

    /// Append a room at the end of the sequence.
    pub fn push_room(&mut self, room: Room) {
        self.rooms.push(room);
        self.touch();
    }

    /// Replace the room with the same id, keeping its position.
    ///
    /// # Errors
    ///
    /// * `CalcError::NotFound` - If no room has `room.id()`
    pub fn replace_room(&mut self, room: Room) -> CalcResult<()> {
        let slot = self
            .rooms
            .iter_mut()
            .find(|r| r.id == room.id)
            .ok_or_else(|| CalcError::not_found("room", room.id.as_str()))?;
        *slot = room;
        self.touch();
        Ok(())
    }

    /// Remove a room by id, returning it.
    ///
    /// # Errors
    ///
    /// * `CalcError::NotFound` - If the id is absent
    pub fn remove_room(&mut self, id: &RoomId) -> CalcResult<Room> {
        let index = self
            .rooms
            .iter()
            .position(|r| r.id == *id)
            .ok_or_else(|| CalcError::not_found("room", id.as_str()))?;
        let room = self.rooms.remove(index);
        self.touch();
        Ok(room)
    }

    /// Sum of the cached results of every room.
    ///
    /// Always derived from the rooms, never stored.
    pub fn totals(&self) -> ProjectTotals {
        self.rooms
            .iter()
            .fold(ProjectTotals::default(), |totals, room| totals.accumulate(&room.results))
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            room_count: self.rooms.len(),
            total_area_m2: self.rooms.iter().fold(0.0, |area, r| area + r.results.area_m2),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kitchen() -> Room {
        Room::new(RoomId::from("r-1"), "Kitchen", RoomSpec::new(4.0, 3.0, 60.0, 60.0, 3.0)).unwrap()
    }

    fn bathroom() -> Room {
        Room::new(RoomId::from("r-2"), "Bathroom", RoomSpec::new(2.0, 1.5, 30.0, 30.0, 2.0)).unwrap()
    }

    #[test]
    fn test_totals_at_count_limit() {
        use crate::calculations::tiling::MAX_COUNT;

        let largest = MaterialResult {
            tiles_units: MAX_COUNT,
            mortar_bags: MAX_COUNT,
            ..MaterialResult::default()
        };
        let totals = ProjectTotals::default().accumulate(&largest).accumulate(&largest);
        assert_eq!(totals.tiles_units, 2 * MAX_COUNT);
        assert_eq!(totals.room_count, 2);

        let hand_edited = MaterialResult {
            tiles_units: u64::MAX,
            mortar_bags: u64::MAX,
            ..MaterialResult::default()
        };
        let totals = ProjectTotals::default().accumulate(&hand_edited).accumulate(&hand_edited);
        assert_eq!(totals.tiles_units, u64::MAX);
        assert_eq!(totals.mortar_bags, u64::MAX);
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("  Beach House ");
        assert_eq!(project.name(), "Beach House");
        assert!(project.rooms().is_empty());
        assert_eq!(project.created(), project.modified());
    }

    #[test]
    fn test_blank_names_get_defaults() {
        assert_eq!(Project::new("   ").name(), DEFAULT_PROJECT_NAME);
        let room = Room::new(RoomId::generate(), "", RoomSpec::new(1.0, 1.0, 10.0, 10.0, 2.0)).unwrap();
        assert_eq!(room.name(), DEFAULT_ROOM_NAME);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ProjectId::generate(), ProjectId::generate());
        assert_ne!(RoomId::generate(), RoomId::generate());
    }

    #[test]
    fn test_room_rejects_invalid_spec() {
        let result = Room::new(RoomId::generate(), "Hall", RoomSpec::new(0.0, 3.0, 60.0, 60.0, 3.0));
        assert!(matches!(result, Err(CalcError::InvalidInput { .. })));
    }

    #[test]
    fn test_totals_sum_rooms() {
        let mut project = Project::new("House");
        project.push_room(kitchen());
        project.push_room(bathroom());

        let k = *kitchen().results();
        let b = *bathroom().results();
        let totals = project.totals();
        assert_eq!(totals.room_count, 2);
        assert_eq!(totals.tiles_units, k.tiles_units + b.tiles_units);
        assert_eq!(totals.mortar_bags, k.mortar_bags + b.mortar_bags);
        assert!((totals.area_m2 - (k.area_m2 + b.area_m2)).abs() < 1e-9);
        assert!((totals.grout_kg - (k.grout_kg + b.grout_kg)).abs() < 1e-9);
    }

    #[test]
    fn test_remove_room_subtracts_contribution() {
        let mut project = Project::new("House");
        project.push_room(kitchen());
        project.push_room(bathroom());
        let before = project.totals();

        let removed = project.remove_room(&RoomId::from("r-2")).unwrap();
        let after = project.totals();
        assert_eq!(after.tiles_units, before.tiles_units - removed.results().tiles_units);
        assert_eq!(after.mortar_bags, before.mortar_bags - removed.results().mortar_bags);
        assert!((after.grout_kg - (before.grout_kg - removed.results().grout_kg)).abs() < 1e-9);
    }

    #[test]
    fn test_replace_room_keeps_position() {
        let mut project = Project::new("House");
        project.push_room(kitchen());
        project.push_room(bathroom());

        let edited = Room::new(RoomId::from("r-1"), "Big Kitchen", RoomSpec::new(6.0, 4.0, 60.0, 60.0, 3.0)).unwrap();
        project.replace_room(edited).unwrap();

        assert_eq!(project.rooms()[0].id().as_str(), "r-1");
        assert_eq!(project.rooms()[0].name(), "Big Kitchen");
        assert_eq!(project.rooms()[1].id().as_str(), "r-2");
    }

    #[test]
    fn test_missing_room() {
        let mut project = Project::new("House");
        let err = project.remove_room(&RoomId::from("nope")).unwrap_err();
        assert_eq!(err, CalcError::not_found("room", "nope"));
        assert!(project.replace_room(kitchen()).is_err());
    }

    #[test]
    fn test_summary() {
        let mut project = Project::new("House");
        project.push_room(kitchen());
        let summary = project.summary();
        assert_eq!(summary.room_count, 1);
        assert_eq!(summary.total_area_m2, 12.0);
    }

    #[test]
    fn test_room_json_is_flat() {
        let json = serde_json::to_value(kitchen()).unwrap();
        assert_eq!(json["id"], "r-1");
        assert_eq!(json["length_m"], 4.0);
        assert_eq!(json["results"]["tiles_units"], 37);

        let roundtrip: Room = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip, kitchen());
    }

    #[test]
    fn test_legacy_room_record() {
        let room: Room = serde_json::from_str(
            r#"{"id": "1712345678901", "name": "Sala", "length": 4, "width": 3,
                "tileLength": 60, "tileWidth": 60, "groutJoint": 3, "wasteMargin": 10,
                "cementWeight": 20, "results": {"area": 12, "tiles": 37, "mortar": 4, "grout": 0.17}}"#,
        )
        .unwrap();
        assert_eq!(room.id().as_str(), "1712345678901");
        assert_eq!(room.spec().tile_length_cm, 60.0);
        assert_eq!(room.results().mortar_bags, 4);
    }
}
