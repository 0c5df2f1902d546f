//! # revest_core - Tiling Material Estimation Engine
//!
//! `revest_core` estimates the tiles, adhesive mortar and grout needed to
//! tile rectangular rooms, and keeps a user's projects (named collections of
//! rooms) in a store that is saved after every change.
//!
//! ## Design Philosophy
//!
//! - **Pure engine**: [`calculations::compute`] has no state and no I/O
//! - **JSON-First**: All records implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Injectable persistence**: The store is an owned value bound to a
//!   [`file_io::StateSlot`], never a global
//!
//! ## Quick Start
//!
//! ```rust
//! use revest_core::calculations::{compute, RoomSpec};
//!
//! // 4 m x 3 m room, 60 x 60 cm tiles, 3 mm joints
//! let spec = RoomSpec::new(4.0, 3.0, 60.0, 60.0, 3.0);
//! let result = compute(&spec).unwrap();
//!
//! // Serialize to JSON for storage or transmission
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! assert!(json.contains("tiles_units"));
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - The estimation engine
//! - [`project`] - Projects, rooms and aggregate totals
//! - [`store`] - Project store, selection and persistence rules
//! - [`preferences`] - Theme and sidebar preferences
//! - [`config`] - Where the store is persisted
//! - [`file_io`] - Durable slots with atomic saves and locking
//! - [`units`] - Type-safe metric unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod config;
pub mod errors;
pub mod file_io;
pub mod preferences;
pub mod project;
pub mod store;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{compute, MaterialResult, RoomSpec};
pub use config::StoreConfig;
pub use errors::{CalcError, CalcResult};
pub use file_io::{FileSlot, MemorySlot, StateSlot};
pub use preferences::{Preferences, Theme};
pub use project::{Project, ProjectId, ProjectSummary, ProjectTotals, Room, RoomId};
pub use store::{ProjectStore, StoreState};
