//! # Material Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Spec` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `compute(spec) -> Result<*Result, CalcError>` - Pure calculation function
//!
//! ## Available Calculations
//!
//! - [`tiling`] - Floor tiling: tiles, adhesive mortar and grout

pub mod tiling;

pub use tiling::{compute, MaterialResult, RoomSpec};
