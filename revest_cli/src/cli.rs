//! Command-line definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use revest_core::calculations::tiling::{
    DEFAULT_MORTAR_BAG_WEIGHT_KG, DEFAULT_MORTAR_CONSUMPTION_KG_PER_M2, DEFAULT_WASTE_MARGIN_PCT,
};
use revest_core::{RoomSpec, Theme};

/// Joint width offered when `--joint` is not given
const DEFAULT_JOINT_MM: f64 = 3.0;

/// RevestMaster - tiling material estimator
#[derive(Parser, Debug)]
#[command(name = "revest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the saved projects
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging (debug level) on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate materials for a single room without saving it
    Estimate(SpecArgs),

    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Manage the rooms of a project
    Room {
        #[command(subcommand)]
        command: RoomCommands,
    },

    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Delete every project (preferences are kept)
    Wipe {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project
    New {
        /// Project name
        name: String,
    },

    /// List projects, newest first
    List,

    /// Show a project's rooms and totals
    Show {
        /// Project id (or a unique prefix of it)
        id: String,
    },

    /// Delete a project and all its rooms
    Delete {
        /// Project id (or a unique prefix of it)
        id: String,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoomCommands {
    /// Add a room to a project
    Add {
        /// Project id (or a unique prefix of it)
        project: String,

        /// Room name
        #[arg(long, default_value = "")]
        name: String,

        #[command(flatten)]
        spec: SpecArgs,
    },

    /// Change a room; options not given keep their current value
    Edit {
        /// Project id (or a unique prefix of it)
        project: String,

        /// Room id (or a unique prefix of it)
        room: String,

        /// New room name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        patch: SpecPatchArgs,
    },

    /// Remove a room from a project
    Delete {
        /// Project id (or a unique prefix of it)
        project: String,

        /// Room id (or a unique prefix of it)
        room: String,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommands {
    /// Show the current preferences
    Show,

    /// Set the colour theme (light, dark, system)
    Theme { theme: Theme },

    /// Collapse, expand or toggle the sidebar
    Sidebar {
        #[arg(value_enum)]
        state: SidebarState,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarState {
    Collapsed,
    Expanded,
    Toggle,
}

/// Room geometry and tiling parameters
#[derive(Args, Debug, Clone)]
pub struct SpecArgs {
    /// Room length (m)
    #[arg(long)]
    pub length: f64,

    /// Room width (m)
    #[arg(long)]
    pub width: f64,

    /// Tile length (cm)
    #[arg(long)]
    pub tile_length: f64,

    /// Tile width (cm)
    #[arg(long)]
    pub tile_width: f64,

    /// Grout joint width (mm)
    #[arg(long, default_value_t = DEFAULT_JOINT_MM)]
    pub joint: f64,

    /// Waste margin (%)
    #[arg(long, default_value_t = DEFAULT_WASTE_MARGIN_PCT)]
    pub waste: f64,

    /// Mortar consumption (kg/m²)
    #[arg(long, default_value_t = DEFAULT_MORTAR_CONSUMPTION_KG_PER_M2)]
    pub mortar_consumption: f64,

    /// Mortar bag weight (kg)
    #[arg(long, default_value_t = DEFAULT_MORTAR_BAG_WEIGHT_KG)]
    pub bag_weight: f64,
}

impl SpecArgs {
    pub fn to_spec(&self) -> RoomSpec {
        RoomSpec::new(self.length, self.width, self.tile_length, self.tile_width, self.joint)
            .with_waste_margin(self.waste)
            .with_mortar(self.mortar_consumption, self.bag_weight)
    }
}

/// Optional overrides for an existing room
#[derive(Args, Debug, Clone, Default)]
pub struct SpecPatchArgs {
    /// Room length (m)
    #[arg(long)]
    pub length: Option<f64>,

    /// Room width (m)
    #[arg(long)]
    pub width: Option<f64>,

    /// Tile length (cm)
    #[arg(long)]
    pub tile_length: Option<f64>,

    /// Tile width (cm)
    #[arg(long)]
    pub tile_width: Option<f64>,

    /// Grout joint width (mm)
    #[arg(long)]
    pub joint: Option<f64>,

    /// Waste margin (%)
    #[arg(long)]
    pub waste: Option<f64>,

    /// Mortar consumption (kg/m²)
    #[arg(long)]
    pub mortar_consumption: Option<f64>,

    /// Mortar bag weight (kg)
    #[arg(long)]
    pub bag_weight: Option<f64>,
}

impl SpecPatchArgs {
    /// Build a new spec from `base` with the given overrides applied.
    pub fn apply(&self, base: &RoomSpec) -> RoomSpec {
        RoomSpec {
            length_m: self.length.unwrap_or(base.length_m),
            width_m: self.width.unwrap_or(base.width_m),
            tile_length_cm: self.tile_length.unwrap_or(base.tile_length_cm),
            tile_width_cm: self.tile_width.unwrap_or(base.tile_width_cm),
            grout_joint_mm: self.joint.unwrap_or(base.grout_joint_mm),
            waste_margin_pct: self.waste.unwrap_or(base.waste_margin_pct),
            mortar_consumption_kg_per_m2: self
                .mortar_consumption
                .unwrap_or(base.mortar_consumption_kg_per_m2),
            mortar_bag_weight_kg: self.bag_weight.unwrap_or(base.mortar_bag_weight_kg),
        }
    }
}
