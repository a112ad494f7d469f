//! # Hexworld Core
//!
//! Deterministic hex world model: addressing, terrain, movement and turn
//! sequencing.
//!
//! This crate contains **only** model logic:
//! - No rendering
//! - No IO
//! - No system randomness (generation is seeded)
//! - No floating-point in stored state (uses fixed-point)
//!
//! A view layer drives it from outside: it reads cells through
//! [`grid::HexGrid`], listens for [`unit::UnitMoved`] notifications and
//! supplies an [`scheduler::AnimationSignal`] on every poll.
//!
//! ## Crate Structure
//!
//! - [`topology`] - Grid dimensions, wraparound and address resolution
//! - [`grid`] - Cell storage and range queries
//! - [`terrain`] - Classification of elevation and moisture
//! - [`movement`] - Cost of entering a cell
//! - [`unit`] - Units and their single-step move
//! - [`scheduler`] - Turn sequencing and the animation wait
//! - [`world`] - Facade tying the above together
//! - [`map_generation`] - Pluggable seeded generators
//! - [`pathfinding`] - A* over the grid

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod grid;
pub mod hex;
pub mod map_generation;
pub mod math;
pub mod movement;
pub mod pathfinding;
pub mod scheduler;
pub mod terrain;
pub mod topology;
pub mod unit;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::WorldConfig;
    pub use crate::error::{Result, WorldError};
    pub use crate::grid::HexGrid;
    pub use crate::hex::{ElevationType, FeatureType, Hex, HexCoord, HexId, TerrainType};
    pub use crate::map_generation::{GeneratorKind, MapGenerator, RawTerrain, TerrainSample};
    pub use crate::math::Fixed;
    pub use crate::movement::{
        base_movement_cost, MovementCapability, MovementCost, MovementModifiers, MovementOverlay,
    };
    pub use crate::pathfinding::{find_path, NavContext, PathWorld};
    pub use crate::scheduler::{
        AnimationSignal, MoveListener, MovePoll, MoveRefusal, MoveReport, SchedulerPhase,
        TurnScheduler,
    };
    pub use crate::terrain::{classify, Classification, TerrainThresholds};
    pub use crate::topology::GridTopology;
    pub use crate::unit::{StepOutcome, Unit, UnitId, UnitMoved, UnitSpec};
    pub use crate::world::{TurnSummary, World};
}
