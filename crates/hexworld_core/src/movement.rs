//! Movement cost of entering a cell.
//!
//! [`base_movement_cost`] is a total function of the destination cell, the
//! modifier flags for the step and the mover's capability. Roads, rivers and
//! zones of control belong to systems outside the core; they reach it only
//! as [`MovementModifiers`], usually derived from a [`MovementOverlay`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::hex::{ElevationType, FeatureType, Hex, HexId};
use crate::math::{Fixed, HALF};

/// Extra cost of entering a cell under an enemy zone of control.
pub const ZONE_OF_CONTROL_PENALTY: Fixed = Fixed::const_from_int(2);

/// Extra cost of crossing a river without a road.
pub const RIVER_CROSSING_PENALTY: Fixed = Fixed::ONE;

/// Cost of a step along a road.
pub const ROAD_COST: Fixed = HALF;

/// Cheapest possible step, used to keep path heuristics admissible.
pub const MIN_STEP_COST: Fixed = ROAD_COST;

/// How a unit moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementCapability {
    /// Walks on flat land and hills.
    #[default]
    Land,
    /// Sails on water only.
    Naval,
    /// Flies over anything.
    Flying,
}

/// Per-step flags supplied by systems outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MovementModifiers {
    /// Both ends of the step are on a road.
    pub has_road: bool,
    /// The step crosses a river.
    pub river_crossing: bool,
    /// The destination is inside an enemy zone of control.
    pub zone_of_control: bool,
}

/// Result of costing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementCost {
    /// Movement points consumed by entering the cell.
    Cost(Fixed),
    /// The cell cannot be entered.
    Impassable,
}

impl MovementCost {
    /// The numeric cost, or `None` when impassable.
    #[must_use]
    pub const fn value(self) -> Option<Fixed> {
        match self {
            Self::Cost(c) => Some(c),
            Self::Impassable => None,
        }
    }

    /// Whether the cell can be entered.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Cost(_))
    }
}

/// Movement points needed to enter `hex`.
///
/// Land units cannot enter water or mountains; naval units cannot leave
/// water; flying units pay a flat 1. For land units a road replaces the
/// terrain cost and makes river crossings free. A zone of control adds
/// [`ZONE_OF_CONTROL_PENALTY`] for every capability.
#[must_use]
pub fn base_movement_cost(
    hex: &Hex,
    modifiers: MovementModifiers,
    capability: MovementCapability,
) -> MovementCost {
    let base = match capability {
        MovementCapability::Land => land_cost(hex, modifiers),
        MovementCapability::Naval => match hex.elevation_type() {
            ElevationType::Water => Some(Fixed::ONE),
            _ => None,
        },
        MovementCapability::Flying => Some(Fixed::ONE),
    };

    match base {
        Some(cost) if modifiers.zone_of_control => MovementCost::Cost(cost + ZONE_OF_CONTROL_PENALTY),
        Some(cost) => MovementCost::Cost(cost),
        None => MovementCost::Impassable,
    }
}

fn land_cost(hex: &Hex, modifiers: MovementModifiers) -> Option<Fixed> {
    let terrain = match hex.elevation_type() {
        ElevationType::Water | ElevationType::Mountain => return None,
        ElevationType::Flat => Fixed::ONE,
        ElevationType::Hill => Fixed::const_from_int(2),
    };

    if modifiers.has_road {
        return Some(ROAD_COST);
    }

    let feature = match hex.feature_type() {
        FeatureType::None => Fixed::ZERO,
        FeatureType::Forest | FeatureType::Rainforest => Fixed::ONE,
    };
    let river = if modifiers.river_crossing {
        RIVER_CROSSING_PENALTY
    } else {
        Fixed::ZERO
    };

    Some(terrain + feature + river)
}

/// Roads, rivers and zones of control laid over the grid.
///
/// Populated by outside systems; the core only reads it to derive the
/// [`MovementModifiers`] of a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementOverlay {
    roads: BTreeSet<HexId>,
    rivers: BTreeSet<(HexId, HexId)>,
    zones_of_control: BTreeSet<HexId>,
}

impl MovementOverlay {
    /// Empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a road on a cell.
    pub fn add_road(&mut self, hex: HexId) {
        self.roads.insert(hex);
    }

    /// Put a river on the edge between two cells.
    pub fn add_river(&mut self, a: HexId, b: HexId) {
        self.rivers.insert(edge(a, b));
    }

    /// Mark a cell as inside an enemy zone of control.
    pub fn add_zone_of_control(&mut self, hex: HexId) {
        self.zones_of_control.insert(hex);
    }

    /// Clear all zones of control (they change every turn).
    pub fn clear_zones_of_control(&mut self) {
        self.zones_of_control.clear();
    }

    /// Whether a cell carries a road.
    #[must_use]
    pub fn has_road(&self, hex: HexId) -> bool {
        self.roads.contains(&hex)
    }

    /// Modifiers for a step `from -> to`.
    #[must_use]
    pub fn modifiers(&self, from: HexId, to: HexId) -> MovementModifiers {
        MovementModifiers {
            has_road: self.roads.contains(&from) && self.roads.contains(&to),
            river_crossing: self.rivers.contains(&edge(from, to)),
            zone_of_control: self.zones_of_control.contains(&to),
        }
    }
}

fn edge(a: HexId, b: HexId) -> (HexId, HexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
