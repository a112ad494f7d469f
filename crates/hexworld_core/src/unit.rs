//! Units and their single-step movement primitive.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldError};
use crate::grid::HexGrid;
use crate::hex::{HexCoord, HexId};
use crate::math::{fixed_serde, Fixed};
use crate::movement::{base_movement_cost, MovementCapability, MovementCost, MovementOverlay};

/// Unique handle of a unit. Ids start at 1 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What to spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Display name.
    pub name: String,
    /// Movement points per turn.
    #[serde(with = "fixed_serde")]
    pub max_movement: Fixed,
    /// How the unit moves.
    #[serde(default)]
    pub capability: MovementCapability,
}

impl UnitSpec {
    /// Land unit with the given movement.
    #[must_use]
    pub fn land(name: impl Into<String>, max_movement: Fixed) -> Self {
        Self {
            name: name.into(),
            max_movement,
            capability: MovementCapability::Land,
        }
    }

    /// Override the capability.
    #[must_use]
    pub fn with_capability(mut self, capability: MovementCapability) -> Self {
        self.capability = capability;
        self
    }
}

/// Notification of one completed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitMoved {
    /// Unit that moved.
    pub unit: UnitId,
    /// Cell it left.
    pub from: HexId,
    /// Cell it entered.
    pub to: HexId,
    /// Coordinate of the entered cell.
    pub to_coord: HexCoord,
    /// Movement points spent.
    #[serde(with = "fixed_serde")]
    pub cost: Fixed,
}

/// Result of [`Unit::do_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOutcome {
    /// The step taken, if any.
    pub moved: Option<UnitMoved>,
    /// Whether another step can be taken this turn.
    pub more_steps: bool,
}

impl StepOutcome {
    const STOPPED: Self = Self {
        moved: None,
        more_steps: false,
    };
}

/// A unit on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    name: String,
    hex: HexId,
    #[serde(with = "fixed_serde")]
    movement_remaining: Fixed,
    #[serde(with = "fixed_serde")]
    max_movement: Fixed,
    capability: MovementCapability,
    path: VecDeque<HexId>,
}

impl Unit {
    /// Create a unit standing on `hex` with a full budget.
    #[must_use]
    pub fn new(id: UnitId, spec: UnitSpec, hex: HexId) -> Self {
        Self {
            id,
            name: spec.name,
            hex,
            movement_remaining: spec.max_movement,
            max_movement: spec.max_movement,
            capability: spec.capability,
            path: VecDeque::new(),
        }
    }

    /// Handle.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cell the unit stands on.
    #[must_use]
    pub const fn hex(&self) -> HexId {
        self.hex
    }

    /// Movement points left this turn.
    #[must_use]
    pub const fn movement_remaining(&self) -> Fixed {
        self.movement_remaining
    }

    /// Movement points per turn.
    #[must_use]
    pub const fn max_movement(&self) -> Fixed {
        self.max_movement
    }

    /// How the unit moves.
    #[must_use]
    pub const fn capability(&self) -> MovementCapability {
        self.capability
    }

    /// Remaining planned cells, next step first.
    #[must_use]
    pub const fn path(&self) -> &VecDeque<HexId> {
        &self.path
    }

    /// Restore the full movement budget.
    pub fn refresh_movement(&mut self) {
        self.movement_remaining = self.max_movement;
    }

    /// Replace the planned path. The unit's own cell must not be included.
    pub fn set_path(&mut self, path: impl IntoIterator<Item = HexId>) {
        self.path = path.into_iter().collect();
    }

    /// Forget the planned path.
    pub fn clear_path(&mut self) {
        self.path.clear();
    }

    /// Take the next step of the path, if the budget allows.
    ///
    /// A fresh unit may always take its first step, however expensive; a
    /// unit that has already moved this turn stops (keeping its path) when
    /// the next step costs more than it has left.
    ///
    /// # Errors
    ///
    /// The path is cleared and the step refused when the next cell is not
    /// adjacent, is held by another unit, or cannot be entered.
    pub fn do_move(
        &mut self,
        grid: &HexGrid,
        overlay: &MovementOverlay,
        occupant_of: impl Fn(HexId) -> Option<UnitId>,
    ) -> Result<StepOutcome> {
        let Some(&next) = self.path.front() else {
            return Ok(StepOutcome::STOPPED);
        };
        if self.movement_remaining <= Fixed::ZERO {
            return Ok(StepOutcome::STOPPED);
        }

        let cost = match self.check_step(grid, overlay, next, &occupant_of) {
            Ok(cost) => cost,
            Err(e) => {
                self.path.clear();
                return Err(e);
            }
        };

        if cost > self.movement_remaining && self.movement_remaining < self.max_movement {
            tracing::trace!(unit = %self.id, cost = %cost, left = %self.movement_remaining, "Step deferred to next turn");
            return Ok(StepOutcome::STOPPED);
        }

        let from = self.hex;
        self.path.pop_front();
        self.hex = next;
        self.movement_remaining = (self.movement_remaining - cost).max(Fixed::ZERO);

        let moved = UnitMoved {
            unit: self.id,
            from,
            to: next,
            to_coord: grid.coord(next)?,
            cost,
        };
        tracing::debug!(unit = %self.id, to = %moved.to_coord, left = %self.movement_remaining, "Unit stepped");

        Ok(StepOutcome {
            moved: Some(moved),
            more_steps: !self.path.is_empty() && self.movement_remaining > Fixed::ZERO,
        })
    }

    fn check_step(
        &self,
        grid: &HexGrid,
        overlay: &MovementOverlay,
        next: HexId,
        occupant_of: &impl Fn(HexId) -> Option<UnitId>,
    ) -> Result<Fixed> {
        let target = grid.hex(next)?;
        if !grid.are_adjacent(self.hex, next) {
            return Err(WorldError::NotAdjacent {
                from: grid.coord(self.hex)?,
                to: target.coord(),
            });
        }
        if let Some(occupant) = occupant_of(next).filter(|&o| o != self.id) {
            return Err(WorldError::HexOccupied {
                hex: target.coord(),
                occupant,
            });
        }
        match base_movement_cost(target, overlay.modifiers(self.hex, next), self.capability) {
            MovementCost::Cost(cost) => Ok(cost),
            MovementCost::Impassable => Err(WorldError::ImpassableDestination { hex: target.coord() }),
        }
    }
}
