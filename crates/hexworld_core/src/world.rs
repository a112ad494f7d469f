//! The world: grid, units and turn sequencing behind one facade.
//!
//! Units live in an id-keyed arena and refer to their cell by [`HexId`];
//! the occupancy index maps the other way. At most one unit stands on a
//! cell at any time.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use crate::config::WorldConfig;
use crate::error::{Result, WorldError};
use crate::grid::HexGrid;
use crate::hex::HexId;
use crate::movement::{base_movement_cost, MovementCapability, MovementCost, MovementModifiers, MovementOverlay};
use crate::pathfinding::{find_path, NavContext};
use crate::scheduler::{AnimationSignal, MoveListener, MovePoll, MoveReport, SchedulerPhase, TurnScheduler};
use crate::unit::{Unit, UnitId, UnitSpec};

/// Outcome of [`World::end_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    /// Turn number that just started.
    pub turn: u64,
    /// Units whose budget was restored.
    pub refreshed: usize,
    /// Units that could not be reset.
    pub failures: Vec<(UnitId, WorldError)>,
}

/// Grid, overlay, units and scheduler.
#[derive(Debug)]
pub struct World {
    grid: HexGrid,
    overlay: MovementOverlay,
    units: BTreeMap<UnitId, Unit>,
    occupancy: HashMap<HexId, UnitId>,
    scheduler: TurnScheduler,
    turn: u64,
    next_id: u64,
}

impl World {
    /// Empty world on an existing grid.
    #[must_use]
    pub fn new(grid: HexGrid) -> Self {
        Self {
            grid,
            overlay: MovementOverlay::new(),
            units: BTreeMap::new(),
            occupancy: HashMap::new(),
            scheduler: TurnScheduler::new(),
            turn: 1,
            next_id: 1,
        }
    }

    /// Generate the grid described by `config`.
    pub fn from_config(config: &WorldConfig) -> Result<Self> {
        HexGrid::generate(config).map(Self::new)
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &HexGrid {
        &self.grid
    }

    /// Mutable grid access for terrain edits.
    ///
    /// # Errors
    ///
    /// [`WorldError::MovesInProgress`] while units are moving.
    pub fn grid_mut(&mut self) -> Result<&mut HexGrid> {
        if self.scheduler.is_active() {
            return Err(WorldError::MovesInProgress);
        }
        Ok(&mut self.grid)
    }

    /// Roads, rivers and zones of control.
    #[must_use]
    pub const fn overlay(&self) -> &MovementOverlay {
        &self.overlay
    }

    /// Mutable overlay.
    pub fn overlay_mut(&mut self) -> &mut MovementOverlay {
        &mut self.overlay
    }

    /// Current turn, starting at 1.
    #[must_use]
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Unit behind a handle.
    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.units.get(&id).ok_or(WorldError::UnknownUnit(id))
    }

    /// Every unit, ascending id.
    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.values()
    }

    /// Number of units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Unit standing on a cell.
    #[must_use]
    pub fn occupant(&self, hex: HexId) -> Option<UnitId> {
        self.occupancy.get(&hex).copied()
    }

    /// Place a new unit at logical address `(q, r)` and register it.
    ///
    /// # Errors
    ///
    /// - [`WorldError::InvalidAddress`] if the address does not resolve
    /// - [`WorldError::HexOccupied`] if another unit stands there
    /// - [`WorldError::ImpassableDestination`] if the unit could never
    ///   stand on that terrain
    pub fn spawn_unit(&mut self, spec: UnitSpec, q: i32, r: i32) -> Result<UnitId> {
        let hex = self.grid.resolve(q, r)?;
        let cell = self.grid.hex(hex)?;
        if let Some(occupant) = self.occupant(hex) {
            return Err(WorldError::HexOccupied {
                hex: cell.coord(),
                occupant,
            });
        }
        if !base_movement_cost(cell, MovementModifiers::default(), spec.capability).is_passable() {
            return Err(WorldError::ImpassableDestination { hex: cell.coord() });
        }

        let id = UnitId(self.next_id);
        self.next_id += 1;
        tracing::info!(unit = %id, name = %spec.name, at = %cell.coord(), "Spawned unit");

        self.units.insert(id, Unit::new(id, spec, hex));
        self.occupancy.insert(hex, id);
        self.scheduler.register(id);
        Ok(id)
    }

    /// Remove a unit from the world.
    ///
    /// Safe during a move sequence: the unit's pending turn is reported as
    /// an [`WorldError::UnknownUnit`] refusal.
    pub fn despawn_unit(&mut self, id: UnitId) -> Result<Unit> {
        let unit = self.units.remove(&id).ok_or(WorldError::UnknownUnit(id))?;
        self.occupancy.remove(&unit.hex());
        self.scheduler.unregister(id);
        tracing::info!(unit = %id, "Despawned unit");
        Ok(unit)
    }

    /// Give a unit an explicit path (its own cell excluded).
    pub fn set_unit_path(&mut self, id: UnitId, path: Vec<HexId>) -> Result<()> {
        for &hex in &path {
            self.grid.hex(hex)?;
        }
        let unit = self.units.get_mut(&id).ok_or(WorldError::UnknownUnit(id))?;
        unit.set_path(path);
        Ok(())
    }

    /// Plan the cheapest path to `(q, r)` and assign it to the unit.
    ///
    /// Returns the planned cells.
    pub fn plan_path(&mut self, id: UnitId, q: i32, r: i32) -> Result<Vec<HexId>> {
        let goal = self.grid.resolve(q, r)?;
        let unit = self.units.get(&id).ok_or(WorldError::UnknownUnit(id))?;
        let nav = NavContext::new(&self.grid, &self.overlay);
        let path = find_path(&nav, unit.hex(), goal, unit.capability())?;
        tracing::debug!(unit = %id, steps = path.len(), "Planned path");
        self.set_unit_path(id, path.clone())?;
        Ok(path)
    }

    /// Cost of stepping from `from` into `to` with the overlay applied.
    pub fn step_cost(&self, from: HexId, to: HexId, capability: MovementCapability) -> Result<MovementCost> {
        self.grid.hex(from)?;
        let target = self.grid.hex(to)?;
        Ok(base_movement_cost(target, self.overlay.modifiers(from, to), capability))
    }

    /// Restore every unit's movement budget and advance the turn counter.
    ///
    /// # Errors
    ///
    /// [`WorldError::MovesInProgress`] while units are moving.
    pub fn end_turn(&mut self) -> Result<TurnSummary> {
        let units = &mut self.units;
        let failures = self.scheduler.end_turn(|id| {
            let unit = units.get_mut(&id).ok_or(WorldError::UnknownUnit(id))?;
            unit.refresh_movement();
            Ok(())
        })?;

        self.turn += 1;
        let refreshed = self.scheduler.len() - failures.len();
        tracing::info!(turn = self.turn, refreshed, failed = failures.len(), "Turn ended");
        Ok(TurnSummary {
            turn: self.turn,
            refreshed,
            failures,
        })
    }

    /// Start moving every unit in ascending id order.
    pub fn begin_all_unit_moves(&mut self) -> Result<()> {
        self.scheduler.begin_all()
    }

    /// Start moving one unit.
    pub fn begin_unit_moves(&mut self, id: UnitId) -> Result<()> {
        self.scheduler.begin_unit(id)
    }

    /// Advance the running move sequence; see [`TurnScheduler::poll`].
    pub fn poll_moves<S: AnimationSignal + ?Sized>(&mut self, signal: &S) -> MovePoll {
        let grid = &self.grid;
        let overlay = &self.overlay;
        let units = &mut self.units;
        let occupancy = &mut self.occupancy;

        self.scheduler.poll(signal, |id| {
            let unit = units.get_mut(&id).ok_or(WorldError::UnknownUnit(id))?;
            let outcome = unit.do_move(grid, overlay, |hex| occupancy.get(&hex).copied())?;
            if let Some(moved) = outcome.moved {
                occupancy.remove(&moved.from);
                occupancy.insert(moved.to, id);
            }
            Ok(outcome)
        })
    }

    /// Abort the running move sequence.
    pub fn cancel_moves(&mut self) -> Option<MoveReport> {
        self.scheduler.cancel()
    }

    /// Whether a move sequence is running.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Scheduler state.
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        self.scheduler.phase()
    }

    /// Subscribe to step notifications.
    pub fn add_listener(&mut self, listener: Box<dyn MoveListener>) {
        self.scheduler.add_listener(listener);
    }

    /// Deterministic hash of the grid, overlay, units and turn.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.grid.state_hash().hash(&mut hasher);
        self.overlay.hash(&mut hasher);
        self.turn.hash(&mut hasher);
        for unit in self.units.values() {
            unit.hash(&mut hasher);
        }
        hasher.finish()
    }
}
