//! Test fixtures and helpers.
//!
//! Pre-built grids, worlds and a fake view layer for consistent testing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hexworld_core::prelude::*;
use serde::Deserialize;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: stored world state is always fixed-point.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// A grid of flat grassland (elevation 0.2, moisture 0.1).
///
/// # Panics
///
/// Panics if either dimension is zero.
#[must_use]
pub fn flat_grid(columns: u32, rows: u32, wrap_east_west: bool, wrap_north_south: bool) -> HexGrid {
    let topology = GridTopology::new(columns, rows, wrap_east_west, wrap_north_south)
        .expect("fixture dimensions must be positive");
    let raw = RawTerrain::uniform(&topology, TerrainSample::new(fixed_f(0.2), fixed_f(0.1)));
    HexGrid::new(topology, TerrainThresholds::default(), raw).expect("default thresholds are valid")
}

/// Sink a cell to water.
///
/// # Panics
///
/// Panics if `(q, r)` does not resolve.
pub fn flood(grid: &mut HexGrid, q: i32, r: i32) {
    let id = grid.resolve(q, r).expect("fixture address must resolve");
    grid.set_elevation(id, fixed_f(-0.5)).expect("resolved id is on the grid");
}

/// A world on a flat cylinder (east-west wrap only).
#[must_use]
pub fn flat_world(columns: u32, rows: u32) -> World {
    World::new(flat_grid(columns, rows, true, false))
}

/// A land unit with `movement` points per turn.
#[must_use]
pub fn scout(movement: i32) -> UnitSpec {
    UnitSpec::land("Scout", fixed(movement))
}

/// One unit to place in a fixture world.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitPlacement {
    /// What to spawn.
    pub spec: UnitSpec,
    /// Logical column.
    pub q: i32,
    /// Logical row.
    pub r: i32,
}

/// Parse a RON list of [`UnitPlacement`]s.
///
/// # Panics
///
/// Panics on malformed RON.
#[must_use]
pub fn placements_from_ron(ron_text: &str) -> Vec<UnitPlacement> {
    ron::from_str(ron_text).expect("fixture RON must parse")
}

/// Spawn every placement, returning the ids in order.
///
/// # Panics
///
/// Panics if a placement is refused.
pub fn spawn_all(world: &mut World, placements: &[UnitPlacement]) -> Vec<UnitId> {
    placements
        .iter()
        .map(|p| {
            world
                .spawn_unit(p.spec.clone(), p.q, p.r)
                .expect("fixture placement must be valid")
        })
        .collect()
}

/// A fake view layer.
///
/// Every step it is told about starts an animation lasting `frames`
/// frames; [`RecordingView::advance_frame`] plays one frame. Clones share
/// state, so one clone can be registered as a listener while another is
/// passed as the signal.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    steps: Rc<RefCell<Vec<UnitMoved>>>,
    frames_left: Rc<Cell<u32>>,
    frames_per_step: u32,
}

impl RecordingView {
    /// A view whose animations last `frames_per_step` frames.
    #[must_use]
    pub fn new(frames_per_step: u32) -> Self {
        Self {
            frames_per_step,
            ..Self::default()
        }
    }

    /// Play one frame of the current animation.
    pub fn advance_frame(&self) {
        self.frames_left.set(self.frames_left.get().saturating_sub(1));
    }

    /// Every step seen so far.
    #[must_use]
    pub fn steps(&self) -> Vec<UnitMoved> {
        self.steps.borrow().clone()
    }

    /// Unit of each step seen so far, in order.
    #[must_use]
    pub fn step_order(&self) -> Vec<UnitId> {
        self.steps.borrow().iter().map(|s| s.unit).collect()
    }
}

impl MoveListener for RecordingView {
    fn on_unit_moved(&mut self, event: &UnitMoved) {
        self.steps.borrow_mut().push(*event);
        self.frames_left.set(self.frames_per_step);
    }
}

impl AnimationSignal for RecordingView {
    fn is_playing(&self) -> bool {
        self.frames_left.get() > 0
    }
}

/// Attach a fresh [`RecordingView`] to `world` and return a handle to it.
pub fn attach_view(world: &mut World, frames_per_step: u32) -> RecordingView {
    let view = RecordingView::new(frames_per_step);
    world.add_listener(Box::new(view.clone()));
    view
}

/// Poll `world` once per frame until its move sequence completes.
///
/// Returns `None` if nothing is running or if the sequence is still pending
/// after `max_frames` frames.
pub fn drive_moves(world: &mut World, view: &RecordingView, max_frames: u32) -> Option<MoveReport> {
    for frame in 0..max_frames {
        match world.poll_moves(view) {
            MovePoll::Complete(report) => return Some(report),
            MovePoll::Idle => return None,
            MovePoll::Pending(unit) => {
                tracing::trace!(frame, unit = %unit, "Waiting on animation");
                view.advance_frame();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_grid_is_land() {
        let grid = flat_grid(5, 4, false, false);
        assert_eq!(grid.len(), 20);
        assert!(grid.iter().all(|(_, h)| h.is_lowland()));
    }

    #[test]
    fn test_flood() {
        let mut grid = flat_grid(5, 4, false, false);
        flood(&mut grid, 2, 2);
        assert_eq!(
            grid.hex_at(2, 2).unwrap().elevation_type(),
            ElevationType::Water
        );
    }

    #[test]
    fn test_placements_from_ron() {
        let placements = placements_from_ron(
            r#"[
                (spec: (name: "Scout", max_movement: 8589934592), q: 1, r: 2),
                (spec: (name: "Boat", max_movement: 4294967296, capability: Naval), q: 3, r: 0),
            ]"#,
        );
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].spec.max_movement, fixed(2));
        assert_eq!(placements[1].spec.capability, MovementCapability::Naval);
    }

    #[test]
    fn test_recording_view_animation() {
        let mut view = RecordingView::new(2);
        assert!(!view.is_playing());
        view.on_unit_moved(&UnitMoved {
            unit: UnitId(1),
            from: HexId(0),
            to: HexId(1),
            to_coord: HexCoord::new(1, 0),
            cost: fixed(1),
        });
        assert!(view.is_playing());
        view.advance_frame();
        assert!(view.is_playing());
        view.advance_frame();
        assert!(!view.is_playing());
        assert_eq!(view.step_order(), vec![UnitId(1)]);
    }
}
