//! Hex pathfinding using the A* algorithm.
//!
//! The search only sees the grid through [`PathWorld`], so any collaborator
//! that can resolve addresses and cost neighbouring steps can reuse it.
//! Costs are fixed-point and ties are broken by cell index, so the same
//! query always returns the same path.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{Result, WorldError};
use crate::grid::HexGrid;
use crate::hex::{HexCoord, HexId};
use crate::math::Fixed;
use crate::movement::{base_movement_cost, MovementCapability, MovementOverlay, MIN_STEP_COST};

/// What a pathfinder needs to know about the world.
pub trait PathWorld {
    /// Resolve a logical address to a cell handle.
    fn resolve(&self, q: i32, r: i32) -> Result<HexId>;

    /// Coordinate of a cell.
    fn coord(&self, hex: HexId) -> Result<HexCoord>;

    /// Neighbours a mover can enter from `hex`, with the cost of each step.
    fn passable_neighbours(&self, hex: HexId, capability: MovementCapability) -> Vec<(HexId, Fixed)>;

    /// Hex distance, shortest way around.
    fn distance(&self, a: HexId, b: HexId) -> Result<u32>;

    /// Whether columns wrap around.
    fn wraps_east_west(&self) -> bool;

    /// Whether rows wrap around.
    fn wraps_north_south(&self) -> bool;
}

/// A grid together with its movement overlay.
#[derive(Debug, Clone, Copy)]
pub struct NavContext<'a> {
    grid: &'a HexGrid,
    overlay: &'a MovementOverlay,
}

impl<'a> NavContext<'a> {
    /// Bundle a grid and an overlay.
    #[must_use]
    pub const fn new(grid: &'a HexGrid, overlay: &'a MovementOverlay) -> Self {
        Self { grid, overlay }
    }
}

impl PathWorld for NavContext<'_> {
    fn resolve(&self, q: i32, r: i32) -> Result<HexId> {
        self.grid.resolve(q, r)
    }

    fn coord(&self, hex: HexId) -> Result<HexCoord> {
        self.grid.coord(hex)
    }

    fn passable_neighbours(&self, hex: HexId, capability: MovementCapability) -> Vec<(HexId, Fixed)> {
        let Ok(neighbours) = self.grid.neighbours(hex) else {
            return Vec::new();
        };
        neighbours
            .into_iter()
            .filter_map(|n| {
                let target = self.grid.hex(n).ok()?;
                base_movement_cost(target, self.overlay.modifiers(hex, n), capability)
                    .value()
                    .map(|cost| (n, cost))
            })
            .collect()
    }

    fn distance(&self, a: HexId, b: HexId) -> Result<u32> {
        self.grid.distance(a, b)
    }

    fn wraps_east_west(&self) -> bool {
        self.grid.topology().wraps_east_west()
    }

    fn wraps_north_south(&self) -> bool {
        self.grid.topology().wraps_north_south()
    }
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    hex: HexId,
    g_score: Fixed,
    f_score: Fixed,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; lower f_score, then lower index, wins.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.hex.cmp(&self.hex),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Admissible estimate: every step costs at least [`MIN_STEP_COST`].
fn heuristic<W: PathWorld + ?Sized>(world: &W, from: HexId, goal: HexId) -> Fixed {
    world
        .distance(from, goal)
        .map_or(Fixed::ZERO, |d| Fixed::from_num(d) * MIN_STEP_COST)
}

/// Cheapest path from `start` to `goal` for a mover with `capability`.
///
/// The returned cells exclude `start` and end with `goal`, ready for
/// [`Unit::set_path`](crate::unit::Unit::set_path). A path to the start cell
/// is empty.
///
/// # Errors
///
/// - [`WorldError::UnknownHex`] if either handle is not on the grid
/// - [`WorldError::NoPath`] if the goal cannot be reached
pub fn find_path<W: PathWorld + ?Sized>(
    world: &W,
    start: HexId,
    goal: HexId,
    capability: MovementCapability,
) -> Result<Vec<HexId>> {
    let from = world.coord(start)?;
    let to = world.coord(goal)?;
    if start == goal {
        return Ok(Vec::new());
    }

    let (path, expanded) = search(world, start, goal, capability);
    match path {
        Some(path) => {
            tracing::trace!(%from, %to, steps = path.len(), expanded, "Path found");
            Ok(path)
        }
        None => {
            tracing::trace!(%from, %to, expanded, "No path");
            Err(WorldError::NoPath { from, to })
        }
    }
}

/// A* over `world`, returning the path (if any) and how many cells were
/// expanded. Each cell is expanded at most once.
fn search<W: PathWorld + ?Sized>(
    world: &W,
    start: HexId,
    goal: HexId,
    capability: MovementCapability,
) -> (Option<Vec<HexId>>, usize) {
    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<HexId, HexId> = HashMap::new();
    let mut g_score: HashMap<HexId, Fixed> = HashMap::new();
    let mut expanded = 0;

    g_score.insert(start, Fixed::ZERO);
    open_set.push(AStarNode {
        hex: start,
        g_score: Fixed::ZERO,
        f_score: heuristic(world, start, goal),
    });

    while let Some(current) = open_set.pop() {
        let best_g = g_score.get(&current.hex).copied().unwrap_or(Fixed::MAX);
        if current.g_score > best_g {
            // Superseded by a cheaper entry that was already expanded
            continue;
        }
        if current.hex == goal {
            return (Some(reconstruct_path(&came_from, start, goal)), expanded);
        }
        expanded += 1;

        for (neighbour, step_cost) in world.passable_neighbours(current.hex, capability) {
            let tentative_g = current.g_score + step_cost;
            let neighbour_g = g_score.get(&neighbour).copied().unwrap_or(Fixed::MAX);

            if tentative_g < neighbour_g {
                came_from.insert(neighbour, current.hex);
                g_score.insert(neighbour, tentative_g);
                open_set.push(AStarNode {
                    hex: neighbour,
                    g_score: tentative_g,
                    f_score: tentative_g + heuristic(world, neighbour, goal),
                });
            }
        }
    }

    (None, expanded)
}

/// Walk `came_from` back from the goal, dropping the start cell.
fn reconstruct_path(came_from: &HashMap<HexId, HexId>, start: HexId, goal: HexId) -> Vec<HexId> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Total cost of following `path` from `start`, or `None` if a step is
/// impassable or not adjacent.
#[must_use]
pub fn path_cost<W: PathWorld + ?Sized>(
    world: &W,
    start: HexId,
    path: &[HexId],
    capability: MovementCapability,
) -> Option<Fixed> {
    let mut total = Fixed::ZERO;
    let mut at = start;
    for &next in path {
        let (_, cost) = world
            .passable_neighbours(at, capability)
            .into_iter()
            .find(|(n, _)| *n == next)?;
        total += cost;
        at = next;
    }
    Some(total)
}
