//! Error types for the hex world.

use thiserror::Error;

use crate::hex::{HexCoord, HexId};
use crate::unit::UnitId;

/// Result type alias using [`WorldError`].
pub type Result<T> = std::result::Result<T, WorldError>;

/// Top-level error type for all world operations.
///
/// Lookup and movement errors are local and recoverable: batch operations
/// (range queries, end-of-turn resets, move sequences) isolate them per cell
/// or per unit. Configuration errors are returned from constructors and are
/// meant to be fatal for the world being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// Address outside the grid on a non-wrapping axis.
    #[error("Invalid address ({x}, {y}): outside the grid on a non-wrapping axis")]
    InvalidAddress {
        /// Requested column.
        x: i32,
        /// Requested row.
        y: i32,
    },

    /// Grid dimensions must both be positive.
    #[error("Invalid grid dimensions {columns}x{rows}")]
    InvalidDimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },

    /// Classification thresholds are not strictly descending.
    #[error("Unordered classification thresholds: {0}")]
    UnorderedThresholds(String),

    /// The destination cannot be entered with the unit's capability.
    #[error("Impassable destination {hex}")]
    ImpassableDestination {
        /// Cell that was refused.
        hex: HexCoord,
    },

    /// Unit handle not present in the registry.
    #[error("Unknown unit: {0}")]
    UnknownUnit(UnitId),

    /// Hex handle not present in the grid.
    #[error("Unknown hex: {0:?}")]
    UnknownHex(HexId),

    /// Another unit already stands on the cell.
    #[error("Hex {hex} is occupied by unit {occupant}")]
    HexOccupied {
        /// Contested cell.
        hex: HexCoord,
        /// Unit currently standing there.
        occupant: UnitId,
    },

    /// A path step does not lead to a neighbouring cell.
    #[error("Hex {to} is not adjacent to {from}")]
    NotAdjacent {
        /// Cell the unit stands on.
        from: HexCoord,
        /// Next cell of the path.
        to: HexCoord,
    },

    /// The pathfinder could not connect two cells.
    #[error("No path from {from} to {to}")]
    NoPath {
        /// Start cell.
        from: HexCoord,
        /// Goal cell.
        to: HexCoord,
    },

    /// Operation not allowed while a move sequence is running.
    #[error("A move sequence is already in progress")]
    MovesInProgress,

    /// Raw terrain does not cover the grid exactly.
    #[error("Raw terrain has {actual} samples, grid needs {expected}")]
    TerrainSizeMismatch {
        /// Cells in the grid.
        expected: usize,
        /// Samples supplied.
        actual: usize,
    },

    /// Config text failed to parse.
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),
}
