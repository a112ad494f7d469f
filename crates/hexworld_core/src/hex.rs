//! A single grid cell and its axial coordinate.
//!
//! Cells are owned by [`HexGrid`](crate::grid::HexGrid) and addressed by
//! [`HexId`], a plain index into the grid's storage. Nothing outside the grid
//! holds a reference to a [`Hex`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};
use crate::terrain::{classify, Classification, TerrainThresholds};

/// Axial neighbour offsets `(dq, dr)`: E, NE, NW, W, SW, SE.
pub const HEX_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Handle to a cell: its index in the grid's row-major storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexId(pub u32);

impl HexId {
    /// Storage index of this cell.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Axial coordinate of a cell.
///
/// For a cell stored at `(column, row)`, `q` is the column and `r` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct HexCoord {
    /// Column axis.
    pub q: i32,
    /// Row axis.
    pub r: i32,
}

impl HexCoord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Third cube axis, `s = -q - r`.
    #[must_use]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Cube distance on an unbounded lattice.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        axial_distance(other.q - self.q, other.r - self.r)
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Cube distance of an axial offset.
#[must_use]
pub fn axial_distance(dq: i32, dr: i32) -> u32 {
    dq.unsigned_abs()
        .max(dr.unsigned_abs())
        .max((dq + dr).unsigned_abs())
}

/// Elevation band of a cell, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ElevationType {
    /// Below the flat threshold.
    #[default]
    Water,
    /// Low land.
    Flat,
    /// Raised land.
    Hill,
    /// Peaks.
    Mountain,
}

/// Base terrain of a land cell.
///
/// `Ocean` doubles as the "no land terrain" value for cells outside the land
/// band (water and mountains).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainType {
    /// Not land, or not classified as land.
    #[default]
    Ocean,
    /// Driest land.
    Desert,
    /// Dry land.
    Plains,
    /// Wet land, may carry a feature.
    Grasslands,
}

/// Vegetation overlay on top of the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FeatureType {
    /// Bare terrain.
    #[default]
    None,
    /// Temperate woods.
    Forest,
    /// Jungle.
    Rainforest,
}

/// A single cell of the world.
///
/// Elevation and moisture are the inputs; the three classifications are
/// derived from them and the grid's thresholds. Fields are private so the
/// derived values can only change together with their inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hex {
    coord: HexCoord,
    #[serde(with = "fixed_serde")]
    elevation: Fixed,
    #[serde(with = "fixed_serde")]
    moisture: Fixed,
    elevation_type: ElevationType,
    terrain_type: TerrainType,
    feature_type: FeatureType,
}

impl Hex {
    /// Create a cell and classify it.
    #[must_use]
    pub fn new(
        coord: HexCoord,
        elevation: Fixed,
        moisture: Fixed,
        thresholds: &TerrainThresholds,
    ) -> Self {
        let mut hex = Self {
            coord,
            elevation,
            moisture,
            elevation_type: ElevationType::Water,
            terrain_type: TerrainType::Ocean,
            feature_type: FeatureType::None,
        };
        hex.reclassify(thresholds);
        hex
    }

    /// Axial coordinate.
    #[must_use]
    pub const fn coord(&self) -> HexCoord {
        self.coord
    }

    /// Column axis.
    #[must_use]
    pub const fn q(&self) -> i32 {
        self.coord.q
    }

    /// Row axis.
    #[must_use]
    pub const fn r(&self) -> i32 {
        self.coord.r
    }

    /// Raw elevation.
    #[must_use]
    pub const fn elevation(&self) -> Fixed {
        self.elevation
    }

    /// Raw moisture.
    #[must_use]
    pub const fn moisture(&self) -> Fixed {
        self.moisture
    }

    /// Derived elevation band.
    #[must_use]
    pub const fn elevation_type(&self) -> ElevationType {
        self.elevation_type
    }

    /// Derived terrain.
    #[must_use]
    pub const fn terrain_type(&self) -> TerrainType {
        self.terrain_type
    }

    /// Derived feature.
    #[must_use]
    pub const fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    /// All three derived values.
    #[must_use]
    pub const fn classification(&self) -> Classification {
        Classification {
            elevation_type: self.elevation_type,
            terrain_type: self.terrain_type,
            feature_type: self.feature_type,
        }
    }

    /// Whether the cell is land that is not a mountain.
    #[must_use]
    pub fn is_lowland(&self) -> bool {
        matches!(self.elevation_type, ElevationType::Flat | ElevationType::Hill)
    }

    pub(crate) fn set_elevation(&mut self, elevation: Fixed, thresholds: &TerrainThresholds) {
        self.elevation = elevation;
        self.reclassify(thresholds);
    }

    pub(crate) fn set_moisture(&mut self, moisture: Fixed, thresholds: &TerrainThresholds) {
        self.moisture = moisture;
        self.reclassify(thresholds);
    }

    pub(crate) fn reclassify(&mut self, thresholds: &TerrainThresholds) {
        let c = classify(self.elevation, self.moisture, thresholds);
        self.elevation_type = c.elevation_type;
        self.terrain_type = c.terrain_type;
        self.feature_type = c.feature_type;
    }
}
