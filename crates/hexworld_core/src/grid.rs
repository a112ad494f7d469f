//! The hex grid: cell storage, addressing and range queries.
//!
//! The grid owns every [`Hex`] in a flat row-major arena. Other components
//! (units, overlays, the pathfinder) refer to cells by [`HexId`] only.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::config::WorldConfig;
use crate::error::{Result, WorldError};
use crate::hex::{Hex, HexCoord, HexId, HEX_DIRECTIONS};
use crate::map_generation::{generator_for, RawTerrain};
use crate::math::Fixed;
use crate::terrain::TerrainThresholds;
use crate::topology::GridTopology;

/// A rectangular table of classified cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexGrid {
    topology: GridTopology,
    thresholds: TerrainThresholds,
    hexes: Vec<Hex>,
}

impl HexGrid {
    /// Build a grid from raw terrain samples and classify every cell.
    ///
    /// # Errors
    ///
    /// - [`WorldError::UnorderedThresholds`] if the thresholds are invalid
    /// - [`WorldError::TerrainSizeMismatch`] if `raw` does not cover the grid
    pub fn new(topology: GridTopology, thresholds: TerrainThresholds, raw: RawTerrain) -> Result<Self> {
        thresholds.validate()?;

        let samples = raw.into_samples();
        if samples.len() != topology.cell_count() {
            return Err(WorldError::TerrainSizeMismatch {
                expected: topology.cell_count(),
                actual: samples.len(),
            });
        }

        let hexes = samples
            .into_iter()
            .enumerate()
            .map(|(index, sample)| {
                let (column, row) = topology.coords(index);
                Hex::new(
                    HexCoord::new(column as i32, row as i32),
                    sample.elevation,
                    sample.moisture,
                    &thresholds,
                )
            })
            .collect();

        Ok(Self {
            topology,
            thresholds,
            hexes,
        })
    }

    /// Generate a grid from a world configuration.
    pub fn generate(config: &WorldConfig) -> Result<Self> {
        config.validate()?;
        let topology = config.topology()?;
        let generator = generator_for(&config.generator);
        let raw = generator.generate(&topology, config.seed);

        let grid = Self::new(topology, config.thresholds, raw)?;
        tracing::info!(
            columns = topology.columns(),
            rows = topology.rows(),
            seed = config.seed,
            generator = generator.name(),
            land = grid.iter().filter(|(_, h)| h.is_lowland()).count(),
            "Generated map"
        );
        Ok(grid)
    }

    /// Dimensions and wrap flags.
    #[must_use]
    pub const fn topology(&self) -> &GridTopology {
        &self.topology
    }

    /// Active classification thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> &TerrainThresholds {
        &self.thresholds
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.topology.columns()
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.topology.rows()
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    /// Always `false`: [`GridTopology::new`] rejects zero dimensions, so
    /// every grid has at least one cell. Kept alongside [`HexGrid::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }

    /// Resolve a logical address to a cell handle.
    pub fn resolve(&self, x: i32, y: i32) -> Result<HexId> {
        let (column, row) = self.topology.resolve(x, y)?;
        Ok(self.id_at(column, row))
    }

    /// Cell at a logical address.
    pub fn hex_at(&self, x: i32, y: i32) -> Result<&Hex> {
        let id = self.resolve(x, y)?;
        self.hex(id)
    }

    /// Cell behind a handle.
    pub fn hex(&self, id: HexId) -> Result<&Hex> {
        self.hexes.get(id.index()).ok_or(WorldError::UnknownHex(id))
    }

    /// Handle of a cell's coordinate (wrap-aware).
    pub fn id_of(&self, coord: HexCoord) -> Result<HexId> {
        self.resolve(coord.q, coord.r)
    }

    /// Coordinate behind a handle.
    pub fn coord(&self, id: HexId) -> Result<HexCoord> {
        self.hex(id).map(Hex::coord)
    }

    /// Every cell within hex distance `range` of `center`, center included.
    ///
    /// See [`GridTopology::within_range`] for the enumeration order and the
    /// edge rules. Cells off a non-wrapping edge are skipped, never an error.
    pub fn hexes_within_range(&self, center: HexId, range: u32) -> Result<Vec<HexId>> {
        let c = self.coord(center)?;
        Ok(self
            .topology
            .within_range(c.q, c.r, range)
            .into_iter()
            .map(|(column, row)| self.id_at(column, row))
            .collect())
    }

    /// The up-to-six adjacent cells, E, NE, NW, W, SW, SE.
    ///
    /// Edge cells on a non-wrapping axis have fewer. On grids narrow enough
    /// that two directions wrap onto the same cell, it is listed once.
    pub fn neighbours(&self, id: HexId) -> Result<Vec<HexId>> {
        let c = self.coord(id)?;
        let mut result = Vec::with_capacity(HEX_DIRECTIONS.len());
        for (dq, dr) in HEX_DIRECTIONS {
            if let Ok(n) = self.resolve(c.q + dq, c.r + dr) {
                if n != id && !result.contains(&n) {
                    result.push(n);
                }
            }
        }
        Ok(result)
    }

    /// Whether two cells share an edge.
    #[must_use]
    pub fn are_adjacent(&self, a: HexId, b: HexId) -> bool {
        self.neighbours(a).is_ok_and(|n| n.contains(&b))
    }

    /// Hex distance between two cells, shortest way around.
    pub fn distance(&self, a: HexId, b: HexId) -> Result<u32> {
        Ok(self.topology.distance(self.coord(a)?, self.coord(b)?))
    }

    /// Change one cell's elevation and re-classify it.
    pub fn set_elevation(&mut self, id: HexId, elevation: Fixed) -> Result<()> {
        let thresholds = self.thresholds;
        let hex = self.hexes.get_mut(id.index()).ok_or(WorldError::UnknownHex(id))?;
        hex.set_elevation(elevation, &thresholds);
        self.debug_validate(id);
        Ok(())
    }

    /// Change one cell's moisture and re-classify it.
    pub fn set_moisture(&mut self, id: HexId, moisture: Fixed) -> Result<()> {
        let thresholds = self.thresholds;
        let hex = self.hexes.get_mut(id.index()).ok_or(WorldError::UnknownHex(id))?;
        hex.set_moisture(moisture, &thresholds);
        self.debug_validate(id);
        Ok(())
    }

    /// Replace the thresholds and re-classify the whole grid.
    ///
    /// Invalid thresholds are rejected and the grid is left unchanged.
    pub fn set_thresholds(&mut self, thresholds: TerrainThresholds) -> Result<()> {
        thresholds.validate()?;
        self.thresholds = thresholds;
        for hex in &mut self.hexes {
            hex.reclassify(&thresholds);
        }
        tracing::debug!(cells = self.hexes.len(), "Re-classified grid");
        Ok(())
    }

    /// Every cell with its handle, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (HexId, &Hex)> + '_ {
        self.hexes
            .iter()
            .enumerate()
            .map(|(index, hex)| (HexId(index as u32), hex))
    }

    /// Deterministic hash of topology, thresholds and every cell.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.topology.hash(&mut hasher);
        self.thresholds.hash(&mut hasher);
        self.hexes.len().hash(&mut hasher);
        for hex in &self.hexes {
            hex.hash(&mut hasher);
        }
        hasher.finish()
    }

    #[inline]
    fn id_at(&self, column: u32, row: u32) -> HexId {
        HexId(self.topology.index(column, row) as u32)
    }

    #[cfg(feature = "debug-validation")]
    fn debug_validate(&self, id: HexId) {
        let hex = &self.hexes[id.index()];
        let expected = crate::terrain::classify(hex.elevation(), hex.moisture(), &self.thresholds);
        assert_eq!(hex.classification(), expected, "stale classification at {}", hex.coord());
    }

    #[cfg(not(feature = "debug-validation"))]
    #[inline]
    fn debug_validate(&self, _id: HexId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{ElevationType, FeatureType, TerrainType};
    use crate::map_generation::TerrainSample;

    fn fixed(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn flat_grid(columns: u32, rows: u32, wrap_ew: bool, wrap_ns: bool) -> HexGrid {
        let topology = GridTopology::new(columns, rows, wrap_ew, wrap_ns).unwrap();
        let raw = RawTerrain::uniform(&topology, TerrainSample::new(fixed(0.2), fixed(0.1)));
        HexGrid::new(topology, TerrainThresholds::default(), raw).unwrap()
    }

    fn coords(grid: &HexGrid, ids: &[HexId]) -> Vec<(i32, i32)> {
        let mut c: Vec<_> = ids
            .iter()
            .map(|id| {
                let h = grid.hex(*id).unwrap();
                (h.q(), h.r())
            })
            .collect();
        c.sort_unstable();
        c
    }

    #[test]
    fn test_smallest_grid_is_not_empty() {
        let grid = flat_grid(1, 1, true, true);
        assert_eq!(grid.len(), 1);
        assert!(!grid.is_empty());
        assert!(GridTopology::new(0, 1, false, false).is_err());
    }

    #[test]
    fn test_range_beyond_grid_lists_every_cell_once() {
        for (ew, ns) in [(false, false), (true, false), (true, true)] {
            let grid = flat_grid(4, 4, ew, ns);
            let center = grid.resolve(1, 1).unwrap();
            for range in [u32::MAX, 1 << 30] {
                let ids = grid.hexes_within_range(center, range).unwrap();
                assert_eq!(ids.len(), 16);
                let mut unique = ids.clone();
                unique.sort_unstable();
                unique.dedup();
                assert_eq!(unique.len(), 16);
            }
        }
    }

    #[test]
    fn test_reference_addressing_example() {
        let grid = flat_grid(60, 30, true, false);
        let hex = grid.hex_at(-1, 5).unwrap();
        assert_eq!((hex.q(), hex.r()), (59, 5));
        assert_eq!(
            grid.resolve(5, -1),
            Err(WorldError::InvalidAddress { x: 5, y: -1 })
        );
    }

    #[test]
    fn test_cells_know_their_coordinates() {
        let grid = flat_grid(6, 4, false, false);
        for (id, hex) in grid.iter() {
            assert_eq!(grid.resolve(hex.q(), hex.r()).unwrap(), id);
        }
        assert_eq!(grid.len(), 24);
    }

    #[test]
    fn test_terrain_size_mismatch() {
        let topology = GridTopology::new(4, 4, false, false).unwrap();
        let raw = RawTerrain::from_samples(vec![TerrainSample::default(); 15]);
        assert_eq!(
            HexGrid::new(topology, TerrainThresholds::default(), raw),
            Err(WorldError::TerrainSizeMismatch {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn test_unknown_hex() {
        let grid = flat_grid(4, 4, false, false);
        assert_eq!(grid.hex(HexId(16)), Err(WorldError::UnknownHex(HexId(16))));
    }

    // Range 1 around (5, 5), drawn on the axial lattice:
    //
    //          (5,4) (6,4)
    //       (4,5) (5,5) (6,5)
    //          (4,6) (5,6)
    #[test]
    fn test_range_one_diagram() {
        let grid = flat_grid(12, 12, false, false);
        let center = grid.resolve(5, 5).unwrap();
        let cells = grid.hexes_within_range(center, 1).unwrap();
        assert_eq!(
            coords(&grid, &cells),
            vec![(4, 5), (4, 6), (5, 4), (5, 5), (5, 6), (6, 4), (6, 5)]
        );
    }

    // Range 2 around (5, 5): the 19 cells with max(|dq|, |dr|, |dq+dr|) <= 2.
    //
    //             (5,3) (6,3) (7,3)
    //          (4,4) (5,4) (6,4) (7,4)
    //       (3,5) (4,5) (5,5) (6,5) (7,5)
    //          (3,6) (4,6) (5,6) (6,6)
    //             (3,7) (4,7) (5,7)
    #[test]
    fn test_range_two_diagram() {
        let grid = flat_grid(12, 12, false, false);
        let center = grid.resolve(5, 5).unwrap();
        let cells = grid.hexes_within_range(center, 2).unwrap();
        assert_eq!(
            coords(&grid, &cells),
            vec![
                (3, 5),
                (3, 6),
                (3, 7),
                (4, 4),
                (4, 5),
                (4, 6),
                (4, 7),
                (5, 3),
                (5, 4),
                (5, 5),
                (5, 6),
                (5, 7),
                (6, 3),
                (6, 4),
                (6, 5),
                (6, 6),
                (7, 3),
                (7, 4),
                (7, 5),
            ]
        );
    }

    #[test]
    fn test_range_zero_is_exactly_center() {
        let grid = flat_grid(8, 8, true, true);
        let center = grid.resolve(0, 0).unwrap();
        assert_eq!(grid.hexes_within_range(center, 0).unwrap(), vec![center]);
    }

    #[test]
    fn test_range_skips_off_grid_cells() {
        let grid = flat_grid(10, 10, false, false);
        let corner = grid.resolve(0, 0).unwrap();
        let cells = grid.hexes_within_range(corner, 1).unwrap();
        // Center, E and SE survive at a plane corner
        assert_eq!(coords(&grid, &cells), vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_range_wraps_east_west() {
        let grid = flat_grid(10, 10, true, false);
        let center = grid.resolve(0, 5).unwrap();
        let cells = grid.hexes_within_range(center, 1).unwrap();
        assert_eq!(cells.len(), 7);
        assert!(coords(&grid, &cells).contains(&(9, 5)));
        assert!(coords(&grid, &cells).contains(&(9, 6)));
    }

    #[test]
    fn test_range_every_cell_within_distance() {
        let grid = flat_grid(20, 20, true, true);
        let center = grid.resolve(3, 17).unwrap();
        for range in 0..5 {
            for id in grid.hexes_within_range(center, range).unwrap() {
                assert!(grid.distance(center, id).unwrap() <= range);
            }
        }
    }

    #[test]
    fn test_neighbours() {
        let grid = flat_grid(10, 10, true, false);
        let interior = grid.resolve(5, 5).unwrap();
        assert_eq!(grid.neighbours(interior).unwrap().len(), 6);

        let top_edge = grid.resolve(5, 0).unwrap();
        assert_eq!(grid.neighbours(top_edge).unwrap().len(), 4);

        let seam = grid.resolve(0, 5).unwrap();
        let east_edge = grid.resolve(9, 5).unwrap();
        assert!(grid.are_adjacent(seam, east_edge));
    }

    #[test]
    fn test_edit_reclassifies_cell() {
        let mut grid = flat_grid(4, 4, false, false);
        let id = grid.resolve(1, 1).unwrap();
        grid.set_elevation(id, fixed(1.5)).unwrap();
        assert_eq!(grid.hex(id).unwrap().elevation_type(), ElevationType::Mountain);
        assert_eq!(grid.hex(id).unwrap().terrain_type(), TerrainType::Ocean);

        grid.set_elevation(id, fixed(0.3)).unwrap();
        grid.set_moisture(id, fixed(0.8)).unwrap();
        assert_eq!(grid.hex(id).unwrap().feature_type(), FeatureType::Rainforest);
    }

    #[test]
    fn test_set_thresholds_reclassifies_all() {
        let mut grid = flat_grid(4, 4, false, false);
        assert!(grid.iter().all(|(_, h)| h.elevation_type() == ElevationType::Flat));

        let raised = TerrainThresholds {
            height_flat: fixed(0.5),
            ..TerrainThresholds::default()
        };
        grid.set_thresholds(raised).unwrap();
        assert!(grid.iter().all(|(_, h)| h.elevation_type() == ElevationType::Water));
    }

    #[test]
    fn test_set_thresholds_rejects_bad_order() {
        let mut grid = flat_grid(4, 4, false, false);
        let before = grid.clone();
        let bad = TerrainThresholds {
            height_flat: fixed(2.0),
            ..TerrainThresholds::default()
        };
        assert!(grid.set_thresholds(bad).is_err());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_state_hash_tracks_edits() {
        let mut grid = flat_grid(4, 4, false, false);
        let h1 = grid.state_hash();
        assert_eq!(h1, flat_grid(4, 4, false, false).state_hash());
        grid.set_moisture(HexId(3), fixed(0.9)).unwrap();
        assert_ne!(h1, grid.state_hash());
    }
}
