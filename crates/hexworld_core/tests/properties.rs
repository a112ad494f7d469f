//! Property tests for addressing, classification and range queries.

use hexworld_core::prelude::*;
use hexworld_core::terrain::classify_elevation;
use hexworld_test_utils::determinism::{generate_in_parallel_scoped, verify_generation_determinism};
use hexworld_test_utils::determinism::strategies::{
    arb_address, arb_sample, arb_terrain_value, arb_thresholds, arb_topology, arb_world_config,
};
use hexworld_test_utils::fixtures::flat_grid;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_resolve_lands_in_bounds(t in arb_topology(), (x, y) in arb_address()) {
        match t.resolve(x, y) {
            Ok((column, row)) => {
                prop_assert!(column < t.columns());
                prop_assert!(row < t.rows());
                // Resolving an in-range address is the identity
                prop_assert_eq!(t.resolve(column as i32, row as i32), Ok((column, row)));
            }
            Err(e) => {
                prop_assert_eq!(e, WorldError::InvalidAddress { x, y });
                let off_columns = !t.wraps_east_west() && !(0..t.columns() as i32).contains(&x);
                let off_rows = !t.wraps_north_south() && !(0..t.rows() as i32).contains(&y);
                prop_assert!(off_columns || off_rows);
            }
        }
    }

    #[test]
    fn prop_resolve_is_periodic(t in arb_topology(), (x, y) in arb_address()) {
        if t.wraps_east_west() {
            let shifted = x + t.columns() as i32;
            prop_assert_eq!(t.resolve(x, y).ok(), t.resolve(shifted, y).ok());
        }
        if t.wraps_north_south() {
            let shifted = y - t.rows() as i32;
            prop_assert_eq!(t.resolve(x, y).ok(), t.resolve(x, shifted).ok());
        }
    }

    #[test]
    fn prop_classification_is_pure(
        e in arb_terrain_value(),
        m in arb_terrain_value(),
        t in arb_thresholds(),
    ) {
        prop_assert_eq!(classify(e, m, &t), classify(e, m, &t));
    }

    #[test]
    fn prop_high_elevation_is_mountain(
        m in arb_terrain_value(),
        t in arb_thresholds(),
        extra in 0i32..1000,
    ) {
        let e = t.height_mountain + Fixed::from_num(extra) / Fixed::from_num(100);
        let c = classify(e, m, &t);
        prop_assert_eq!(c.elevation_type, ElevationType::Mountain);
        prop_assert_eq!(c.feature_type, FeatureType::None);
    }

    #[test]
    fn prop_wet_lowland_is_rainforest(t in arb_thresholds(), extra in 0i32..1000) {
        let m = t.moisture_jungle + Fixed::from_num(extra) / Fixed::from_num(100);
        for e in [t.height_flat, t.height_hill] {
            let c = classify(e, m, &t);
            prop_assert_eq!(c.feature_type, FeatureType::Rainforest);
        }
    }

    #[test]
    fn prop_elevation_type_is_monotonic(
        a in arb_terrain_value(),
        b in arb_terrain_value(),
        t in arb_thresholds(),
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify_elevation(low, &t) <= classify_elevation(high, &t));
    }

    #[test]
    fn prop_grid_cells_match_classify(
        samples in proptest::collection::vec(arb_sample(), 12),
        t in arb_thresholds(),
    ) {
        let topology = GridTopology::new(4, 3, true, false).unwrap();
        let grid = HexGrid::new(topology, t, RawTerrain::from_samples(samples.clone())).unwrap();
        for ((_, hex), sample) in grid.iter().zip(&samples) {
            let c = classify(sample.elevation, sample.moisture, &t);
            prop_assert_eq!(hex.elevation_type(), c.elevation_type);
            prop_assert_eq!(hex.terrain_type(), c.terrain_type);
            prop_assert_eq!(hex.feature_type(), c.feature_type);
        }
    }

    #[test]
    fn prop_range_cells_are_within_distance(
        columns in 1u32..30,
        rows in 1u32..30,
        wrap_ew in any::<bool>(),
        wrap_ns in any::<bool>(),
        range in 0u32..6,
        seed in any::<u32>(),
    ) {
        let grid = flat_grid(columns, rows, wrap_ew, wrap_ns);
        let center = HexId(seed % (columns * rows));
        let cells = grid.hexes_within_range(center, range).unwrap();

        prop_assert!(cells.contains(&center));
        let mut unique = cells.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), cells.len());
        for id in &cells {
            prop_assert!(grid.distance(center, *id).unwrap() <= range);
        }
        prop_assert!(cells.len() <= 1 + 3 * range as usize * (range as usize + 1));
    }

    #[test]
    fn prop_interior_range_is_full_hexagon(range in 0u32..8) {
        let grid = flat_grid(40, 40, false, false);
        let center = grid.resolve(20, 20).unwrap();
        let n = range as usize;
        prop_assert_eq!(grid.hexes_within_range(center, range).unwrap().len(), 1 + 3 * n * (n + 1));
    }

    #[test]
    fn prop_generation_is_deterministic(config in arb_world_config()) {
        let a = HexGrid::generate(&config).unwrap();
        let b = HexGrid::generate(&config).unwrap();
        prop_assert_eq!(a.state_hash(), b.state_hash());
        prop_assert_eq!(a.len(), (config.columns * config.rows) as usize);
    }
}

#[test]
fn test_reference_wrap_example() {
    let t = GridTopology::new(60, 30, true, false).unwrap();
    assert_eq!(t.resolve(-1, 5), Ok((59, 5)));
    assert_eq!(t.resolve(5, -1), Err(WorldError::InvalidAddress { x: 5, y: -1 }));
}

#[test]
fn test_reference_threshold_example() {
    let t = TerrainThresholds {
        height_flat: Fixed::ZERO,
        height_hill: Fixed::from_num(0.6),
        height_mountain: Fixed::ONE,
        ..TerrainThresholds::default()
    };
    assert_eq!(classify_elevation(Fixed::from_num(0.6), &t), ElevationType::Hill);
    assert_eq!(classify_elevation(Fixed::ONE, &t), ElevationType::Mountain);
    assert_eq!(classify_elevation(Fixed::from_num(-0.1), &t), ElevationType::Water);
}

#[test]
fn test_generation_matches_across_runs_and_threads() {
    for config in [WorldConfig::standard().with_seed(77), WorldConfig::large().with_seed(3)] {
        verify_generation_determinism(&config, 3).assert_deterministic();
        generate_in_parallel_scoped(&config, 4).assert_deterministic();
    }
}
