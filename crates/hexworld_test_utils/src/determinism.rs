//! Determinism testing utilities.
//!
//! Provides a harness for verifying that generation and turn processing
//! produce identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Two worlds built from the same config and driven by the same commands
//! must hash identically. Sources of non-determinism include:
//!
//! - **Floating-point math**: generators may use `f64` internally, but every
//!   stored sample is converted to [`hexworld_core::math::Fixed`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units are always iterated in ascending id order.
//!
//! - **System randomness**: generation uses a seeded `ChaCha8Rng` only.

use std::thread;

use hexworld_core::prelude::*;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, steps: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            steps,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "World is non-deterministic!\n\
             Runs: {}\n\
             Steps: {}\n\
             Unique hashes: {} (expected 1)\n\
             All hashes: {:?}",
            self.hashes.len(),
            self.steps,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Build a state `runs` times, apply `step` to it `steps` times and compare
/// the final hashes.
///
/// # Example
///
/// ```ignore
/// use hexworld_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     3,
///     10,
///     || World::from_config(&WorldConfig::small()).unwrap(),
///     |world| { world.end_turn().unwrap(); },
///     World::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let hashes = (0..runs)
        .map(|_| {
            let mut state = setup();
            for _ in 0..steps {
                step(&mut state);
            }
            hash(&state)
        })
        .collect();

    DeterminismResult::from_hashes(hashes, steps)
}

/// Generate the grid for `config` `runs` times and compare the hashes.
///
/// # Panics
///
/// Panics if the config is invalid.
#[must_use]
pub fn verify_generation_determinism(config: &WorldConfig, runs: usize) -> DeterminismResult {
    verify_determinism(
        runs,
        0,
        || HexGrid::generate(config).expect("config must be valid"),
        |_| {},
        HexGrid::state_hash,
    )
}

/// Generate the grid for `config` on `threads` scoped threads at once.
///
/// Catches non-determinism that only shows up under thread scheduling
/// variations or different memory layouts.
///
/// # Panics
///
/// Panics if the config is invalid or a thread panics.
#[must_use]
pub fn generate_in_parallel_scoped(config: &WorldConfig, threads: usize) -> DeterminismResult {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    HexGrid::generate(config)
                        .expect("config must be valid")
                        .state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("generation thread panicked"))
            .collect()
    });

    DeterminismResult::from_hashes(hashes, 0)
}

/// Play `turns` full turns on two identical worlds, returning the first
/// turn after which their hashes differ.
///
/// Each turn plans nothing new: it moves every unit along its current path
/// with the signal cleared, then ends the turn.
pub fn find_first_divergence<F>(setup_fn: F, turns: u64) -> Option<u64>
where
    F: Fn() -> World,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for turn in 1..=turns {
        play_turn(&mut a);
        play_turn(&mut b);
        if a.state_hash() != b.state_hash() {
            return Some(turn);
        }
    }

    None
}

/// Move every unit with no animation in the way, then end the turn.
///
/// Returns the move report, or `None` if a sequence was already running.
pub fn play_turn(world: &mut World) -> Option<MoveReport> {
    world.begin_all_unit_moves().ok()?;
    let report = match world.poll_moves(&false) {
        MovePoll::Complete(report) => report,
        MovePoll::Idle | MovePoll::Pending(_) => return None,
    };
    world.end_turn().ok()?;
    Some(report)
}

/// Proptest strategies for grids, terrain and addresses.
pub mod strategies {
    use hexworld_core::prelude::*;
    use proptest::prelude::*;

    /// Grid dimensions and wrap flags.
    ///
    /// Range: 1..80 columns, 1..40 rows.
    pub fn arb_topology() -> impl Strategy<Value = GridTopology> {
        (1u32..80, 1u32..40, any::<bool>(), any::<bool>()).prop_map(|(c, r, ew, ns)| {
            GridTopology::new(c, r, ew, ns).unwrap_or_else(|_| unreachable!("positive dimensions"))
        })
    }

    /// Any logical address, well outside typical grid bounds.
    pub fn arb_address() -> impl Strategy<Value = (i32, i32)> {
        (-1000i32..1000, -1000i32..1000)
    }

    /// Elevation or moisture in `[-2, 2]`.
    pub fn arb_terrain_value() -> impl Strategy<Value = Fixed> {
        (-2000i32..=2000).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(1000))
    }

    /// A terrain sample.
    pub fn arb_sample() -> impl Strategy<Value = TerrainSample> {
        (arb_terrain_value(), arb_terrain_value()).prop_map(|(e, m)| TerrainSample::new(e, m))
    }

    /// Valid thresholds: each band strictly descending.
    pub fn arb_thresholds() -> impl Strategy<Value = TerrainThresholds> {
        (
            proptest::collection::btree_set(-1500i32..1500, 3),
            proptest::collection::btree_set(-1500i32..1500, 4),
        )
            .prop_map(|(heights, moistures)| {
                let h: Vec<Fixed> = heights
                    .into_iter()
                    .rev()
                    .map(|n| Fixed::from_num(n) / Fixed::from_num(1000))
                    .collect();
                let m: Vec<Fixed> = moistures
                    .into_iter()
                    .rev()
                    .map(|n| Fixed::from_num(n) / Fixed::from_num(1000))
                    .collect();
                TerrainThresholds {
                    height_mountain: h[0],
                    height_hill: h[1],
                    height_flat: h[2],
                    moisture_jungle: m[0],
                    moisture_forest: m[1],
                    moisture_grasslands: m[2],
                    moisture_plains: m[3],
                }
            })
    }

    /// A small seeded config.
    pub fn arb_world_config() -> impl Strategy<Value = WorldConfig> {
        (4u32..40, 4u32..24, any::<bool>(), any::<u64>(), 0u32..4).prop_map(
            |(columns, rows, wrap_ns, seed, continents)| {
                let generator = if continents == 0 {
                    GeneratorKind::FlatOcean
                } else {
                    GeneratorKind::Continents { count: continents }
                };
                WorldConfig {
                    columns,
                    rows,
                    wrap_north_south: wrap_ns,
                    ..WorldConfig::default()
                }
                .with_seed(seed)
                .with_generator(generator)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{flat_world, scout};
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_divergence() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_generation_is_deterministic() {
        verify_generation_determinism(&WorldConfig::small(), 3).assert_deterministic();
    }

    #[test]
    fn test_parallel_generation_is_deterministic() {
        generate_in_parallel_scoped(&WorldConfig::small().with_seed(7), 4).assert_deterministic();
    }

    #[test]
    fn test_turns_do_not_diverge() {
        let setup = || {
            let mut world = flat_world(16, 8);
            for (q, r) in [(0, 0), (3, 3), (8, 5)] {
                let id = world.spawn_unit(scout(2), q, r).unwrap();
                world.plan_path(id, q + 6, r).unwrap();
            }
            world
        };
        assert_eq!(find_first_divergence(setup, 5), None);
    }

    proptest! {
        #[test]
        fn prop_thresholds_are_valid(t in strategies::arb_thresholds()) {
            prop_assert!(t.validate().is_ok());
        }

        #[test]
        fn prop_configs_are_valid(c in strategies::arb_world_config()) {
            prop_assert!(c.validate().is_ok());
        }
    }
}
