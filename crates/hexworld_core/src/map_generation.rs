//! Procedural generation of raw elevation and moisture.
//!
//! Generators only produce numbers; classification happens when the
//! [`HexGrid`](crate::grid::HexGrid) is built from the [`RawTerrain`]. Any
//! type implementing [`MapGenerator`] can be plugged in without touching the
//! grid.
//!
//! Generators may compute in floating point internally, but convert every
//! sample to [`Fixed`] before returning it. The same seed always yields the
//! same raw terrain.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::hex::HexCoord;
use crate::math::{fixed_serde, Fixed};
use crate::topology::GridTopology;

/// Elevation of untouched ocean cells.
pub const OCEAN_FLOOR: f64 = -0.5;

/// Peak elevation of a raised area before noise.
const AREA_PEAK: f64 = 0.8;

/// How far noise may push elevation up or down.
const ELEVATION_NOISE_SCALE: f64 = 1.0;

/// Most land masses a [`ContinentGenerator`] will place.
pub const MAX_CONTINENTS: u32 = 64;

/// Noise cells across the map width.
const ELEVATION_NOISE_FREQUENCY: u32 = 8;
const MOISTURE_NOISE_FREQUENCY: u32 = 5;

/// One cell's generator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TerrainSample {
    /// Raw elevation.
    #[serde(with = "fixed_serde")]
    pub elevation: Fixed,
    /// Raw moisture.
    #[serde(with = "fixed_serde")]
    pub moisture: Fixed,
}

impl TerrainSample {
    /// Create a sample.
    #[must_use]
    pub const fn new(elevation: Fixed, moisture: Fixed) -> Self {
        Self {
            elevation,
            moisture,
        }
    }
}

/// Generator output: one sample per cell, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RawTerrain {
    samples: Vec<TerrainSample>,
}

impl RawTerrain {
    /// Wrap a row-major sample list.
    #[must_use]
    pub fn from_samples(samples: Vec<TerrainSample>) -> Self {
        Self { samples }
    }

    /// Same sample on every cell.
    #[must_use]
    pub fn uniform(topology: &GridTopology, sample: TerrainSample) -> Self {
        Self {
            samples: vec![sample; topology.cell_count()],
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in row-major order.
    #[must_use]
    pub fn samples(&self) -> &[TerrainSample] {
        &self.samples
    }

    /// Take the samples.
    #[must_use]
    pub fn into_samples(self) -> Vec<TerrainSample> {
        self.samples
    }
}

/// A strategy for filling a grid with raw terrain.
pub trait MapGenerator {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Produce one sample per cell of `topology`.
    fn generate(&self, topology: &GridTopology, seed: u64) -> RawTerrain;
}

/// Which generator a world config asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorKind {
    /// All ocean.
    FlatOcean,
    /// Seeded continents.
    Continents {
        /// Number of land masses, clamped to `1..=`[`MAX_CONTINENTS`].
        count: u32,
    },
}

impl Default for GeneratorKind {
    fn default() -> Self {
        Self::Continents { count: 2 }
    }
}

/// Instantiate the generator for a config entry.
#[must_use]
pub fn generator_for(kind: &GeneratorKind) -> Box<dyn MapGenerator> {
    match *kind {
        GeneratorKind::FlatOcean => Box::new(FlatOceanGenerator),
        GeneratorKind::Continents { count } => Box::new(ContinentGenerator::new(count)),
    }
}

/// Every cell is ocean at [`OCEAN_FLOOR`] with zero moisture.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatOceanGenerator;

impl MapGenerator for FlatOceanGenerator {
    fn name(&self) -> &'static str {
        "flat_ocean"
    }

    fn generate(&self, topology: &GridTopology, _seed: u64) -> RawTerrain {
        RawTerrain::uniform(
            topology,
            TerrainSample::new(Fixed::from_num(OCEAN_FLOOR), Fixed::ZERO),
        )
    }
}

/// Land masses built from overlapping raised areas, roughened by noise.
///
/// Each continent gets a band of columns. Inside it a handful of circular
/// areas are raised with a quadratic fall-off from the center; elevation
/// noise then carves coasts, hills and peaks, and a second noise field sets
/// moisture.
#[derive(Debug, Clone, Copy)]
pub struct ContinentGenerator {
    continents: u32,
}

impl ContinentGenerator {
    /// Generator for `continents` land masses, clamped to
    /// `1..=`[`MAX_CONTINENTS`].
    #[must_use]
    pub fn new(continents: u32) -> Self {
        let clamped = continents.clamp(1, MAX_CONTINENTS);
        if clamped != continents {
            tracing::warn!(requested = continents, used = clamped, "Continent count clamped");
        }
        Self { continents: clamped }
    }

    /// Number of land masses this generator places on a wide enough grid.
    #[must_use]
    pub const fn continents(&self) -> u32 {
        self.continents
    }

    fn raise_continents(&self, topology: &GridTopology, elevation: &mut [f64], rng: &mut ChaCha8Rng) {
        // One band of at least a column per continent.
        let count = self.continents.min(topology.columns());
        let columns = i32::try_from(topology.columns()).unwrap_or(i32::MAX);
        let rows = i32::try_from(topology.rows()).unwrap_or(i32::MAX);
        let count = i32::try_from(count).unwrap_or(1);
        let spacing = (columns / count).max(1);

        for continent in 0..count {
            let areas = rng.gen_range(4..8);
            for _ in 0..areas {
                let range = rng.gen_range(3..=6).min((rows - 1) / 2).max(0);
                let y = if rows > 2 * range {
                    rng.gen_range(range..rows - range)
                } else {
                    rows / 2
                };
                // Axial columns lean with the row; undo it so areas stay in band
                let x = (rng.gen_range(0..10) - y / 2).saturating_add(continent * spacing);
                let x = if topology.wraps_east_west() {
                    x
                } else {
                    x.clamp(0, columns - 1)
                };
                elevate_area(topology, elevation, HexCoord::new(x, y), range as u32, AREA_PEAK);
            }
        }
    }
}

impl MapGenerator for ContinentGenerator {
    fn name(&self) -> &'static str {
        "continents"
    }

    fn generate(&self, topology: &GridTopology, seed: u64) -> RawTerrain {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut elevation = vec![OCEAN_FLOOR; topology.cell_count()];

        self.raise_continents(topology, &mut elevation, &mut rng);

        let elevation_noise = ValueNoise::new(
            ELEVATION_NOISE_FREQUENCY,
            noise_rows(topology, ELEVATION_NOISE_FREQUENCY),
            &mut ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
        );
        let moisture_noise = ValueNoise::new(
            MOISTURE_NOISE_FREQUENCY,
            noise_rows(topology, MOISTURE_NOISE_FREQUENCY),
            &mut ChaCha8Rng::seed_from_u64(seed.wrapping_add(2)),
        );

        let columns = f64::from(topology.columns());
        let rows = f64::from(topology.rows());
        let samples = elevation
            .iter()
            .enumerate()
            .map(|(index, &base)| {
                let (column, row) = topology.coords(index);
                let u = f64::from(column) / columns;
                let v = f64::from(row) / rows;
                let e = base + (elevation_noise.sample(u, v) - 0.5) * ELEVATION_NOISE_SCALE;
                let m = (moisture_noise.sample(u, v) - 0.5) * 2.0;
                TerrainSample::new(Fixed::from_num(e), Fixed::from_num(m))
            })
            .collect();

        RawTerrain::from_samples(samples)
    }
}

/// Raise every cell within `range` of `center` towards `peak`, falling off
/// quadratically to a quarter of the peak at the rim. Cells already higher
/// are left alone so overlapping areas merge instead of cratering.
pub fn elevate_area(topology: &GridTopology, elevation: &mut [f64], center: HexCoord, range: u32, peak: f64) {
    let Ok((cq, cr)) = topology.resolve(center.q, center.r) else {
        tracing::debug!(q = center.q, r = center.r, "Raised area center off the grid");
        return;
    };
    let center = HexCoord::new(cq as i32, cr as i32);

    for (column, row) in topology.within_range(center.q, center.r, range) {
        let cell = HexCoord::new(column as i32, row as i32);
        let t = if range == 0 {
            0.0
        } else {
            f64::from(topology.distance(center, cell)) / f64::from(range)
        };
        let height = peak * lerp(1.0, 0.25, t * t);
        let index = topology.index(column, row);
        elevation[index] = elevation[index].max(height);
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn noise_rows(topology: &GridTopology, frequency: u32) -> u32 {
    let rows = u64::from(frequency) * u64::from(topology.rows()) / u64::from(topology.columns());
    (rows as u32).max(1)
}

/// Periodic 2D value noise on a `width x height` lattice.
///
/// Sampling coordinates are in `[0, 1)` across the map; the lattice tiles,
/// so the left and right edges of a wrapping map line up.
struct ValueNoise {
    width: u32,
    height: u32,
    lattice: Vec<f64>,
}

impl ValueNoise {
    fn new(width: u32, height: u32, rng: &mut ChaCha8Rng) -> Self {
        let lattice = (0..width * height).map(|_| rng.gen::<f64>()).collect();
        Self {
            width,
            height,
            lattice,
        }
    }

    fn at(&self, x: u32, y: u32) -> f64 {
        let x = x % self.width;
        let y = y % self.height;
        self.lattice[(y * self.width + x) as usize]
    }

    fn sample(&self, u: f64, v: f64) -> f64 {
        let x = u * f64::from(self.width);
        let y = v * f64::from(self.height);
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = smoothstep(x - x0);
        let ty = smoothstep(y - y0);
        let (x0, y0) = (x0 as u32, y0 as u32);

        let top = lerp(self.at(x0, y0), self.at(x0 + 1, y0), tx);
        let bottom = lerp(self.at(x0, y0 + 1), self.at(x0 + 1, y0 + 1), tx);
        lerp(top, bottom, ty)
    }
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}
