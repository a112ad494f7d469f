//! World configuration.
//!
//! Pure data, deserialisable from RON. File loading lives in the headless
//! runner; this module never touches the filesystem.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldError};
use crate::map_generation::GeneratorKind;
use crate::terrain::TerrainThresholds;
use crate::topology::GridTopology;

/// Everything needed to generate a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    pub columns: u32,
    /// Grid height in cells.
    pub rows: u32,
    /// Whether columns wrap around.
    #[serde(default = "default_true")]
    pub wrap_east_west: bool,
    /// Whether rows wrap around.
    #[serde(default)]
    pub wrap_north_south: bool,
    /// Classification thresholds.
    #[serde(default)]
    pub thresholds: TerrainThresholds,
    /// Map generator.
    #[serde(default)]
    pub generator: GeneratorKind,
    /// Random seed for deterministic generation.
    #[serde(default)]
    pub seed: u64,
}

fn default_true() -> bool {
    true
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            columns: 60,
            rows: 30,
            wrap_east_west: true,
            wrap_north_south: false,
            thresholds: TerrainThresholds::default(),
            generator: GeneratorKind::default(),
            seed: 12345,
        }
    }
}

impl WorldConfig {
    /// A 30x16 map.
    #[must_use]
    pub fn small() -> Self {
        Self {
            columns: 30,
            rows: 16,
            ..Default::default()
        }
    }

    /// The standard 60x30 map.
    #[must_use]
    pub fn standard() -> Self {
        Self::default()
    }

    /// A 120x60 map.
    #[must_use]
    pub fn large() -> Self {
        Self {
            columns: 120,
            rows: 60,
            generator: GeneratorKind::Continents { count: 4 },
            ..Default::default()
        }
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the generator.
    #[must_use]
    pub const fn with_generator(mut self, generator: GeneratorKind) -> Self {
        self.generator = generator;
        self
    }

    /// Set the wrap flags.
    #[must_use]
    pub const fn with_wrap(mut self, east_west: bool, north_south: bool) -> Self {
        self.wrap_east_west = east_west;
        self.wrap_north_south = north_south;
        self
    }

    /// Set the thresholds.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: TerrainThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Parse from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| WorldError::ConfigParse(e.to_string()))
    }

    /// Fail fast on bad dimensions or thresholds.
    pub fn validate(&self) -> Result<()> {
        self.topology()?;
        self.thresholds.validate()
    }

    /// Topology described by this config.
    pub fn topology(&self) -> Result<GridTopology> {
        GridTopology::new(
            self.columns,
            self.rows,
            self.wrap_east_west,
            self.wrap_north_south,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;

    #[test]
    fn test_default_matches_reference_map() {
        let config = WorldConfig::default();
        assert_eq!((config.columns, config.rows), (60, 30));
        assert!(config.wrap_east_west);
        assert!(!config.wrap_north_south);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert_eq!(WorldConfig::small().columns, 30);
        assert_eq!(WorldConfig::standard(), WorldConfig::default());
        assert_eq!(WorldConfig::large().rows, 60);
        let c = WorldConfig::small().with_seed(9).with_wrap(false, false);
        assert_eq!(c.seed, 9);
        assert!(!c.wrap_east_west);
    }

    #[test]
    fn test_parse_minimal_ron() {
        let config = WorldConfig::from_ron_str("(columns: 10, rows: 8)").unwrap();
        assert_eq!(config.columns, 10);
        assert!(config.wrap_east_west);
        assert_eq!(config.thresholds, TerrainThresholds::default());
    }

    #[test]
    fn test_parse_full_ron() {
        let ron = r"(
            columns: 12,
            rows: 6,
            wrap_east_west: false,
            wrap_north_south: true,
            thresholds: (
                height_mountain: 2.0,
                height_hill: 1.0,
                height_flat: 0.5,
                moisture_jungle: 0.9,
                moisture_forest: 0.5,
                moisture_grasslands: 0.1,
                moisture_plains: -0.1,
            ),
            generator: FlatOcean,
            seed: 77,
        )";
        let config = WorldConfig::from_ron_str(ron).unwrap();
        assert!(config.wrap_north_south);
        assert_eq!(config.generator, GeneratorKind::FlatOcean);
        assert_eq!(config.thresholds.height_flat, Fixed::from_num(0.5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            WorldConfig::from_ron_str("(columns: \"ten\")"),
            Err(WorldError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_rows() {
        let config = WorldConfig {
            rows: 0,
            ..WorldConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(WorldError::InvalidDimensions { columns: 60, rows: 0 })
        );
    }
}
