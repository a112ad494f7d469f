//! Terrain classification from elevation and moisture.
//!
//! Classification is a pure function of `(elevation, moisture, thresholds)`.
//! Two passes run over the same inputs:
//!
//! 1. **Elevation band**: descending comparison against the three height
//!    thresholds picks Mountain, Hill, Flat or Water.
//! 2. **Moisture band**: only cells in the land band
//!    `[height_flat, height_mountain)` get a terrain and feature; every
//!    other cell is Ocean with no feature. Mountains never carry one.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldError};
use crate::hex::{ElevationType, FeatureType, TerrainType};
use crate::math::{decimal_serde, Fixed};

/// The seven classification thresholds.
///
/// Both bands must be strictly descending; [`TerrainThresholds::validate`]
/// enforces it once, at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerrainThresholds {
    /// Elevation at or above which a cell is a mountain.
    #[serde(with = "decimal_serde")]
    pub height_mountain: Fixed,
    /// Elevation at or above which a cell is a hill.
    #[serde(with = "decimal_serde")]
    pub height_hill: Fixed,
    /// Elevation at or above which a cell is land.
    #[serde(with = "decimal_serde")]
    pub height_flat: Fixed,
    /// Moisture at or above which land is jungle.
    #[serde(with = "decimal_serde")]
    pub moisture_jungle: Fixed,
    /// Moisture at or above which land is forested.
    #[serde(with = "decimal_serde")]
    pub moisture_forest: Fixed,
    /// Moisture at or above which land is grassland.
    #[serde(with = "decimal_serde")]
    pub moisture_grasslands: Fixed,
    /// Moisture at or above which land is plains; below is desert.
    #[serde(with = "decimal_serde")]
    pub moisture_plains: Fixed,
}

impl Default for TerrainThresholds {
    fn default() -> Self {
        Self {
            height_mountain: Fixed::ONE,
            height_hill: Fixed::from_num(0.6),
            height_flat: Fixed::ZERO,
            moisture_jungle: Fixed::from_num(0.66),
            moisture_forest: Fixed::from_num(0.33),
            moisture_grasslands: Fixed::ZERO,
            moisture_plains: Fixed::from_num(-0.5),
        }
    }
}

impl TerrainThresholds {
    /// Check that both bands are strictly descending.
    pub fn validate(&self) -> Result<()> {
        if !(self.height_mountain > self.height_hill && self.height_hill > self.height_flat) {
            return Err(WorldError::UnorderedThresholds(format!(
                "height thresholds must satisfy mountain > hill > flat, got {} / {} / {}",
                self.height_mountain, self.height_hill, self.height_flat
            )));
        }
        if !(self.moisture_jungle > self.moisture_forest
            && self.moisture_forest > self.moisture_grasslands
            && self.moisture_grasslands > self.moisture_plains)
        {
            return Err(WorldError::UnorderedThresholds(format!(
                "moisture thresholds must satisfy jungle > forest > grasslands > plains, \
                 got {} / {} / {} / {}",
                self.moisture_jungle,
                self.moisture_forest,
                self.moisture_grasslands,
                self.moisture_plains
            )));
        }
        Ok(())
    }

    /// Whether an elevation lies in the land band `[flat, mountain)`.
    #[must_use]
    pub fn is_land_band(&self, elevation: Fixed) -> bool {
        elevation >= self.height_flat && elevation < self.height_mountain
    }
}

/// Derived classification of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Classification {
    /// Elevation band.
    pub elevation_type: ElevationType,
    /// Base terrain.
    pub terrain_type: TerrainType,
    /// Vegetation overlay.
    pub feature_type: FeatureType,
}

/// Classify one `(elevation, moisture)` pair.
///
/// Thresholds are assumed valid; see [`TerrainThresholds::validate`].
#[must_use]
pub fn classify(elevation: Fixed, moisture: Fixed, thresholds: &TerrainThresholds) -> Classification {
    let elevation_type = classify_elevation(elevation, thresholds);

    let (terrain_type, feature_type) = if thresholds.is_land_band(elevation) {
        classify_moisture(moisture, thresholds)
    } else {
        (TerrainType::Ocean, FeatureType::None)
    };

    Classification {
        elevation_type,
        terrain_type,
        feature_type,
    }
}

/// Elevation band by descending threshold comparison.
#[must_use]
pub fn classify_elevation(elevation: Fixed, thresholds: &TerrainThresholds) -> ElevationType {
    if elevation >= thresholds.height_mountain {
        ElevationType::Mountain
    } else if elevation >= thresholds.height_hill {
        ElevationType::Hill
    } else if elevation >= thresholds.height_flat {
        ElevationType::Flat
    } else {
        ElevationType::Water
    }
}

fn classify_moisture(moisture: Fixed, thresholds: &TerrainThresholds) -> (TerrainType, FeatureType) {
    if moisture >= thresholds.moisture_jungle {
        (TerrainType::Grasslands, FeatureType::Rainforest)
    } else if moisture >= thresholds.moisture_forest {
        (TerrainType::Grasslands, FeatureType::Forest)
    } else if moisture >= thresholds.moisture_grasslands {
        (TerrainType::Grasslands, FeatureType::None)
    } else if moisture >= thresholds.moisture_plains {
        (TerrainType::Plains, FeatureType::None)
    } else {
        (TerrainType::Desert, FeatureType::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn classify_f(e: f64, m: f64) -> Classification {
        classify(fixed(e), fixed(m), &TerrainThresholds::default())
    }

    #[test]
    fn test_default_thresholds_are_valid() {
        assert!(TerrainThresholds::default().validate().is_ok());
    }

    #[test]
    fn test_elevation_examples() {
        // flat 0.0, hill 0.6, mountain 1.0
        assert_eq!(classify_f(0.6, 0.0).elevation_type, ElevationType::Hill);
        assert_eq!(classify_f(1.0, 0.0).elevation_type, ElevationType::Mountain);
        assert_eq!(classify_f(-0.1, 0.0).elevation_type, ElevationType::Water);
        assert_eq!(classify_f(0.0, 0.0).elevation_type, ElevationType::Flat);
        assert_eq!(classify_f(0.59, 0.0).elevation_type, ElevationType::Flat);
    }

    #[test]
    fn test_moisture_bands_on_flat() {
        let cases = [
            (0.9, TerrainType::Grasslands, FeatureType::Rainforest),
            (0.66, TerrainType::Grasslands, FeatureType::Rainforest),
            (0.5, TerrainType::Grasslands, FeatureType::Forest),
            (0.33, TerrainType::Grasslands, FeatureType::Forest),
            (0.1, TerrainType::Grasslands, FeatureType::None),
            (0.0, TerrainType::Grasslands, FeatureType::None),
            (-0.2, TerrainType::Plains, FeatureType::None),
            (-0.5, TerrainType::Plains, FeatureType::None),
            (-0.51, TerrainType::Desert, FeatureType::None),
        ];
        for (m, terrain, feature) in cases {
            let c = classify_f(0.3, m);
            assert_eq!(c.terrain_type, terrain, "moisture {m}");
            assert_eq!(c.feature_type, feature, "moisture {m}");
        }
    }

    #[test]
    fn test_mountain_has_no_terrain() {
        let c = classify_f(1.4, 0.9);
        assert_eq!(c.elevation_type, ElevationType::Mountain);
        assert_eq!(c.terrain_type, TerrainType::Ocean);
        assert_eq!(c.feature_type, FeatureType::None);
    }

    #[test]
    fn test_water_has_no_terrain() {
        let c = classify_f(-0.5, 0.9);
        assert_eq!(c.elevation_type, ElevationType::Water);
        assert_eq!(c.terrain_type, TerrainType::Ocean);
        assert_eq!(c.feature_type, FeatureType::None);
    }

    #[test]
    fn test_hill_can_be_jungle() {
        let c = classify_f(0.8, 0.7);
        assert_eq!(c.elevation_type, ElevationType::Hill);
        assert_eq!(c.feature_type, FeatureType::Rainforest);
    }

    #[test]
    fn test_unordered_height_thresholds() {
        let t = TerrainThresholds {
            height_hill: fixed(1.2),
            ..TerrainThresholds::default()
        };
        assert!(matches!(t.validate(), Err(WorldError::UnorderedThresholds(_))));
    }

    #[test]
    fn test_equal_thresholds_rejected() {
        let t = TerrainThresholds {
            moisture_forest: fixed(0.66),
            ..TerrainThresholds::default()
        };
        assert!(matches!(t.validate(), Err(WorldError::UnorderedThresholds(_))));
    }

    #[test]
    fn test_thresholds_from_ron() {
        let ron = r"(
            height_mountain: 1.0,
            height_hill: 0.6,
            height_flat: 0.0,
            moisture_jungle: 0.66,
            moisture_forest: 0.33,
            moisture_grasslands: 0.0,
            moisture_plains: -0.5,
        )";
        let t: TerrainThresholds = ron::from_str(ron).unwrap();
        assert_eq!(t, TerrainThresholds::default());
    }
}
