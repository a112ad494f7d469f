//! Scenario loading and configuration.
//!
//! Scenarios define the initial world for headless sessions: the generator
//! config, hand-placed terrain, the movement overlay and starting units.

use std::path::Path;

use hexworld_core::prelude::{
    Fixed, GeneratorKind, MovementCapability, UnitSpec, World, WorldConfig, WorldError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A value does not fit the world.
    #[error("Invalid scenario value: {0}")]
    Invalid(String),
    /// The world rejected the scenario.
    #[error("Scenario rejected by world: {0}")]
    World(#[from] WorldError),
}

/// Hand-placed terrain: every cell within `range` of `(q, r)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandPatch {
    /// Center column.
    pub q: i32,
    /// Center row.
    pub r: i32,
    /// Hex radius; 0 covers the center only. Ranges past the grid cover it all.
    #[serde(default)]
    pub range: u32,
    /// Raw elevation written to every covered cell.
    pub elevation: f64,
    /// Raw moisture written to every covered cell.
    #[serde(default = "default_moisture")]
    pub moisture: f64,
}

fn default_moisture() -> f64 {
    0.1
}

/// A starting unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSetup {
    /// Display name.
    pub name: String,
    /// Starting column.
    pub q: i32,
    /// Starting row.
    pub r: i32,
    /// Movement points per turn.
    #[serde(default = "default_movement")]
    pub movement: f64,
    /// Terrain the unit may enter.
    #[serde(default)]
    pub capability: MovementCapability,
    /// Planned on load when set.
    #[serde(default)]
    pub destination: Option<(i32, i32)>,
}

fn default_movement() -> f64 {
    2.0
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Grid generation.
    #[serde(default)]
    pub world: WorldConfig,
    /// Terrain applied over the generated grid, in order.
    #[serde(default)]
    pub land: Vec<LandPatch>,
    /// Cells carrying a road.
    #[serde(default)]
    pub roads: Vec<(i32, i32)>,
    /// Cell pairs separated by a river.
    #[serde(default)]
    pub rivers: Vec<((i32, i32), (i32, i32))>,
    /// Cells inside an enemy zone of control.
    #[serde(default)]
    pub zones_of_control: Vec<(i32, i32)>,
    /// Starting units, spawned in order.
    #[serde(default)]
    pub units: Vec<UnitSetup>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::island()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// A flat island in an ocean that wraps east-west, with a scout and a
    /// boat.
    #[must_use]
    pub fn island() -> Self {
        Self {
            name: "Island".to_string(),
            description: "Grassland island on a small ocean cylinder".to_string(),
            world: WorldConfig::small().with_generator(GeneratorKind::FlatOcean),
            land: vec![LandPatch {
                q: 12,
                r: 8,
                range: 5,
                elevation: 0.2,
                moisture: 0.1,
            }],
            roads: Vec::new(),
            rivers: Vec::new(),
            zones_of_control: Vec::new(),
            units: vec![
                UnitSetup {
                    name: "Scout".to_string(),
                    q: 10,
                    r: 8,
                    movement: 2.0,
                    capability: MovementCapability::Land,
                    destination: None,
                },
                UnitSetup {
                    name: "Boat".to_string(),
                    q: 2,
                    r: 8,
                    movement: 3.0,
                    capability: MovementCapability::Naval,
                    destination: None,
                },
            ],
        }
    }

    /// Generate the grid, apply terrain and overlay, spawn the units and
    /// plan their paths.
    pub fn build_world(&self) -> Result<World, ScenarioError> {
        let mut world = World::from_config(&self.world)?;

        {
            let grid = world.grid_mut()?;
            for patch in &self.land {
                let elevation = to_fixed(patch.elevation, "elevation")?;
                let moisture = to_fixed(patch.moisture, "moisture")?;
                let center = grid.resolve(patch.q, patch.r)?;
                for id in grid.hexes_within_range(center, patch.range)? {
                    grid.set_elevation(id, elevation)?;
                    grid.set_moisture(id, moisture)?;
                }
            }
        }

        for &(q, r) in &self.roads {
            let hex = world.grid().resolve(q, r)?;
            world.overlay_mut().add_road(hex);
        }
        for &((aq, ar), (bq, br)) in &self.rivers {
            let a = world.grid().resolve(aq, ar)?;
            let b = world.grid().resolve(bq, br)?;
            world.overlay_mut().add_river(a, b);
        }
        for &(q, r) in &self.zones_of_control {
            let hex = world.grid().resolve(q, r)?;
            world.overlay_mut().add_zone_of_control(hex);
        }

        for setup in &self.units {
            let spec = UnitSpec::land(setup.name.clone(), to_fixed(setup.movement, "movement")?)
                .with_capability(setup.capability);
            let id = world.spawn_unit(spec, setup.q, setup.r)?;
            if let Some((q, r)) = setup.destination {
                world.plan_path(id, q, r)?;
            }
        }

        tracing::debug!(
            scenario = %self.name,
            units = world.unit_count(),
            hash = world.state_hash(),
            "Built scenario world"
        );
        Ok(world)
    }
}

/// Load a bare world config from a RON file.
pub fn load_world_config<P: AsRef<Path>>(path: P) -> Result<WorldConfig, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config = WorldConfig::from_ron_str(&contents)?;
    config.validate()?;
    Ok(config)
}

fn to_fixed(value: f64, what: &str) -> Result<Fixed, ScenarioError> {
    Fixed::checked_from_num(value).ok_or_else(|| ScenarioError::Invalid(format!("{what} {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexworld_core::prelude::{ElevationType, TerrainType};

    #[test]
    fn test_island_builds() {
        let world = Scenario::island().build_world().unwrap();
        assert_eq!(world.unit_count(), 2);

        let center = world.grid().hex_at(12, 8).unwrap();
        assert_eq!(center.elevation_type(), ElevationType::Flat);
        assert_eq!(center.terrain_type(), TerrainType::Grasslands);
        let sea = world.grid().hex_at(0, 0).unwrap();
        assert_eq!(sea.elevation_type(), ElevationType::Water);
    }

    #[test]
    fn test_land_patch_past_the_edge_covers_grid() {
        let mut scenario = Scenario::island();
        scenario.land = vec![LandPatch {
            q: 0,
            r: 0,
            range: u32::MAX,
            elevation: 0.2,
            moisture: 0.1,
        }];
        scenario.units.truncate(1);
        let world = scenario.build_world().unwrap();
        assert!(world
            .grid()
            .iter()
            .all(|(_, hex)| hex.elevation_type() == ElevationType::Flat));
    }

    #[test]
    fn test_parse_minimal_scenario() {
        let scenario = Scenario::from_ron_str(r#"(name: "Empty")"#).unwrap();
        assert_eq!(scenario.world, WorldConfig::default());
        assert!(scenario.units.is_empty());
    }

    #[test]
    fn test_destination_is_planned() {
        let mut scenario = Scenario::island();
        scenario.units[0].destination = Some((14, 8));
        let world = scenario.build_world().unwrap();
        let scout = world.units().next().unwrap();
        assert_eq!(scout.path().len(), 4);
    }

    #[test]
    fn test_unit_in_water_is_rejected() {
        let mut scenario = Scenario::island();
        scenario.units[0].q = 0;
        scenario.units[0].r = 0;
        assert!(matches!(
            scenario.build_world(),
            Err(ScenarioError::World(WorldError::ImpassableDestination { .. }))
        ));
    }

    #[test]
    fn test_overlay_is_applied() {
        let mut scenario = Scenario::island();
        scenario.roads = vec![(11, 8), (12, 8)];
        let world = scenario.build_world().unwrap();
        let a = world.grid().resolve(11, 8).unwrap();
        let b = world.grid().resolve(12, 8).unwrap();
        assert!(world.overlay().has_road(a));
        assert_eq!(
            world.step_cost(a, b, MovementCapability::Land).unwrap().value(),
            Some(hexworld_core::movement::ROAD_COST)
        );
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Scenario::load("does/not/exist.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
