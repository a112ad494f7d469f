//! ASCII map renderer for quick terminal review.
//!
//! Each row is shifted half a cell further right than the one above, so the
//! axial grid reads as the parallelogram it is.

use std::collections::BTreeMap;
use std::fmt::Write;

use hexworld_core::prelude::*;

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Draw units over the terrain.
    pub show_units: bool,
    /// Print the glyph legend and terrain counts.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_units: true,
            show_legend: true,
            use_color: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const WHITE: &str = "\x1b[37m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Glyph and color for a cell.
fn terrain_glyph(hex: &Hex) -> (char, &'static str) {
    match (hex.elevation_type(), hex.feature_type(), hex.terrain_type()) {
        (ElevationType::Water, ..) => ('~', colors::BLUE),
        (ElevationType::Mountain, ..) => ('^', colors::WHITE),
        (_, FeatureType::Rainforest, _) => ('T', colors::GREEN),
        (_, FeatureType::Forest, _) => ('t', colors::GREEN),
        (ElevationType::Hill, ..) => ('n', colors::GRAY),
        (_, _, TerrainType::Desert) => (':', colors::YELLOW),
        (_, _, TerrainType::Plains) => ('.', colors::YELLOW),
        (_, _, TerrainType::Grasslands | TerrainType::Ocean) => (',', colors::GREEN),
    }
}

/// Units are drawn by the last digit of their id.
fn unit_glyph(id: UnitId) -> char {
    char::from_digit((id.0 % 10) as u32, 10).unwrap_or('@')
}

/// Render the world as ASCII art.
pub fn render_world(world: &World, config: &AsciiConfig) -> String {
    let grid = world.grid();
    let mut output = String::new();

    let units: BTreeMap<HexId, UnitId> = if config.show_units {
        world.units().map(|u| (u.hex(), u.id())).collect()
    } else {
        BTreeMap::new()
    };

    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };
    let _ = writeln!(
        output,
        "{bold}Turn {} | {}x{} | units {} | hash {:016x}{reset}",
        world.turn(),
        grid.columns(),
        grid.rows(),
        world.unit_count(),
        world.state_hash()
    );

    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    let mut line = String::new();
    let mut row = 0;
    for (id, hex) in grid.iter() {
        if hex.r() != row {
            let _ = writeln!(output, "{}", line.trim_end());
            line.clear();
            row = hex.r();
        }
        if line.is_empty() {
            line.push_str(&" ".repeat(row as usize));
        }

        let (ch, color) = terrain_glyph(hex);
        *counts.entry(ch).or_default() += 1;
        let (ch, color) = match units.get(&id) {
            Some(&unit) => (unit_glyph(unit), colors::RED),
            None => (ch, color),
        };

        if config.use_color {
            line.push_str(color);
            line.push(ch);
            line.push_str(colors::RESET);
        } else {
            line.push(ch);
        }
        line.push(' ');
    }
    let _ = writeln!(output, "{}", line.trim_end());

    if config.show_legend {
        output.push_str("Legend: ~ water  ^ mountain  n hill  : desert  . plains  , grassland  t forest  T jungle  0-9 unit\n");
        let summary: Vec<String> = counts.iter().map(|(ch, n)| format!("{ch} {n}")).collect();
        let _ = writeln!(output, "Cells: {}", summary.join("  "));
    }

    output
}
