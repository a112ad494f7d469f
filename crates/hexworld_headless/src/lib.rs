//! Headless world runner for scripted testing and CI verification.
//!
//! This crate drives a [`hexworld_core::world::World`] via JSON commands on
//! stdin, with responses on stdout. This enables:
//!
//! - **Scripted play**: a controller spawns units, plans paths and steps
//!   through move sequences frame by frame
//! - **CI verification**: determinism checks of generation and turns
//! - **Map review**: ASCII renderings of generated worlds
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (spawn, path, move_all, frame, etc.)
//! - **stdout**: Responses and step notifications (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively on the built-in island
//! echo '{"cmd":"query"}' | cargo run -p hexworld_headless
//!
//! # Run a scenario
//! cargo run -p hexworld_headless -- run --scenario scenarios/strait.ron
//!
//! # Verify generation determinism
//! cargo run -p hexworld_headless -- verify --seed 7 --runs 8
//! ```

pub mod ascii;
pub mod protocol;
pub mod runner;
pub mod scenario;
pub mod verify;

pub use ascii::{render_world, AsciiConfig};
pub use protocol::{Command, Response};
pub use runner::{AnimationClock, HeadlessConfig, HeadlessRunner, RunnerError};
pub use scenario::{Scenario, ScenarioError};
pub use verify::{survey_seeds, verify_generation, SeedSurvey, VerifyReport};
