//! Headless hex world runner.
//!
//! This binary runs a world without graphics, controlled via JSON on
//! stdin/stdout. Designed for scripted sessions, CI testing and map review.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p hexworld_headless
//!
//! # Run a session on a scenario
//! cargo run -p hexworld_headless -- run --scenario scenarios/strait.ron
//!
//! # Print a generated map
//! cargo run -p hexworld_headless -- generate --preset large --seed 42
//!
//! # Survey 100 seeds in parallel
//! cargo run -p hexworld_headless -- survey --count 100
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hexworld_core::config::WorldConfig;
use hexworld_core::world::World;
use hexworld_headless::{
    ascii::{render_world, AsciiConfig},
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::{load_world_config, Scenario},
    verify::{survey_seeds, verify_generation},
};

#[derive(Parser)]
#[command(name = "hexworld_headless")]
#[command(about = "Headless hex world runner for scripted testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Built-in world sizes.
#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Small,
    Standard,
    Large,
}

impl Preset {
    fn config(self) -> WorldConfig {
        match self {
            Self::Small => WorldConfig::small(),
            Self::Standard => WorldConfig::standard(),
            Self::Large => WorldConfig::large(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Frames each step animation lasts
        #[arg(long, default_value = "3")]
        frames_per_step: u32,

        /// Output state after every move sequence and turn
        #[arg(long)]
        auto_state: bool,
    },

    /// Generate a world and print it as ASCII
    Generate {
        /// World config file (RON); overrides the preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Built-in size
        #[arg(short, long, value_enum, default_value = "standard")]
        preset: Preset,

        /// Seed override
        #[arg(long)]
        seed: Option<u64>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Verify determinism by generating the same seed multiple times
    Verify {
        /// World config file (RON); overrides the preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Built-in size
        #[arg(short, long, value_enum, default_value = "standard")]
        preset: Preset,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: usize,
    },

    /// Generate many seeds and report their terrain make-up
    Survey {
        /// World config file (RON); overrides the preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Built-in size
        #[arg(short, long, value_enum, default_value = "standard")]
        preset: Preset,

        /// First seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of seeds
        #[arg(short = 'n', long, default_value = "20")]
        count: u64,
    },

    /// Check that a scenario loads and builds
    Validate {
        /// Scenario file to check
        #[arg(short, long)]
        scenario: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            frames_per_step,
            auto_state,
        }) => cmd_run(scenario, frames_per_step, auto_state),
        Some(Commands::Generate {
            config,
            preset,
            seed,
            no_color,
        }) => cmd_generate(config, preset, seed, no_color),
        Some(Commands::Verify {
            config,
            preset,
            seed,
            runs,
        }) => cmd_verify(config, preset, seed, runs),
        Some(Commands::Survey {
            config,
            preset,
            seed,
            count,
        }) => cmd_survey(config, preset, seed, count),
        Some(Commands::Validate { scenario }) => cmd_validate(scenario),
        None => {
            // Default: interactive mode
            cmd_run(None, HeadlessConfig::default().frames_per_step, false);
        }
    }
}

/// Load the config file if given, else the preset.
fn resolve_config(path: Option<PathBuf>, preset: Preset) -> WorldConfig {
    match path {
        Some(path) => load_world_config(&path).unwrap_or_else(|e| {
            eprintln!("Failed to load config {}: {e}", path.display());
            process::exit(1);
        }),
        None => preset.config(),
    }
}

/// Run an interactive session
fn cmd_run(scenario: Option<PathBuf>, frames_per_step: u32, auto_state: bool) {
    tracing::info!("Starting interactive session");

    let config = HeadlessConfig {
        scenario_path: scenario,
        frames_per_step,
        auto_state_output: auto_state,
    };

    let mut runner = match HeadlessRunner::from_config(config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to start session: {e}");
            process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = runner.run(stdin.lock(), stdout.lock()) {
        eprintln!("Session I/O failed: {e}");
        process::exit(1);
    }
}

/// Generate a world and print it
fn cmd_generate(path: Option<PathBuf>, preset: Preset, seed: Option<u64>, no_color: bool) {
    let mut config = resolve_config(path, preset);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    let world = match World::from_config(&config) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Failed to generate world: {e}");
            process::exit(1);
        }
    };

    let ascii = AsciiConfig {
        use_color: !no_color,
        ..AsciiConfig::default()
    };
    print!("{}", render_world(&world, &ascii));
}

/// Verify generation determinism
fn cmd_verify(path: Option<PathBuf>, preset: Preset, seed: u64, runs: usize) {
    let config = resolve_config(path, preset).with_seed(seed);
    tracing::info!(seed, runs, "Verifying generation determinism");

    match verify_generation(&config, runs) {
        Ok(report) if report.is_deterministic => {
            println!(
                "PASS: {} runs of seed {} produced hash {:016x}",
                report.hashes.len(),
                report.seed,
                report.hashes.first().copied().unwrap_or_default()
            );
        }
        Ok(report) => {
            eprintln!("FAIL: seed {} produced hashes {:016x?}", report.seed, report.hashes);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Verification failed: {e}");
            process::exit(1);
        }
    }
}

/// Survey a range of seeds
fn cmd_survey(path: Option<PathBuf>, preset: Preset, seed: u64, count: u64) {
    let config = resolve_config(path, preset);
    let surveys = match survey_seeds(&config, seed, count) {
        Ok(surveys) => surveys,
        Err(e) => {
            eprintln!("Survey failed: {e}");
            process::exit(1);
        }
    };

    println!(
        "{:>8}  {:>16}  {:>6}  {:>6}  {:>6}  {:>6}  {:>6}  {:>5}",
        "seed", "hash", "water", "flat", "hills", "mount", "wood", "land"
    );
    for s in &surveys {
        println!(
            "{:>8}  {:016x}  {:>6}  {:>6}  {:>6}  {:>6}  {:>6}  {:>4.0}%",
            s.seed,
            s.hash,
            s.water,
            s.flat,
            s.hills,
            s.mountains,
            s.forested,
            s.land_fraction() * 100.0
        );
    }
}

/// Check a scenario file
fn cmd_validate(path: PathBuf) {
    let scenario = match Scenario::load(&path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Invalid scenario: {e}");
            process::exit(1);
        }
    };

    match scenario.build_world() {
        Ok(world) => {
            println!(
                "OK: {} ({} units, hash {:016x})",
                scenario.name,
                world.unit_count(),
                world.state_hash()
            );
        }
        Err(e) => {
            eprintln!("Scenario '{}' does not build: {e}", scenario.name);
            process::exit(1);
        }
    }
}
