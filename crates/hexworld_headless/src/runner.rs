//! Headless session runner.
//!
//! Owns a [`World`] and a simulated view ([`AnimationClock`]) and turns
//! protocol commands into world operations. The session loop reads one
//! command per line and writes every response as a JSON line.

use std::cell::{Cell, RefCell};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

use hexworld_core::prelude::*;
use thiserror::Error;

use crate::protocol::{Command, RefusalState, Response, UnitState};
use crate::scenario::{Scenario, ScenarioError};

/// Error type for starting a session.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The scenario could not be loaded or applied.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The world could not be built.
    #[error("Failed to build world: {0}")]
    World(#[from] WorldError),
}

/// Simulated view layer.
///
/// Every step notification starts an animation lasting `frames_per_step`
/// frames and is queued for the protocol output. The clock is registered
/// with the world as a listener and polled as the animation signal; clones
/// share state.
#[derive(Debug, Clone, Default)]
pub struct AnimationClock {
    frames_left: Rc<Cell<u32>>,
    frames_per_step: u32,
    pending: Rc<RefCell<Vec<UnitMoved>>>,
}

impl AnimationClock {
    /// A clock whose animations last `frames_per_step` frames.
    pub fn new(frames_per_step: u32) -> Self {
        Self {
            frames_per_step,
            ..Self::default()
        }
    }

    /// Play one frame.
    pub fn advance(&self) {
        self.frames_left.set(self.frames_left.get().saturating_sub(1));
    }

    /// Frames left in the current animation.
    pub fn frames_left(&self) -> u32 {
        self.frames_left.get()
    }

    /// Take every step reported since the last call.
    pub fn drain_events(&self) -> Vec<UnitMoved> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }
}

impl MoveListener for AnimationClock {
    fn on_unit_moved(&mut self, event: &UnitMoved) {
        self.pending.borrow_mut().push(*event);
        self.frames_left.set(self.frames_per_step);
    }
}

impl AnimationSignal for AnimationClock {
    fn is_playing(&self) -> bool {
        self.frames_left.get() > 0
    }
}

/// Headless runner configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Scenario file to load on startup.
    pub scenario_path: Option<PathBuf>,
    /// Frames each step animation lasts.
    pub frames_per_step: u32,
    /// Output a `state` response after every completed move sequence.
    pub auto_state_output: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            scenario_path: None,
            frames_per_step: 3,
            auto_state_output: false,
        }
    }
}

/// Headless runner for scripted world sessions.
#[derive(Debug)]
pub struct HeadlessRunner {
    world: World,
    clock: AnimationClock,
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// Wrap an existing world.
    pub fn new(mut world: World, config: HeadlessConfig) -> Self {
        let clock = AnimationClock::new(config.frames_per_step);
        world.add_listener(Box::new(clock.clone()));
        Self {
            world,
            clock,
            config,
        }
    }

    /// Build the world from the configured scenario, or the default
    /// scenario when none is set.
    pub fn from_config(config: HeadlessConfig) -> std::result::Result<Self, RunnerError> {
        let scenario = match &config.scenario_path {
            Some(path) => Scenario::load(path)?,
            None => Scenario::default(),
        };
        tracing::info!(scenario = %scenario.name, "Loading scenario");
        let world = scenario.build_world()?;
        Ok(Self::new(world, config))
    }

    /// The world being driven.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The simulated view.
    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    /// Execute one command, returning every response it produced.
    pub fn handle(&mut self, command: Command) -> Vec<Response> {
        let name = command.name();
        let mut out = Vec::new();
        if let Err(e) = self.dispatch(command, &mut out) {
            tracing::warn!(cmd = name, error = %e, "Command failed");
            out.push(Response::error(e.to_string(), Some(name)));
        }
        out
    }

    fn dispatch(&mut self, command: Command, out: &mut Vec<Response>) -> Result<()> {
        let name = command.name();
        match command {
            Command::Query => out.push(self.state()),
            Command::Spawn {
                name: unit_name,
                q,
                r,
                movement,
                capability,
            } => {
                let max_movement = to_fixed(movement)?;
                let spec = UnitSpec::land(unit_name, max_movement).with_capability(capability);
                let id = self.world.spawn_unit(spec, q, r)?;
                let at = self.world.grid().coord(self.world.unit(id)?.hex())?;
                out.push(Response::Spawned {
                    unit_id: id.0,
                    q: at.q,
                    r: at.r,
                });
            }
            Command::Despawn { unit_id } => {
                self.world.despawn_unit(UnitId(unit_id))?;
                out.push(Response::ack(name));
            }
            Command::Path { unit_id, q, r } => {
                self.world.plan_path(UnitId(unit_id), q, r)?;
                out.push(Response::ack(name));
            }
            Command::MoveAll => {
                self.world.begin_all_unit_moves()?;
                if !self.poll(out) {
                    out.push(Response::ack(name));
                }
            }
            Command::MoveUnit { unit_id } => {
                self.world.begin_unit_moves(UnitId(unit_id))?;
                if !self.poll(out) {
                    out.push(Response::ack(name));
                }
            }
            Command::Frame { count } => {
                let mut completed = false;
                for _ in 0..count {
                    self.clock.advance();
                    if self.world.is_moving() && self.poll(out) {
                        completed = true;
                        break;
                    }
                }
                if !completed {
                    out.push(Response::ack(name));
                }
            }
            Command::EndTurn => {
                let summary = self.world.end_turn()?;
                for (unit, error) in &summary.failures {
                    tracing::warn!(unit = %unit, error = %error, "Movement reset failed");
                }
                out.push(Response::ack(name));
                if self.config.auto_state_output {
                    out.push(self.state());
                }
            }
            Command::Range { q, r, range } => {
                let grid = self.world.grid();
                let center = grid.resolve(q, r)?;
                let cells = grid
                    .hexes_within_range(center, range)?
                    .into_iter()
                    .map(|id| grid.coord(id))
                    .collect::<Result<Vec<_>>>()?;
                out.push(Response::Range {
                    center: grid.coord(center)?,
                    cells,
                });
            }
            Command::Cost {
                from,
                to,
                capability,
            } => {
                let grid = self.world.grid();
                let from = grid.resolve(from.0, from.1)?;
                let to = grid.resolve(to.0, to.1)?;
                if !grid.are_adjacent(from, to) {
                    return Err(WorldError::NotAdjacent {
                        from: grid.coord(from)?,
                        to: grid.coord(to)?,
                    });
                }
                let cost = self.world.step_cost(from, to, capability)?.value();
                out.push(Response::Cost {
                    passable: cost.is_some(),
                    cost: cost.map(|c| c.to_num::<f64>()),
                });
            }
            Command::Hash => out.push(Response::StateHash {
                turn: self.world.turn(),
                hash: self.world.state_hash(),
            }),
            Command::Quit => out.push(Response::Bye),
        }
        Ok(())
    }

    /// Poll the move sequence once. Returns whether it completed.
    fn poll(&mut self, out: &mut Vec<Response>) -> bool {
        let poll = self.world.poll_moves(&self.clock);
        for event in self.clock.drain_events() {
            out.push(Response::UnitMoved {
                unit_id: event.unit.0,
                q: event.to_coord.q,
                r: event.to_coord.r,
                cost: event.cost.to_num::<f64>(),
            });
        }

        match poll {
            MovePoll::Complete(report) => {
                out.push(Response::MovesComplete {
                    steps: report.steps.len(),
                    refusals: report
                        .refusals
                        .iter()
                        .map(|r| RefusalState {
                            unit_id: r.unit.0,
                            reason: r.reason.to_string(),
                        })
                        .collect(),
                });
                if self.config.auto_state_output {
                    out.push(self.state());
                }
                true
            }
            MovePoll::Idle | MovePoll::Pending(_) => false,
        }
    }

    fn state(&self) -> Response {
        let grid = self.world.grid();
        let units = self
            .world
            .units()
            .map(|unit| {
                let at = grid.coord(unit.hex()).unwrap_or_default();
                UnitState {
                    id: unit.id().0,
                    name: unit.name().to_string(),
                    q: at.q,
                    r: at.r,
                    movement_remaining: unit.movement_remaining().to_num::<f64>(),
                    max_movement: unit.max_movement().to_num::<f64>(),
                    capability: unit.capability(),
                    path_len: unit.path().len(),
                }
            })
            .collect();

        Response::State {
            turn: self.world.turn(),
            columns: grid.columns(),
            rows: grid.rows(),
            moving: self.world.is_moving(),
            units,
            hash: self.world.state_hash(),
        }
    }

    /// Run the session loop until `quit` or end of input.
    ///
    /// Reads JSON commands from `input`, writes responses to `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write_response(&mut output, &Response::ready(self.world.turn()))?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match Command::from_json(line) {
                Ok(command) => command,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid command");
                    write_response(&mut output, &Response::error(format!("Invalid command: {e}"), None))?;
                    continue;
                }
            };
            tracing::debug!(cmd = command.name(), "Received command");

            let quit = matches!(command, Command::Quit);
            for response in self.handle(command) {
                write_response(&mut output, &response)?;
            }
            if quit {
                break;
            }
        }

        tracing::info!(turn = self.world.turn(), "Session finished");
        Ok(())
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()
}

/// Convert a protocol number to fixed point, refusing values it cannot hold.
fn to_fixed(value: f64) -> Result<Fixed> {
    Fixed::checked_from_num(value)
        .filter(|v| *v >= Fixed::ZERO)
        .ok_or_else(|| WorldError::ConfigParse(format!("movement {value} is out of range")))
}
