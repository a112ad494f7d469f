//! JSON protocol for headless world sessions.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Responses and move notifications
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","turn":1}`
//! 2. Controller spawns units and plans paths
//! 3. `move_all` starts a move sequence; every completed step is reported as
//!    `unit_moved`. The runner's simulated view animates each step for a few
//!    frames, so the controller sends `frame` until `moves_complete` arrives
//! 4. `end_turn` restores movement budgets
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","turn":1}
//! -> {"cmd":"spawn","name":"Scout","q":3,"r":4,"movement":2.0}
//! <- {"type":"spawned","unit_id":1,"q":3,"r":4}
//! -> {"cmd":"path","unit_id":1,"q":6,"r":4}
//! <- {"type":"ack","cmd":"path"}
//! -> {"cmd":"move_all"}
//! <- {"type":"unit_moved","unit_id":1,"q":4,"r":4,"cost":1.0}
//! <- {"type":"ack","cmd":"move_all"}
//! -> {"cmd":"frame","count":5}
//! <- {"type":"unit_moved","unit_id":1,"q":5,"r":4,"cost":1.0}
//! <- {"type":"moves_complete","steps":2,"refusals":[]}
//! -> {"cmd":"end_turn"}
//! <- {"type":"ack","cmd":"end_turn"}
//! ```

use hexworld_core::hex::HexCoord;
use hexworld_core::movement::MovementCapability;
use serde::{Deserialize, Serialize};

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Query current world state.
    Query,

    /// Spawn a unit at a logical address.
    Spawn {
        name: String,
        q: i32,
        r: i32,
        #[serde(default = "default_movement")]
        movement: f64,
        #[serde(default)]
        capability: MovementCapability,
    },

    /// Remove a unit.
    Despawn { unit_id: u64 },

    /// Plan a path for a unit to a logical address.
    Path { unit_id: u64, q: i32, r: i32 },

    /// Start moving every unit.
    MoveAll,

    /// Start moving one unit.
    MoveUnit { unit_id: u64 },

    /// Play animation frames, polling the move sequence after each.
    Frame {
        #[serde(default = "default_frame_count")]
        count: u32,
    },

    /// Restore movement budgets.
    EndTurn,

    /// List every cell within `range` of `(q, r)`.
    Range { q: i32, r: i32, range: u32 },

    /// Cost of a single step.
    Cost {
        from: (i32, i32),
        to: (i32, i32),
        #[serde(default)]
        capability: MovementCapability,
    },

    /// Report the state hash (for determinism verification).
    Hash,

    /// Quit the session.
    Quit,
}

fn default_movement() -> f64 {
    2.0
}

fn default_frame_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, turn: u64 },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Current world state.
    State {
        turn: u64,
        columns: u32,
        rows: u32,
        moving: bool,
        units: Vec<UnitState>,
        hash: u64,
    },

    /// Unit was spawned.
    Spawned { unit_id: u64, q: i32, r: i32 },

    /// A unit completed one step.
    UnitMoved {
        unit_id: u64,
        q: i32,
        r: i32,
        cost: f64,
    },

    /// The running move sequence finished.
    MovesComplete {
        steps: usize,
        refusals: Vec<RefusalState>,
    },

    /// Result of a range query.
    Range { center: HexCoord, cells: Vec<HexCoord> },

    /// Result of a cost query; `cost` is absent when impassable.
    Cost { passable: bool, cost: Option<f64> },

    /// State hash for determinism verification.
    StateHash { turn: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// State of a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    /// Unit id, starting at 1.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Current column.
    pub q: i32,
    /// Current row.
    pub r: i32,
    /// Points left this turn.
    pub movement_remaining: f64,
    /// Points restored at end of turn.
    pub max_movement: f64,
    /// Terrain the unit may enter.
    pub capability: MovementCapability,
    /// Steps still queued on the planned path.
    pub path_len: usize,
}

/// A refused unit and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefusalState {
    /// Unit that could not take its next step.
    pub unit_id: u64,
    /// Display form of the refusal error.
    pub reason: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// Protocol version reported in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

impl Response {
    /// Create a ready response.
    pub fn ready(turn: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            turn,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Spawn { .. } => "spawn",
            Self::Despawn { .. } => "despawn",
            Self::Path { .. } => "path",
            Self::MoveAll => "move_all",
            Self::MoveUnit { .. } => "move_unit",
            Self::Frame { .. } => "frame",
            Self::EndTurn => "end_turn",
            Self::Range { .. } => "range",
            Self::Cost { .. } => "cost",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spawn_command() {
        let json = r#"{"cmd":"spawn","name":"Scout","q":3,"r":-1}"#;
        let cmd = Command::from_json(json).unwrap();
        assert_eq!(
            cmd,
            Command::Spawn {
                name: "Scout".to_string(),
                q: 3,
                r: -1,
                movement: 2.0,
                capability: MovementCapability::Land,
            }
        );
    }

    #[test]
    fn test_parse_capability() {
        let json = r#"{"cmd":"spawn","name":"Boat","q":0,"r":0,"capability":"Naval"}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(
            cmd,
            Command::Spawn {
                capability: MovementCapability::Naval,
                ..
            }
        ));
    }

    #[test]
    fn test_default_frame_count() {
        let cmd = Command::from_json(r#"{"cmd":"frame"}"#).unwrap();
        assert_eq!(cmd, Command::Frame { count: 1 });
    }

    #[test]
    fn test_parse_cost_command() {
        let cmd = Command::from_json(r#"{"cmd":"cost","from":[1,2],"to":[2,2]}"#).unwrap();
        assert_eq!(cmd.name(), "cost");
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Command::from_json(r#"{"cmd":"tick"}"#).is_err());
    }

    #[test]
    fn test_serialize_responses() {
        let moved = Response::UnitMoved {
            unit_id: 1,
            q: 4,
            r: 4,
            cost: 1.0,
        };
        let json = moved.to_json_line();
        assert!(json.contains(r#""type":"unit_moved""#));
        assert!(json.ends_with('\n'));

        let range = Response::Range {
            center: HexCoord::new(1, 1),
            cells: vec![HexCoord::new(1, 1)],
        };
        assert!(range.to_json_line().contains(r#""center":{"q":1,"r":1}"#));

        let cost = Response::Cost {
            passable: false,
            cost: None,
        };
        assert!(cost.to_json_line().contains(r#""cost":null"#));
    }
}
