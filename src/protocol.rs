//! Command and reply messages exchanged with a game client

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game::{Difficulty, Direction, EndReason, GameConfig, GameState, Position};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty command")]
    Empty,
    #[error("malformed command: {0}")]
    Json(#[from] serde_json::Error),
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Begin a new session, replacing the current one
    Start(StartRequest),
    /// Change direction; acknowledged without state
    Move(MoveRequest),
    /// Fetch the current state
    State,
}

impl Command {
    /// Parse a client command from one JSON line
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }
        Ok(serde_json::from_str(line)?)
    }
}

/// Grid size as sent by clients: a number, or a numeric string from a form field.
///
/// Anything else still decodes, and resolves to no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridSizeField {
    Number(i64),
    Text(String),
    Other(Value),
}

impl GridSizeField {
    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<GridSizeField>,
    /// Kept raw so a non-string level falls back to the default instead of failing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Value>,
}

impl StartRequest {
    pub fn new(config: GameConfig) -> Self {
        Self {
            grid_size: Some(GridSizeField::Number(config.grid_size as i64)),
            difficulty: Some(Value::from(config.difficulty.as_str())),
        }
    }

    /// Resolve the requested settings; anything missing or invalid is defaulted
    pub fn config(&self, fallback: GameConfig) -> GameConfig {
        GameConfig::from_request(
            self.grid_size.as_ref().and_then(GridSizeField::value),
            self.difficulty.as_ref().map(|level| level.as_str().unwrap_or_default()),
            fallback,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Kept raw: a value that names no direction is ignored, not rejected
    #[serde(default)]
    pub direction: Option<Value>,
}

impl MoveRequest {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction: Some(Value::from(direction.as_str())),
        }
    }

    /// The requested direction, if it names one
    pub fn direction(&self) -> Option<Direction> {
        self.direction.as_ref()?.as_str()?.parse().ok()
    }
}

/// Outcome label carried by acknowledgements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "game over")]
    GameOver,
    #[serde(rename = "no session")]
    NoSession,
    #[serde(rename = "paused")]
    Paused,
    #[serde(rename = "counting down")]
    CountingDown,
    #[serde(rename = "error")]
    Error,
}

/// Serialized view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Segments from head to tail
    pub snake: Vec<Position>,
    pub food: Option<Position>,
    pub direction: Direction,
    pub score: u32,
    pub game_over: bool,
    pub grid_size: usize,
    pub difficulty: Difficulty,
    pub tick_interval_ms: u64,
    pub ticks: u64,
    pub end_reason: Option<EndReason>,
}

impl Snapshot {
    pub fn head(&self) -> Option<Position> {
        self.snake.first().copied()
    }
}

impl From<&GameState> for Snapshot {
    fn from(state: &GameState) -> Self {
        Self {
            snake: state.snake.body.iter().copied().collect(),
            food: state.food,
            direction: state.direction(),
            score: state.score,
            game_over: state.game_over,
            grid_size: state.grid_size(),
            difficulty: state.config.difficulty,
            tick_interval_ms: state.tick_interval_ms,
            ticks: state.ticks,
            end_reason: state.end_reason,
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Started {
        status: Status,
        initial_state: Snapshot,
    },
    State(Snapshot),
    Ack {
        status: Status,
    },
    Error {
        status: Status,
        message: String,
    },
}

impl Reply {
    pub fn started(state: &GameState) -> Self {
        Reply::Started {
            status: Status::Ok,
            initial_state: Snapshot::from(state),
        }
    }

    pub fn ack(status: Status) -> Self {
        Reply::Ack { status }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error {
            status: Status::Error,
            message: message.into(),
        }
    }

    /// Serialize message to JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameEngine, Snake};
    use serde_json::{json, Value};

    #[test]
    fn test_decode_start() {
        let command = Command::decode(r#"{"command":"start","grid_size":10,"difficulty":"hard"}"#).unwrap();
        let Command::Start(request) = command else {
            panic!("expected start, got {command:?}");
        };
        assert_eq!(
            request.config(GameConfig::default()),
            GameConfig::new(10, Difficulty::Hard)
        );
    }

    #[test]
    fn test_decode_start_with_string_grid_size() {
        let command = Command::decode(r#"{"command":"start","grid_size":"30","difficulty":"easy"}"#).unwrap();
        let Command::Start(request) = command else {
            panic!("expected start, got {command:?}");
        };
        assert_eq!(
            request.config(GameConfig::default()),
            GameConfig::new(30, Difficulty::Easy)
        );
    }

    #[test]
    fn test_decode_start_with_garbage_settings() {
        let command = Command::decode(r#"{"command":"start","grid_size":"big","difficulty":"insane"}"#).unwrap();
        let Command::Start(request) = command else {
            panic!("expected start, got {command:?}");
        };
        assert_eq!(
            request.config(GameConfig::default()),
            GameConfig::new(20, Difficulty::Medium)
        );
    }

    #[test]
    fn test_wrongly_typed_settings_fall_back() {
        let fallback = GameConfig::new(12, Difficulty::Easy);
        let cases = [
            (r#"{"command":"start","grid_size":10.5,"difficulty":"hard"}"#, GameConfig::new(12, Difficulty::Hard)),
            (r#"{"command":"start","grid_size":[10],"difficulty":3}"#, GameConfig::new(12, Difficulty::Medium)),
            (r#"{"command":"start","grid_size":null,"difficulty":null}"#, fallback),
        ];

        for (line, expected) in cases {
            let Command::Start(request) = Command::decode(line).unwrap() else {
                panic!("expected start for {line}");
            };
            assert_eq!(request.config(fallback), expected, "{line}");
        }
    }

    #[test]
    fn test_wrongly_typed_direction_decodes() {
        for line in [
            r#"{"command":"move","direction":5}"#,
            r#"{"command":"move","direction":{"x":1}}"#,
            r#"{"command":"move"}"#,
        ] {
            let Command::Move(request) = Command::decode(line).unwrap() else {
                panic!("expected move for {line}");
            };
            assert_eq!(request.direction(), None, "{line}");
        }
    }

    #[test]
    fn test_decode_move_and_state() {
        let command = Command::decode(r#"{"command":"move","direction":"up"}"#).unwrap();
        assert_eq!(command, Command::Move(MoveRequest::new(Direction::Up)));

        let command = Command::decode(r#"{"command":"move","direction":"sideways"}"#).unwrap();
        let Command::Move(request) = command else {
            panic!("expected move");
        };
        assert_eq!(request.direction(), None);

        let command = Command::decode(r#" {"command":"state"} "#).unwrap();
        assert_eq!(command, Command::State);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(Command::decode("   "), Err(ProtocolError::Empty)));
        assert!(matches!(Command::decode("{not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(
            Command::decode(r#"{"command":"teleport"}"#),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_ack_json() {
        assert_eq!(Reply::ack(Status::Ok).to_json().unwrap(), r#"{"status":"ok"}"#);
        assert_eq!(
            Reply::ack(Status::GameOver).to_json().unwrap(),
            r#"{"status":"game over"}"#
        );
    }

    #[test]
    fn test_started_json_shape() {
        let mut engine = GameEngine::with_seed(9);
        let state = engine.start(GameConfig::new(10, Difficulty::Hard));
        let value: Value = serde_json::from_str(&Reply::started(state).to_json().unwrap()).unwrap();

        assert_eq!(value["status"], "ok");
        let initial = &value["initial_state"];
        assert_eq!(initial["snake"], json!([{"x": 5, "y": 5}]));
        assert_eq!(initial["score"], 0);
        assert_eq!(initial["game_over"], false);
        assert_eq!(initial["grid_size"], 10);
        assert_eq!(initial["tick_interval_ms"], 100);
        assert_eq!(initial["direction"], "right");
        assert_eq!(initial["difficulty"], "hard");
        assert!(initial["food"]["x"].is_i64());
        assert!(initial["end_reason"].is_null());
    }

    #[test]
    fn test_snapshot_lists_head_first() {
        let snake = Snake::new(Position::new(4, 2), Direction::Down, 3);
        let state = GameState::new(GameConfig::small(), snake, None);
        let snapshot = Snapshot::from(&state);

        assert_eq!(snapshot.head(), Some(Position::new(4, 2)));
        assert_eq!(
            snapshot.snake,
            vec![Position::new(4, 2), Position::new(4, 1), Position::new(4, 0)]
        );
        assert_eq!(snapshot.food, None);

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
