use crate::game::Direction;
use crate::protocol::{Command, GridSizeField, MoveRequest, StartRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
    Command(Command),
    Pause,
    Resume,
    Quit,
    Invalid(String),
    None,
}

/// Turns one line of operator input into an action.
///
/// Lines starting with `{` are protocol commands; anything else is read as a
/// shorthand word, e.g. `w`, `left`, `start 15 hard`, `pause`.
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_line(&self, line: &str) -> LineAction {
        let line = line.trim();
        if line.is_empty() {
            return LineAction::None;
        }

        if line.starts_with('{') {
            return match Command::decode(line) {
                Ok(command) => LineAction::Command(command),
                Err(err) => LineAction::Invalid(err.to_string()),
            };
        }

        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return LineAction::None;
        };

        match word.to_ascii_lowercase().as_str() {
            // Movement - words
            "up" | "w" => Self::steer(Direction::Up),
            "down" | "s" => Self::steer(Direction::Down),
            "left" | "a" => Self::steer(Direction::Left),
            "right" | "d" => Self::steer(Direction::Right),

            "state" | "poll" | "p" => LineAction::Command(Command::State),
            "start" | "new" => LineAction::Command(Command::Start(Self::start_request(words))),

            // Controls
            "pause" => LineAction::Pause,
            "resume" | "continue" => LineAction::Resume,
            "quit" | "exit" | "q" => LineAction::Quit,

            other => LineAction::Invalid(format!("unknown command: {other}")),
        }
    }

    fn steer(direction: Direction) -> LineAction {
        LineAction::Command(Command::Move(MoveRequest::new(direction)))
    }

    /// `start [grid_size] [difficulty]`, in either order
    fn start_request<'a>(words: impl Iterator<Item = &'a str>) -> StartRequest {
        let mut request = StartRequest::default();
        for word in words {
            if word.chars().all(|c| c.is_ascii_digit() || c == '-') {
                request.grid_size = Some(GridSizeField::Text(word.to_string()));
            } else {
                request.difficulty = Some(word.into());
            }
        }
        request
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
