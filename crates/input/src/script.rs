use std::collections::VecDeque;

use tilehop_common::{CameraMode, Direction};

use crate::event::{InputEvent, Modifier};

/// Something that delivers input to the game loop, one frame at a time.
pub trait InputSource {
    /// Events that arrived since the previous frame, in order.
    /// Returns `None` once the source has nothing more to deliver.
    fn poll_frame(&mut self) -> Option<Vec<InputEvent>>;
}

/// Errors from parsing a move script.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unknown token `{token}` at position {position}")]
    UnknownToken { token: String, position: usize },
}

/// Queue-backed input source for headless sessions and tests.
///
/// Each queued frame is delivered by one call to `poll_frame`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<Vec<InputEvent>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whitespace- or comma-separated move script, one frame per token:
    ///
    /// - `U` `D` `L` `R` step in a direction (press + release)
    /// - `^U` etc. jump: the release happens while Space is held
    /// - `.` an idle frame
    /// - `Q` quit
    /// - `@tower` `@top` `@player` `@follow` `@helicopter` switch camera
    ///
    /// Letters are case-insensitive.
    pub fn parse_moves(script: &str) -> Result<Self, ScriptError> {
        let mut input = Self::new();
        let tokens = script
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty());
        for (position, token) in tokens.enumerate() {
            let frame = parse_token(token).ok_or_else(|| ScriptError::UnknownToken {
                token: token.to_string(),
                position,
            })?;
            input.push_frame(frame);
        }
        tracing::debug!(frames = input.len(), "move script parsed");
        Ok(input)
    }

    pub fn push_frame(&mut self, events: Vec<InputEvent>) {
        self.frames.push_back(events);
    }

    /// Queue a single event as its own frame.
    pub fn push(&mut self, event: InputEvent) {
        self.push_frame(vec![event]);
    }

    /// Frames still waiting to be delivered.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll_frame(&mut self) -> Option<Vec<InputEvent>> {
        self.frames.pop_front()
    }
}

fn parse_token(token: &str) -> Option<Vec<InputEvent>> {
    if token == "." {
        return Some(Vec::new());
    }
    if let Some(mode) = token.strip_prefix('@') {
        return parse_camera(mode).map(|m| vec![InputEvent::CameraModeSelected(m)]);
    }
    if let Some(dir) = token.strip_prefix('^') {
        let dir = parse_direction(dir)?;
        return Some(vec![
            InputEvent::ModifierPressed(Modifier::Space),
            InputEvent::DirectionPressed(dir),
            InputEvent::DirectionReleased(dir),
            InputEvent::ModifierReleased(Modifier::Space),
        ]);
    }
    if token.eq_ignore_ascii_case("q") {
        return Some(vec![InputEvent::Quit]);
    }
    let dir = parse_direction(token)?;
    Some(vec![
        InputEvent::DirectionPressed(dir),
        InputEvent::DirectionReleased(dir),
    ])
}

fn parse_direction(token: &str) -> Option<Direction> {
    match token.to_ascii_uppercase().as_str() {
        "U" => Some(Direction::Up),
        "D" => Some(Direction::Down),
        "L" => Some(Direction::Left),
        "R" => Some(Direction::Right),
        _ => None,
    }
}

fn parse_camera(name: &str) -> Option<CameraMode> {
    CameraMode::ALL
        .into_iter()
        .find(|m| m.label().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_press_release_pairs() {
        let mut input = ScriptedInput::parse_moves("R u").unwrap();
        assert_eq!(input.len(), 2);
        assert_eq!(
            input.poll_frame().unwrap(),
            vec![
                InputEvent::DirectionPressed(Direction::Right),
                InputEvent::DirectionReleased(Direction::Right),
            ]
        );
        assert_eq!(
            input.poll_frame().unwrap()[1],
            InputEvent::DirectionReleased(Direction::Up)
        );
        assert!(input.poll_frame().is_none());
    }

    #[test]
    fn jump_release_happens_while_space_held() {
        let mut input = ScriptedInput::parse_moves("^L").unwrap();
        let frame = input.poll_frame().unwrap();
        let space_down = frame
            .iter()
            .position(|e| *e == InputEvent::ModifierPressed(Modifier::Space))
            .unwrap();
        let release = frame
            .iter()
            .position(|e| *e == InputEvent::DirectionReleased(Direction::Left))
            .unwrap();
        let space_up = frame
            .iter()
            .position(|e| *e == InputEvent::ModifierReleased(Modifier::Space))
            .unwrap();
        assert!(space_down < release && release < space_up);
    }

    #[test]
    fn idle_quit_and_camera_tokens() {
        let mut input = ScriptedInput::parse_moves(". @Helicopter, q").unwrap();
        assert_eq!(input.poll_frame().unwrap(), Vec::<InputEvent>::new());
        assert_eq!(
            input.poll_frame().unwrap(),
            vec![InputEvent::CameraModeSelected(CameraMode::Helicopter)]
        );
        assert_eq!(input.poll_frame().unwrap(), vec![InputEvent::Quit]);
    }

    #[test]
    fn unknown_token_reports_position() {
        let err = ScriptedInput::parse_moves("U U X").unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnknownToken {
                token: "X".into(),
                position: 2
            }
        );
        assert!(ScriptedInput::parse_moves("@sideways").is_err());
        assert!(ScriptedInput::parse_moves("^").is_err());
    }

    #[test]
    fn empty_script_is_empty() {
        let input = ScriptedInput::parse_moves("  , ").unwrap();
        assert!(input.is_empty());
    }
}
