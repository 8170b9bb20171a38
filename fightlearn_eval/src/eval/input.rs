use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalInput {
    Quit,
    TogglePause,
    ResetEpisode,
}

impl EvalInput {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Some(EvalInput::Quit),
            KeyCode::Char('p') | KeyCode::Char(' ') => Some(EvalInput::TogglePause),
            KeyCode::Char('r') => Some(EvalInput::ResetEpisode),
            _ => None,
        }
    }
}

/// Polls the terminal for at most `timeout`.
pub fn handle_events(timeout: Duration) -> io::Result<Option<EvalInput>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(EvalInput::from_key(key.code));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(EvalInput::from_key(KeyCode::Esc), Some(EvalInput::Quit));
        assert_eq!(
            EvalInput::from_key(KeyCode::Char(' ')),
            Some(EvalInput::TogglePause)
        );
        assert_eq!(
            EvalInput::from_key(KeyCode::Char('r')),
            Some(EvalInput::ResetEpisode)
        );
        assert_eq!(EvalInput::from_key(KeyCode::Left), None);
    }
}
