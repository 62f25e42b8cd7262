//! Terminal event polling

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dcnview_app::{InputKey, Message};
use dcnview_core::prelude::*;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Convert a crossterm key event to the engine's key type
pub fn key_event_to_input(key: KeyEvent) -> Option<InputKey> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let input = match key.code {
        KeyCode::Char(c) if ctrl => InputKey::CharCtrl(c),
        KeyCode::Char(c) => InputKey::Char(c),
        KeyCode::Enter => InputKey::Enter,
        KeyCode::Esc => InputKey::Esc,
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => InputKey::BackTab,
        KeyCode::Tab => InputKey::Tab,
        KeyCode::BackTab => InputKey::BackTab,
        KeyCode::Backspace => InputKey::Backspace,
        KeyCode::Up => InputKey::Up,
        KeyCode::Down => InputKey::Down,
        KeyCode::Left => InputKey::Left,
        KeyCode::Right => InputKey::Right,
        KeyCode::Home => InputKey::Home,
        KeyCode::End => InputKey::End,
        _ => return None,
    };
    Some(input)
}

/// Wait briefly for a terminal event.
///
/// Yields `Tick` when nothing arrived so the loop keeps redrawing live
/// values.
pub fn poll() -> Result<Option<Message>> {
    if !event::poll(POLL_INTERVAL)? {
        return Ok(Some(Message::Tick));
    }

    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            Ok(key_event_to_input(key).map(Message::Key))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Option<InputKey> {
        key_event_to_input(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_char_conversion() {
        assert_eq!(key(KeyCode::Char('j'), KeyModifiers::NONE), Some(InputKey::Char('j')));
        assert_eq!(
            key(KeyCode::Char('e'), KeyModifiers::CONTROL),
            Some(InputKey::CharCtrl('e'))
        );
    }

    #[test]
    fn test_shift_tab_is_backtab() {
        assert_eq!(key(KeyCode::Tab, KeyModifiers::SHIFT), Some(InputKey::BackTab));
        assert_eq!(key(KeyCode::BackTab, KeyModifiers::SHIFT), Some(InputKey::BackTab));
        assert_eq!(key(KeyCode::Tab, KeyModifiers::NONE), Some(InputKey::Tab));
    }

    #[test]
    fn test_action_keys() {
        assert_eq!(key(KeyCode::Enter, KeyModifiers::NONE), Some(InputKey::Enter));
        assert_eq!(key(KeyCode::Esc, KeyModifiers::NONE), Some(InputKey::Esc));
        assert_eq!(key(KeyCode::Backspace, KeyModifiers::NONE), Some(InputKey::Backspace));
    }

    #[test]
    fn test_unsupported_keys_are_ignored() {
        assert_eq!(key(KeyCode::F(5), KeyModifiers::NONE), None);
        assert_eq!(key(KeyCode::PageDown, KeyModifiers::NONE), None);
        assert_eq!(key(KeyCode::Delete, KeyModifiers::NONE), None);
    }
}
