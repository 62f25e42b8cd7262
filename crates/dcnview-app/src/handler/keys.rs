//! Key event handlers for different UI modes

use crate::input_key::InputKey;
use crate::message::Message;
use crate::state::{AppState, UiMode};

/// Convert key events to messages based on current UI mode
pub fn handle_key(state: &AppState, key: InputKey) -> Option<Message> {
    // Force quit with Ctrl+C from any mode
    if key == InputKey::CharCtrl('c') {
        return Some(Message::Quit);
    }

    match state.ui_mode() {
        UiMode::Browse => handle_key_browse(key),
        UiMode::ArgumentForm => handle_key_argument_form(key),
        UiMode::Calling | UiMode::Response => handle_key_response(key),
    }
}

fn handle_key_browse(key: InputKey) -> Option<Message> {
    match key {
        InputKey::Char('q') | InputKey::Esc => Some(Message::Quit),
        InputKey::Char('j') | InputKey::Down | InputKey::Tab => Some(Message::SelectNextCommand),
        InputKey::Char('k') | InputKey::Up | InputKey::BackTab => Some(Message::SelectPrevCommand),
        InputKey::Enter => Some(Message::ExecuteSelected),
        _ => None,
    }
}

fn handle_key_argument_form(key: InputKey) -> Option<Message> {
    match key {
        InputKey::Esc => Some(Message::CloseExecution),
        InputKey::Enter => Some(Message::SubmitArguments),
        InputKey::Tab | InputKey::Down => Some(Message::FocusNextArgument),
        InputKey::BackTab | InputKey::Up => Some(Message::FocusPrevArgument),
        InputKey::Backspace => Some(Message::ArgumentBackspace),
        InputKey::CharCtrl('e') => Some(Message::ToggleArgumentEnabled),
        InputKey::Char(c) => Some(Message::ArgumentInput(c)),
        _ => None,
    }
}

/// Waiting or showing a result: any dismiss key closes the surface
fn handle_key_response(key: InputKey) -> Option<Message> {
    match key {
        InputKey::Esc | InputKey::Enter | InputKey::Char('q') => Some(Message::CloseExecution),
        _ => None,
    }
}
