//! Main update function - handles state transitions (TEA pattern)

use crate::message::Message;
use crate::state::AppState;

use super::{execution, keys::handle_key, services, UpdateResult};

/// Process a message and update state
/// Returns optional follow-up message and/or action
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Quit => {
            state.request_quit();
            UpdateResult::none()
        }

        Message::Key(key) => {
            if let Some(msg) = handle_key(state, key) {
                UpdateResult::message(msg)
            } else {
                UpdateResult::none()
            }
        }

        Message::Tick => UpdateResult::none(),

        // ─────────────────────────────────────────────────────────
        // Bridge Messages
        // ─────────────────────────────────────────────────────────
        Message::ServiceInfoAdded(payload) => services::handle_info_added(state, payload),
        Message::ServiceInfoRemoved(entity) => services::handle_info_removed(state, &entity),
        Message::ServiceCommandAdded(record) => services::handle_command_added(state, record),
        Message::ServiceCommandRemoved(entity) => {
            services::handle_command_removed(state, &entity)
        }
        Message::Sequenced { seq, message } => services::handle_sequenced(state, seq, *message),
        Message::ValueUpdated {
            binding,
            entity,
            value,
        } => services::handle_value_updated(state, binding, &entity, value),

        // ─────────────────────────────────────────────────────────
        // Navigation
        // ─────────────────────────────────────────────────────────
        Message::SelectNextCommand => {
            state.select_next();
            UpdateResult::none()
        }
        Message::SelectPrevCommand => {
            state.select_prev();
            UpdateResult::none()
        }
        Message::ExecuteSelected => execution::handle_execute_selected(state),

        // ─────────────────────────────────────────────────────────
        // Execution Surface
        // ─────────────────────────────────────────────────────────
        Message::FocusNextArgument => execution::with_form(state, |form| form.focus_next()),
        Message::FocusPrevArgument => execution::with_form(state, |form| form.focus_prev()),
        Message::ArgumentInput(c) => execution::with_form(state, |form| {
            form.input_char(c);
        }),
        Message::ArgumentBackspace => execution::with_form(state, |form| form.backspace()),
        Message::ToggleArgumentEnabled => {
            execution::with_form(state, |form| form.toggle_enabled())
        }
        Message::SubmitArguments => execution::handle_submit(state),
        Message::CloseExecution => {
            state.hide_execution();
            UpdateResult::none()
        }
        Message::InvocationCompleted { surface, outcome } => {
            execution::handle_invocation_completed(state, surface, outcome)
        }
    }
}
