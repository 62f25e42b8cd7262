//! Execution surface handlers

use dcnview_core::prelude::*;

use crate::coordinator::{Invocation, ResponseOutcome};
use crate::execution::{ArgumentForm, ExecutionPhase, ExecutionSurface, SurfaceId};
use crate::prompt::argument_prompt;
use crate::state::AppState;

use super::{UpdateAction, UpdateResult};

/// Open an execution surface for the selected command and start the invocation
pub fn handle_execute_selected(state: &mut AppState) -> UpdateResult {
    if state.execution.is_some() {
        return UpdateResult::none();
    }
    let Some(command) = state.selected_command().cloned() else {
        return UpdateResult::none();
    };
    if !command.enabled {
        state.status = Some(format!("{} is disabled on the device", command.entity.name));
        return UpdateResult::none();
    }
    state.status = None;

    let (surface, prompt) = if command.arguments.is_empty() {
        (ExecutionSurface::calling(command.clone()), None)
    } else {
        let (handle, waiter) = argument_prompt();
        (
            ExecutionSurface::with_prompt(command.clone(), handle),
            Some(waiter),
        )
    };
    let invocation = Invocation {
        surface: surface.id,
        command,
        prompt,
    };
    state.show_execution(surface);

    UpdateResult::action(UpdateAction::SpawnInvocation(invocation))
}

/// Apply `edit` to the argument form while arguments are being collected
pub fn with_form(state: &mut AppState, edit: impl FnOnce(&mut ArgumentForm)) -> UpdateResult {
    if let Some(surface) = state.execution.as_mut() {
        if surface.phase == ExecutionPhase::CollectingArguments {
            edit(&mut surface.form);
        }
    }
    UpdateResult::none()
}

pub fn handle_submit(state: &mut AppState) -> UpdateResult {
    if let Some(surface) = state.execution.as_mut() {
        if !surface.submit() {
            trace!("Argument form for {} not submitted", surface.title());
        }
    }
    UpdateResult::none()
}

/// Show a finished call on its surface, if that surface is still shown
pub fn handle_invocation_completed(
    state: &mut AppState,
    surface: SurfaceId,
    outcome: ResponseOutcome,
) -> UpdateResult {
    let Some(shown) = state.execution.as_mut().filter(|shown| shown.id == surface) else {
        debug!("Response for {} arrived after its surface was closed", surface);
        return UpdateResult::none();
    };

    match outcome {
        ResponseOutcome::Dismiss => {
            state.hide_execution();
        }
        ResponseOutcome::Error(text) => shown.phase = ExecutionPhase::Error(text),
        ResponseOutcome::Fields(lines) => shown.phase = ExecutionPhase::Response(lines),
    }
    UpdateResult::none()
}
