//! Bridge message handlers: keep the service directory in step with the network

use dcnview_core::prelude::*;
use dcnview_core::{CommandRecord, EntityKind, EntityRef, Value};

use crate::binding::{BindingId, FieldBinding};
use crate::directory::Upsert;
use crate::message::{InfoPayload, Message};
use crate::state::AppState;

use super::UpdateResult;

/// Forward a bridge message unless a later notification for the same
/// identifier has already been applied
pub fn handle_sequenced(state: &mut AppState, seq: u64, message: Message) -> UpdateResult {
    if let Some(identifier) = message.directory_identifier() {
        if !state.advance_sequence(identifier.clone(), seq) {
            debug!("Dropping out-of-order update #{} for {}", seq, identifier);
            return UpdateResult::none();
        }
    }
    UpdateResult::message(message)
}

/// Insert or refresh an info field and make sure it is bound to its source
pub fn handle_info_added(state: &mut AppState, payload: InfoPayload) -> UpdateResult {
    let InfoPayload { record, source } = payload;
    let entity = record.entity.clone();

    let binding = if state.directory.is_bound_to(&entity, &source) {
        None
    } else {
        Some(FieldBinding::bind(&source, entity.clone(), state.ui().clone()))
    };

    // The source may have published between the lookup and the bind
    let record = source
        .record()
        .filter(|current| {
            current.entity == record.entity && current.value_type == record.value_type
        })
        .unwrap_or(record);

    match state.directory.upsert_info(record, binding) {
        Upsert::Created => debug!("Info {} added", entity.identifier(EntityKind::Info)),
        Upsert::Updated => trace!("Info {} updated", entity.name),
    }
    UpdateResult::none()
}

pub fn handle_info_removed(state: &mut AppState, entity: &EntityRef) -> UpdateResult {
    if state.directory.remove_info(entity) {
        debug!("Info {} removed", entity.name);
    } else {
        trace!("Ignoring removal of unknown info {}", entity.name);
    }
    UpdateResult::none()
}

pub fn handle_command_added(state: &mut AppState, record: CommandRecord) -> UpdateResult {
    let identifier = record.identifier();
    match state.directory.upsert_command(record) {
        Upsert::Created => debug!("Command {} added", identifier),
        Upsert::Updated => trace!("Command {} updated", identifier),
    }
    state.ensure_selection();
    UpdateResult::none()
}

pub fn handle_command_removed(state: &mut AppState, entity: &EntityRef) -> UpdateResult {
    if state.directory.remove_command(entity) {
        debug!("Command {} removed", entity.name);
        state.ensure_selection();
    } else {
        trace!("Ignoring removal of unknown command {}", entity.name);
    }
    UpdateResult::none()
}

pub fn handle_value_updated(
    state: &mut AppState,
    binding: BindingId,
    entity: &EntityRef,
    value: Value,
) -> UpdateResult {
    state.directory.apply_value(entity, binding, value);
    UpdateResult::none()
}
