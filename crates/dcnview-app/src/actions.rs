//! Action handlers: UpdateAction dispatch and background task spawning

use std::sync::Arc;

use tokio::runtime::Handle;

use dcnview_core::prelude::*;
use dcnview_transport::Transport;

use crate::bridge::WeakUi;
use crate::coordinator::run_invocation;
use crate::handler::UpdateAction;

/// Execute an action by spawning a background task
pub fn handle_action<T>(action: UpdateAction, transport: &Arc<T>, ui: WeakUi, runtime: &Handle)
where
    T: Transport + Send + Sync + 'static,
{
    match action {
        UpdateAction::SpawnInvocation(invocation) => {
            debug!(
                "Spawning invocation of {} for surface {}",
                invocation.command.entity.name, invocation.surface
            );
            runtime.spawn(run_invocation(transport.clone(), ui, invocation));
        }
    }
}
