//! Message processing: runs the TEA update loop and dispatches actions

use std::sync::Arc;

use tokio::runtime::Handle;

use dcnview_transport::Transport;

use crate::actions::handle_action;
use crate::handler;
use crate::message::Message;
use crate::state::AppState;

/// Process a message and every follow-up it produces
pub fn process_message<T>(
    state: &mut AppState,
    message: Message,
    transport: &Arc<T>,
    runtime: &Handle,
) where
    T: Transport + Send + Sync + 'static,
{
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);

        if let Some(action) = result.action {
            handle_action(action, transport, state.ui().clone(), runtime);
        }

        msg = result.message;
    }
}
