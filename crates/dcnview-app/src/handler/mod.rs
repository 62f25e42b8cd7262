//! Handler module - TEA update function and event handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `services`: Bridge messages that change the service directory
//! - `execution`: Execution surface and argument form handlers
//! - `keys`: Key event handlers for UI modes

pub(crate) mod execution;
pub(crate) mod keys;
pub(crate) mod services;
pub(crate) mod update;


use crate::coordinator::Invocation;
use crate::message::Message;

// Re-export main entry point
pub use update::update;

#[cfg(test)]
pub(crate) use keys::handle_key;

/// Actions that the event loop should perform after update
#[derive(Debug)]
pub enum UpdateAction {
    /// Run a command invocation in the background
    SpawnInvocation(Invocation),
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}
