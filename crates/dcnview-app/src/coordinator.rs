//! Command invocation coordinator
//!
//! Drives one user-triggered call: wait for arguments (if the command takes
//! any), call the transport, and turn the response into something the
//! execution surface can show. Runs as a background task and reports back
//! through the bridge with the originating [`SurfaceId`].

use std::fmt;
use std::sync::Arc;

use dcnview_core::prelude::*;
use dcnview_core::{check_arguments, ArgumentMap, CommandRecord, CommandResponse, Schema};
use dcnview_core::{Value, ValueType};
use dcnview_transport::Transport;

use crate::bridge::WeakUi;
use crate::execution::SurfaceId;
use crate::message::Message;
use crate::prompt::{PromptOutcome, PromptWaiter};

/// One rendered response field
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseLine {
    Field { name: String, value: Value },
    /// Present in the response but not declared in the schema
    InvalidField { name: String },
    /// Declared, but the value does not fit the declared type
    InvalidValue { name: String, expected: ValueType },
}

impl fmt::Display for ResponseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseLine::Field { name, value } => write!(f, "{name}: {value}"),
            ResponseLine::InvalidField { name } => write!(f, "invalid field {name}"),
            ResponseLine::InvalidValue { name, expected } => {
                write!(f, "invalid value for {name} (expected {expected})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// Empty, error-free response: close the surface
    Dismiss,
    /// Shown until the user dismisses it
    Error(String),
    Fields(Vec<ResponseLine>),
}

/// Interpret a call result against the command's response schema
pub fn render_response(schema: &Schema, result: Result<CommandResponse>) -> ResponseOutcome {
    let response = match result {
        Ok(response) => response,
        Err(e) => return ResponseOutcome::Error(e.to_string()),
    };
    if response.is_error() {
        return ResponseOutcome::Error(response.error);
    }
    if response.is_empty() {
        return ResponseOutcome::Dismiss;
    }

    let lines = response
        .fields
        .iter()
        .map(|(name, json)| match schema.get(name) {
            None => ResponseLine::InvalidField { name: name.clone() },
            Some(spec) => match Value::from_json(spec.value_type, json) {
                Some(value) => ResponseLine::Field {
                    name: name.clone(),
                    value,
                },
                None => ResponseLine::InvalidValue {
                    name: name.clone(),
                    expected: spec.value_type,
                },
            },
        })
        .collect();
    ResponseOutcome::Fields(lines)
}

/// Everything a background invocation needs
#[derive(Debug)]
pub struct Invocation {
    pub surface: SurfaceId,
    pub command: CommandRecord,
    /// Present when arguments must be collected first
    pub prompt: Option<PromptWaiter>,
}

/// Run one invocation to completion.
///
/// A cancelled prompt ends the invocation without calling. Once sent, a
/// call cannot be cancelled; its outcome is posted and the UI decides
/// whether the surface is still there to show it.
pub async fn run_invocation<T>(transport: Arc<T>, ui: WeakUi, invocation: Invocation)
where
    T: Transport + Send + Sync + 'static,
{
    let Invocation {
        surface,
        command,
        prompt,
    } = invocation;
    let identifier = command.identifier();

    let args = match prompt {
        Some(waiter) => match waiter.wait().await {
            PromptOutcome::Submitted(args) => args,
            PromptOutcome::Cancelled => {
                debug!("Invocation of {} cancelled before calling", identifier);
                return;
            }
        },
        None => ArgumentMap::new(),
    };

    let outcome = match check_arguments(&command.arguments, &args) {
        Err(e) => ResponseOutcome::Error(e.to_string()),
        Ok(()) => {
            info!("Calling {} with {} argument(s)", identifier, args.len());
            let result = transport.call_command(&command.entity, args).await;
            if let Err(e) = &result {
                warn!("Call to {} failed: {}", identifier, e);
            }
            render_response(&command.response, result)
        }
    };

    if !ui.post(Message::InvocationCompleted { surface, outcome }) {
        debug!("UI gone, dropping response for {}", identifier);
    }
}
