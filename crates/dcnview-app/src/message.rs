//! Message types for the application (TEA pattern)
//!
//! Everything that reaches the UI loop is one of these. Background contexts
//! only ever produce the bridge variants (`Service*`, `Sequenced`, `ValueUpdated`,
//! `InvocationCompleted`) and deliver them through [`crate::bridge::WeakUi`].

use std::sync::Arc;

use dcnview_core::{CommandRecord, EntityKind, EntityRef, Identifier, InfoRecord, Value};
use dcnview_transport::InfoSource;

use crate::binding::BindingId;
use crate::coordinator::ResponseOutcome;
use crate::execution::SurfaceId;
use crate::input_key::InputKey;

/// Content fetched for an added or updated info field
#[derive(Debug, Clone)]
pub struct InfoPayload {
    pub record: InfoRecord,
    pub source: Arc<InfoSource>,
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Keyboard event
    Key(InputKey),
    /// Periodic tick
    Tick,
    /// Request to quit
    Quit,

    // ─────────────────────────────────────────────────────────
    // Bridge Messages
    // ─────────────────────────────────────────────────────────
    ServiceInfoAdded(InfoPayload),
    ServiceInfoRemoved(EntityRef),
    ServiceCommandAdded(CommandRecord),
    ServiceCommandRemoved(EntityRef),
    /// A `Service*` message stamped with the arrival order of the notification
    /// that produced it. Older stamps for an identifier are dropped.
    Sequenced { seq: u64, message: Box<Message> },
    /// A bound info source published a new value
    ValueUpdated {
        binding: BindingId,
        entity: EntityRef,
        value: Value,
    },

    // ─────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────
    SelectNextCommand,
    SelectPrevCommand,
    ExecuteSelected,

    // ─────────────────────────────────────────────────────────
    // Execution Surface
    // ─────────────────────────────────────────────────────────
    FocusNextArgument,
    FocusPrevArgument,
    ArgumentInput(char),
    ArgumentBackspace,
    /// Ctrl+E on an optional argument
    ToggleArgumentEnabled,
    SubmitArguments,
    CloseExecution,
    /// Remote call finished for `surface`
    InvocationCompleted {
        surface: SurfaceId,
        outcome: ResponseOutcome,
    },
}

impl Message {
    pub fn sequenced(seq: u64, message: Message) -> Self {
        Message::Sequenced {
            seq,
            message: Box::new(message),
        }
    }

    /// Identifier a `Service*` message adds or removes
    pub fn directory_identifier(&self) -> Option<Identifier> {
        match self {
            Message::ServiceInfoAdded(payload) => {
                Some(payload.record.entity.identifier(EntityKind::Info))
            }
            Message::ServiceInfoRemoved(entity) => Some(entity.identifier(EntityKind::Info)),
            Message::ServiceCommandAdded(record) => Some(record.identifier()),
            Message::ServiceCommandRemoved(entity) => Some(entity.identifier(EntityKind::Command)),
            _ => None,
        }
    }
}
