//! Domain events emitted by the Engine for external consumers
//!
//! Events are broadcast after each message processing cycle via
//! `Engine::subscribe()`. The headless scenarios and any future remote front
//! end observe the directory through these instead of polling state.

use dcnview_core::{Identifier, ServiceKey};

use crate::execution::SurfaceId;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Directory
    // ─────────────────────────────────────────────────────────
    /// First service of a device appeared
    DeviceAdded { mac: String },

    /// Last service of a device went away
    DeviceRemoved { mac: String },

    ServiceAdded { key: ServiceKey },

    /// Info and command count reached zero
    ServiceRemoved { key: ServiceKey },

    /// Entity counts changed
    DirectoryChanged { info: usize, commands: usize },

    // ─────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────
    ExecutionOpened {
        surface: SurfaceId,
        command: Identifier,
    },

    /// The shown surface received its response or error
    ExecutionFinished { surface: SurfaceId },

    ExecutionClosed { surface: SurfaceId },

    // ─────────────────────────────────────────────────────────
    // Engine Lifecycle
    // ─────────────────────────────────────────────────────────
    Shutdown,
}

impl EngineEvent {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::DeviceAdded { .. } => "device_added",
            Self::DeviceRemoved { .. } => "device_removed",
            Self::ServiceAdded { .. } => "service_added",
            Self::ServiceRemoved { .. } => "service_removed",
            Self::DirectoryChanged { .. } => "directory_changed",
            Self::ExecutionOpened { .. } => "execution_opened",
            Self::ExecutionFinished { .. } => "execution_finished",
            Self::ExecutionClosed { .. } => "execution_closed",
            Self::Shutdown => "shutdown",
        }
    }
}
