//! dcnview-app - Application state and orchestration for dcnview
//!
//! This crate implements the TEA (The Elm Architecture) pattern for state
//! management, the cross-thread event bridge, the service directory with its
//! live field bindings, the command invocation coordinator, the Engine that
//! ties them together, and configuration loading.

pub mod actions;
pub mod binding;
pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod engine;
pub mod engine_event;
pub mod execution;
pub mod handler;
pub mod input_key;
pub mod message;
pub mod process;
pub mod prompt;
pub mod signals;
pub mod state;

// Re-export primary types
pub use bridge::{ui_channel, BridgeStats, EventBridge, UiHandle, WeakUi};
pub use config::{AppConfig, LayoutOrientation, Settings};
pub use coordinator::{render_response, Invocation, ResponseLine, ResponseOutcome};
pub use directory::{CategoryGroup, DeviceNode, InfoNode, ServiceDirectory, ServiceNode};
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use execution::{ArgumentField, ArgumentForm, ExecutionPhase, ExecutionSurface, SurfaceId};
pub use handler::{UpdateAction, UpdateResult};
pub use input_key::InputKey;
pub use message::Message;
pub use state::{AppPhase, AppState, UiMode};
