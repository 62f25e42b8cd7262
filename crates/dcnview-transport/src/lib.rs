//! # dcnview-transport - Transport Seam
//!
//! The publish/subscribe collaborator seen by the front end, plus an
//! in-process simulated network used for demos and tests.
//!
//! Depends on [`dcnview_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Transport
//! - [`Transport`] - Subscription, notification, lookup and call surface
//! - [`NotificationHandler`] - Callback receiving identity-only notifications
//!
//! ### Observers
//! - [`ObserverRegistry`] - Weak, non-owning observer list
//! - [`InfoSource`] - Remote info object with update callbacks
//!
//! ### Simulation
//! - [`SimulatedNetwork`] - In-process network implementing [`Transport`]
//! - [`spawn_demo_device()`] - Publish a demo device with live info fields

pub mod demo;
pub mod observer;
pub mod sim;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod transport;

pub use demo::{demo_schema, spawn_demo_device, DemoDevice, PUBLISH_INTERVAL};
pub use observer::{InfoSource, Observer, ObserverRegistry};
pub use sim::{CommandHandler, SimulatedNetwork, WeakNetwork};
pub use transport::{LocalTransport, NotificationHandler, Transport};
