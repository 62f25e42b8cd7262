//! # dcnview-core - Core Domain Types
//!
//! Foundation crate for dcnview. Provides the identifier scheme, subscription
//! filter, typed values and schemas, structured records for remote commands
//! and info fields, change notifications, and error handling.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, regex, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Identifiers (`identifier`)
//! - [`Identifier`] - Opaque ordered key `<mac>/<service>/<kind>/<category>/<name>`
//! - [`make_identifier()`] - Pure identifier composition
//! - [`EntityRef`], [`ServiceKey`], [`EntityKind`]
//!
//! ### Filtering (`filter`)
//! - [`SubscriptionPattern`] - Per-component regex patterns
//! - [`SubscriptionFilter`] - Independent command/info allow-lists
//!
//! ### Values and Schemas (`value`, `schema`)
//! - [`Value`], [`ValueType`] - Typed scalars and homogeneous arrays
//! - [`Schema`], [`FieldSpec`], [`ArgumentMap`]
//!
//! ### Records and Events (`model`, `events`)
//! - [`InfoRecord`], [`CommandRecord`], [`CommandResponse`]
//! - [`Notification`], [`ChangeKind`]
//!
//! ## Prelude
//!
//! ```rust
//! use dcnview_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod filter;
pub mod identifier;
pub mod logging;
pub mod model;
pub mod schema;
pub mod value;

/// Prelude for common imports used throughout all dcnview crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use events::{ChangeKind, Notification};
pub use filter::{SubscriptionFilter, SubscriptionPattern};
pub use identifier::{
    is_valid_component, make_identifier, EntityKind, EntityRef, Identifier, ServiceKey, SEPARATOR,
};
pub use model::{CommandRecord, CommandResponse, InfoRecord};
pub use schema::{check_arguments, parse_schema, ArgumentMap, FieldSpec, Schema};
pub use value::{Value, ValueType};
