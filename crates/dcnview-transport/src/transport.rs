//! Transport abstraction consumed by the front end
//!
//! A transport delivers identity-only change notifications on its own
//! background context and answers bounded content lookups.

use std::sync::Arc;
use std::time::Duration;

use dcnview_core::prelude::*;
use dcnview_core::{
    ArgumentMap, CommandRecord, CommandResponse, EntityRef, Notification, SubscriptionPattern,
};

use crate::observer::InfoSource;

/// Callback invoked by the transport for every subscribed change.
///
/// May be called from any thread.
pub type NotificationHandler = Arc<dyn Fn(Notification) + Send + Sync>;

/// Publish/subscribe transport for d2dcn services
///
/// Entity components passed to lookups may be empty, meaning "any".
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Ask the transport to deliver command notifications matching `pattern`
    async fn subscribe_commands(&self, pattern: &SubscriptionPattern) -> Result<()>;

    /// Ask the transport to deliver info notifications matching `pattern`
    async fn subscribe_info(&self, pattern: &SubscriptionPattern) -> Result<()>;

    /// Install the single notification callback, replacing any previous one
    fn set_notification_handler(&self, handler: NotificationHandler);

    /// Fetch full command records, waiting up to `wait` for one to appear
    async fn get_available_commands(&self, entity: &EntityRef, wait: Duration)
        -> Vec<CommandRecord>;

    /// Fetch info sources, waiting up to `wait` for one to appear
    async fn get_available_info_readers(
        &self,
        entity: &EntityRef,
        wait: Duration,
    ) -> Vec<Arc<InfoSource>>;

    /// Invoke a remote command. Errors reported by the device come back in
    /// [`CommandResponse::error`]; `Err` means the call never completed.
    async fn call_command(&self, entity: &EntityRef, args: ArgumentMap)
        -> Result<CommandResponse>;
}
