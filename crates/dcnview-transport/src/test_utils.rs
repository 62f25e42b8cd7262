//! Test utilities for transport types
//!
//! Provides helpers for building records and a network that already has
//! catch-all subscriptions in place.

use std::sync::Arc;

use dcnview_core::{
    ArgumentMap, CommandRecord, CommandResponse, EntityRef, Schema, SubscriptionPattern,
};

use crate::sim::{CommandHandler, SimulatedNetwork};
use crate::transport::Transport;

/// Creates an enabled command with empty schemas.
pub fn test_command(mac: &str, service: &str, category: &str, name: &str) -> CommandRecord {
    test_command_with(mac, service, category, name, Schema::new(), Schema::new())
}

/// Creates an enabled command with the given schemas.
pub fn test_command_with(
    mac: &str,
    service: &str,
    category: &str,
    name: &str,
    arguments: Schema,
    response: Schema,
) -> CommandRecord {
    CommandRecord {
        entity: EntityRef::new(mac, service, category, name),
        enabled: true,
        arguments,
        response,
    }
}

/// A handler that always answers with `response`.
pub fn respond_with(response: CommandResponse) -> CommandHandler {
    Arc::new(move |_: &ArgumentMap| response.clone())
}

/// A simulated network subscribed to every command and info field.
pub async fn subscribed_network() -> SimulatedNetwork {
    let network = SimulatedNetwork::new();
    let any = SubscriptionPattern::any();
    // subscribing to an empty pattern cannot fail
    let _ = network.subscribe_commands(&any).await;
    let _ = network.subscribe_info(&any).await;
    network
}
