//! In-process simulated d2dcn network
//!
//! Devices publish commands and info fields; the front end sees them through
//! the [`Transport`] trait exactly as it would a real broker. Notifications
//! are delivered on the publishing thread and only for identifiers matching a
//! subscription.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use dcnview_core::prelude::*;
use dcnview_core::{
    check_arguments, ArgumentMap, ChangeKind, CommandRecord, CommandResponse, EntityKind,
    EntityRef, Identifier, InfoRecord, Notification, SubscriptionFilter, SubscriptionPattern,
    Value,
};

use crate::observer::InfoSource;
use crate::transport::{NotificationHandler, Transport};

/// Device-side implementation of a command
pub type CommandHandler = Arc<dyn Fn(&ArgumentMap) -> CommandResponse + Send + Sync>;

struct SimCommand {
    record: CommandRecord,
    handler: CommandHandler,
}

#[derive(Default)]
struct NetworkState {
    commands: BTreeMap<Identifier, SimCommand>,
    info: BTreeMap<Identifier, Arc<InfoSource>>,
    subscriptions: SubscriptionFilter,
    lookup_delay: Duration,
    call_delay: Duration,
    subscribe_failures: usize,
}

impl NetworkState {
    /// Nothing is delivered for a kind until something subscribes to it
    fn is_subscribed(&self, kind: EntityKind, identifier: &Identifier) -> bool {
        !self.subscriptions.is_empty(kind) && self.subscriptions.accepts(identifier, kind)
    }

    fn take_subscribe_failure(&mut self) -> Result<()> {
        if self.subscribe_failures == 0 {
            return Ok(());
        }
        self.subscribe_failures -= 1;
        Err(Error::transport("subscription rejected"))
    }
}

struct Shared {
    state: Mutex<NetworkState>,
    handler: Mutex<Option<NotificationHandler>>,
    changed: Notify,
}

/// Cloneable handle to a simulated network
#[derive(Clone)]
pub struct SimulatedNetwork {
    shared: Arc<Shared>,
}

/// Non-owning handle, for command handlers that act on their own network
#[derive(Clone)]
pub struct WeakNetwork {
    shared: Weak<Shared>,
}

impl WeakNetwork {
    pub fn upgrade(&self) -> Option<SimulatedNetwork> {
        self.shared.upgrade().map(|shared| SimulatedNetwork { shared })
    }
}

/// A component is a wildcard when empty
fn entity_matches(query: &EntityRef, candidate: &EntityRef) -> bool {
    let component = |q: &str, c: &str| q.is_empty() || q == c;
    component(&query.mac, &candidate.mac)
        && component(&query.service, &candidate.service)
        && component(&query.category, &candidate.category)
        && component(&query.name, &candidate.name)
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(NetworkState::default()),
                handler: Mutex::new(None),
                changed: Notify::new(),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakNetwork {
        WeakNetwork {
            shared: Arc::downgrade(&self.shared),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, NetworkState>> {
        self.shared
            .state
            .lock()
            .map_err(|_| Error::transport("simulated network state poisoned"))
    }

    /// Extra latency applied before every content lookup
    pub fn set_lookup_delay(&self, delay: Duration) {
        if let Ok(mut state) = self.state() {
            state.lookup_delay = delay;
        }
    }

    /// Extra latency applied before every command call
    pub fn set_call_delay(&self, delay: Duration) {
        if let Ok(mut state) = self.state() {
            state.call_delay = delay;
        }
    }

    /// Reject the next `count` subscribe requests with a transport error
    pub fn fail_subscriptions(&self, count: usize) {
        if let Ok(mut state) = self.state() {
            state.subscribe_failures = count;
        }
    }

    /// Publish or replace a command. Returns false for a malformed record.
    pub fn add_command(&self, record: CommandRecord, handler: CommandHandler) -> bool {
        if let Err(e) = record.validate() {
            warn!("Rejecting simulated command: {}", e);
            return false;
        }
        let entity = record.entity.clone();
        let identifier = record.identifier();
        let change = {
            let Ok(mut state) = self.state() else {
                return false;
            };
            let previous = state
                .commands
                .insert(identifier, SimCommand { record, handler });
            if previous.is_some() {
                ChangeKind::Updated
            } else {
                ChangeKind::Added
            }
        };
        self.emit(Notification::new(EntityKind::Command, change, entity));
        true
    }

    /// Enable or disable a published command
    pub fn enable_command(&self, entity: &EntityRef, enabled: bool) -> bool {
        let identifier = entity.identifier(EntityKind::Command);
        {
            let Ok(mut state) = self.state() else {
                return false;
            };
            match state.commands.get_mut(&identifier) {
                Some(command) => command.record.enabled = enabled,
                None => return false,
            }
        }
        debug!("Simulated command {} enabled={}", identifier, enabled);
        self.emit(Notification::new(
            EntityKind::Command,
            ChangeKind::Updated,
            entity.clone(),
        ));
        true
    }

    pub fn remove_command(&self, entity: &EntityRef) -> bool {
        let identifier = entity.identifier(EntityKind::Command);
        let removed = self
            .state()
            .map(|mut state| state.commands.remove(&identifier).is_some())
            .unwrap_or(false);
        if removed {
            self.emit(Notification::new(
                EntityKind::Command,
                ChangeKind::Removed,
                entity.clone(),
            ));
        }
        removed
    }

    /// Publish an info value.
    ///
    /// The first publish creates the field and announces it; later ones
    /// update the value through the source's callbacks only.
    pub fn publish_info(&self, entity: &EntityRef, value: Value) -> Result<Arc<InfoSource>> {
        let record = InfoRecord::new(entity.clone(), value.clone());
        record.validate()?;
        let identifier = record.identifier();

        let existing = self.state()?.info.get(&identifier).cloned();
        if let Some(source) = existing {
            source.publish(value)?;
            return Ok(source);
        }

        let source = Arc::new(InfoSource::new(record));
        self.state()?.info.insert(identifier, source.clone());
        self.emit(Notification::new(
            EntityKind::Info,
            ChangeKind::Added,
            entity.clone(),
        ));
        Ok(source)
    }

    pub fn remove_info(&self, entity: &EntityRef) -> bool {
        let identifier = entity.identifier(EntityKind::Info);
        let removed = self
            .state()
            .map(|mut state| state.info.remove(&identifier).is_some())
            .unwrap_or(false);
        if removed {
            self.emit(Notification::new(
                EntityKind::Info,
                ChangeKind::Removed,
                entity.clone(),
            ));
        }
        removed
    }

    pub fn command_count(&self) -> usize {
        self.state().map(|state| state.commands.len()).unwrap_or(0)
    }

    pub fn info_count(&self) -> usize {
        self.state().map(|state| state.info.len()).unwrap_or(0)
    }

    /// Deliver a notification to the installed handler if subscribed.
    ///
    /// Runs on the caller's thread with no lock held.
    fn emit(&self, notification: Notification) {
        self.shared.changed.notify_waiters();

        let subscribed = self
            .state()
            .map(|state| state.is_subscribed(notification.kind, &notification.identifier()))
            .unwrap_or(false);
        if !subscribed {
            trace!("No subscription for {}", notification.identifier());
            return;
        }

        let handler = self
            .shared
            .handler
            .lock()
            .ok()
            .and_then(|handler| handler.clone());
        if let Some(handler) = handler {
            handler(notification);
        }
    }

    /// Poll `find` until it yields something or `wait` elapses
    async fn lookup<R, F>(&self, wait: Duration, find: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&NetworkState) -> Vec<R> + Send,
    {
        let delay = self.state().map(|s| s.lookup_delay).unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let deadline = Instant::now() + wait;
        loop {
            let notified = self.shared.changed.notified();
            let found = match self.shared.state.lock() {
                Ok(state) => find(&state),
                Err(_) => return Vec::new(),
            };
            if !found.is_empty() {
                return found;
            }

            let now = Instant::now();
            if now >= deadline {
                return found;
            }
            let _ = tokio::time::timeout(deadline - now, notified).await;
        }
    }
}

impl Default for SimulatedNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulatedNetwork {
    async fn subscribe_commands(&self, pattern: &SubscriptionPattern) -> Result<()> {
        let mut state = self.state()?;
        state.take_subscribe_failure()?;
        state.subscriptions.add_command_filter(pattern)?;
        info!("Transport subscribed to commands: {}", pattern);
        Ok(())
    }

    async fn subscribe_info(&self, pattern: &SubscriptionPattern) -> Result<()> {
        let mut state = self.state()?;
        state.take_subscribe_failure()?;
        state.subscriptions.add_info_filter(pattern)?;
        info!("Transport subscribed to info: {}", pattern);
        Ok(())
    }

    fn set_notification_handler(&self, handler: NotificationHandler) {
        if let Ok(mut slot) = self.shared.handler.lock() {
            *slot = Some(handler);
        }
    }

    async fn get_available_commands(
        &self,
        entity: &EntityRef,
        wait: Duration,
    ) -> Vec<CommandRecord> {
        self.lookup(wait, |state| {
            state
                .commands
                .iter()
                .filter(|(id, command)| {
                    entity_matches(entity, &command.record.entity)
                        && state.is_subscribed(EntityKind::Command, id)
                })
                .map(|(_, command)| command.record.clone())
                .collect()
        })
        .await
    }

    async fn get_available_info_readers(
        &self,
        entity: &EntityRef,
        wait: Duration,
    ) -> Vec<Arc<InfoSource>> {
        self.lookup(wait, |state| {
            state
                .info
                .iter()
                .filter(|(id, source)| {
                    source
                        .record()
                        .is_some_and(|record| entity_matches(entity, &record.entity))
                        && state.is_subscribed(EntityKind::Info, id)
                })
                .map(|(_, source)| source.clone())
                .collect()
        })
        .await
    }

    async fn call_command(&self, entity: &EntityRef, args: ArgumentMap) -> Result<CommandResponse> {
        let identifier = entity.identifier(EntityKind::Command);
        let (record, handler, delay) = {
            let state = self.state()?;
            let command = state
                .commands
                .get(&identifier)
                .ok_or_else(|| Error::unknown_entity(identifier.as_str()))?;
            (
                command.record.clone(),
                command.handler.clone(),
                state.call_delay,
            )
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if !record.enabled {
            return Ok(CommandResponse::error(
                Error::command_disabled(&record.entity.name).to_string(),
            ));
        }
        if let Err(e) = check_arguments(&record.arguments, &args) {
            return Ok(CommandResponse::error(e.to_string()));
        }

        debug!("Calling simulated command {}", identifier);
        Ok(handler(&args))
    }
}
