//! Engine - shared orchestration state for the TUI and headless runners
//!
//! The Engine owns the TEA state, the UI inbox, the event bridge and the
//! subscription filter. Dropping it drops the inbox, after which every
//! background post resolves to nothing.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, watch};

use dcnview_core::prelude::*;
use dcnview_core::{EntityKind, Identifier, ServiceKey, SubscriptionFilter, SubscriptionPattern};
use dcnview_transport::Transport;

use crate::bridge::{ui_channel, BridgeStats, EventBridge, UiHandle, WeakUi};
use crate::config::AppConfig;
use crate::engine_event::EngineEvent;
use crate::execution::{ExecutionPhase, SurfaceId};
use crate::message::Message;
use crate::process;
use crate::signals;
use crate::state::AppState;

/// Lightweight snapshot of state for change detection.
///
/// Captured before message processing, compared after to detect
/// what changed and emit appropriate EngineEvents.
#[derive(Debug, Clone, PartialEq)]
struct StateSnapshot {
    devices: BTreeSet<String>,
    services: BTreeSet<ServiceKey>,
    info_count: usize,
    command_count: usize,
    execution: Option<ExecutionSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
struct ExecutionSnapshot {
    surface: SurfaceId,
    command: Identifier,
    finished: bool,
}

impl StateSnapshot {
    fn capture(state: &AppState) -> Self {
        let directory = &state.directory;
        Self {
            devices: directory
                .devices()
                .map(|device| device.mac().to_string())
                .collect(),
            services: directory
                .devices()
                .flat_map(|device| device.services())
                .map(|service| service.key().clone())
                .collect(),
            info_count: directory.info_count(),
            command_count: directory.command_count(),
            execution: state.execution.as_ref().map(|surface| ExecutionSnapshot {
                surface: surface.id,
                command: surface.command.identifier(),
                finished: matches!(
                    surface.phase,
                    ExecutionPhase::Response(_) | ExecutionPhase::Error(_)
                ),
            }),
        }
    }
}

/// Orchestration engine for dcnview.
///
/// Generic over the transport so the same engine drives the simulated
/// network in tests and a real one in production.
pub struct Engine<T> {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Owning end of the UI inbox
    ui: UiHandle,

    /// Receiver half of the UI inbox, drained by the frontend event loop
    msg_rx: mpsc::UnboundedReceiver<Message>,

    transport: Arc<T>,

    /// Kept alive here; the transport only holds a weak reference
    bridge: Arc<EventBridge<T>>,

    /// Publishes filter snapshots to the bridge
    filter_tx: watch::Sender<Arc<SubscriptionFilter>>,

    runtime: Handle,

    /// Event broadcaster for external consumers
    event_tx: broadcast::Sender<EngineEvent>,
}

impl<T> Engine<T>
where
    T: Transport + Send + Sync + 'static,
{
    /// Create an engine on the current tokio runtime.
    ///
    /// Installs the event bridge on `transport` and spawns the signal
    /// handler. Nothing is subscribed yet.
    pub fn new(transport: Arc<T>, config: AppConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::config(format!("Engine requires a tokio runtime: {}", e)))?;

        let (ui, msg_rx) = ui_channel();
        let weak = WeakUi::new(&ui);

        let (filter_tx, filter_rx) = watch::channel(Arc::new(SubscriptionFilter::new()));
        let bridge = EventBridge::new(
            transport.clone(),
            weak.clone(),
            filter_rx,
            config.lookup_timeout,
            runtime.clone(),
        );
        bridge.install();

        signals::spawn_signal_handler(weak.clone());

        info!("Engine started (dcnview {})", config.version);
        let state = AppState::new(config, weak);
        let (event_tx, _) = broadcast::channel(256);

        Ok(Self {
            state,
            ui,
            msg_rx,
            transport,
            bridge,
            filter_tx,
            runtime,
            event_tx,
        })
    }

    // ─────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────

    /// Subscribe to commands matching `pattern`.
    ///
    /// Returns false if the same pattern was already subscribed.
    pub async fn subscribe_commands(&self, pattern: &SubscriptionPattern) -> Result<bool> {
        self.subscribe_kind(EntityKind::Command, pattern).await
    }

    /// Subscribe to info fields matching `pattern`.
    ///
    /// Returns false if the same pattern was already subscribed.
    pub async fn subscribe_info(&self, pattern: &SubscriptionPattern) -> Result<bool> {
        self.subscribe_kind(EntityKind::Info, pattern).await
    }

    async fn subscribe_kind(&self, kind: EntityKind, pattern: &SubscriptionPattern) -> Result<bool> {
        let mut added = Ok(false);
        // The filter must be in place before the transport starts announcing
        self.filter_tx.send_if_modified(|current| {
            let mut filter = SubscriptionFilter::clone(current);
            added = filter.add(kind, pattern);
            let changed = matches!(added, Ok(true));
            if changed {
                *current = Arc::new(filter);
            }
            changed
        });
        if !added? {
            debug!("Already subscribed to {} {}", kind, pattern);
            return Ok(false);
        }

        let subscribed = match kind {
            EntityKind::Command => self.transport.subscribe_commands(pattern).await,
            EntityKind::Info => self.transport.subscribe_info(pattern).await,
        };
        if let Err(e) = subscribed {
            warn!("Subscription to {} {} failed: {}", kind, pattern, e);
            self.filter_tx.send_modify(|current| {
                let mut filter = SubscriptionFilter::clone(current);
                filter.withdraw(kind, pattern);
                *current = Arc::new(filter);
            });
            return Err(e);
        }
        info!("Subscribed to {} {}", kind, pattern);
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────
    // Message Loop
    // ─────────────────────────────────────────────────────────

    /// Process a single message through the TEA update cycle.
    ///
    /// Hidden execution surfaces are torn down once the cycle completes.
    pub fn process_message(&mut self, msg: Message) {
        let pre = StateSnapshot::capture(&self.state);

        process::process_message(&mut self.state, msg, &self.transport, &self.runtime);
        self.state.reap_deferred();

        let post = StateSnapshot::capture(&self.state);
        if pre != post {
            self.emit_events(&pre, &post);
        }
    }

    /// Drain and process all pending messages from the inbox.
    ///
    /// Returns the number of messages processed. Used by the TUI runner
    /// which needs to drain all pending messages before rendering.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Process messages as they arrive until `done` holds or `timeout` passes.
    ///
    /// Returns whether `done` held at the end.
    pub async fn run_until(
        &mut self,
        timeout: Duration,
        mut done: impl FnMut(&AppState) -> bool,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if done(&self.state) {
                return true;
            }
            match tokio::time::timeout_at(deadline, self.msg_rx.recv()).await {
                Ok(Some(msg)) => self.process_message(msg),
                Ok(None) | Err(_) => return done(&self.state),
            }
        }
    }

    /// Enqueue a message as if it came from a background context
    pub fn post(&self, msg: Message) -> bool {
        self.ui().post(msg)
    }

    /// Non-owning reference to this engine's inbox
    pub fn ui(&self) -> WeakUi {
        WeakUi::new(&self.ui)
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    pub fn bridge_stats(&self) -> Arc<BridgeStats> {
        self.bridge.stats()
    }

    /// Subscribe to engine events.
    ///
    /// If the subscriber falls behind, older events are dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Close any open surface and notify subscribers
    pub fn shutdown(&mut self) {
        self.emit(EngineEvent::Shutdown);
        self.state.hide_execution();
        self.state.reap_deferred();
        info!("Engine shut down");
    }

    // ─────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────

    fn emit_events(&self, pre: &StateSnapshot, post: &StateSnapshot) {
        for mac in post.devices.difference(&pre.devices) {
            self.emit(EngineEvent::DeviceAdded { mac: mac.clone() });
        }
        for key in post.services.difference(&pre.services) {
            self.emit(EngineEvent::ServiceAdded { key: key.clone() });
        }
        for key in pre.services.difference(&post.services) {
            self.emit(EngineEvent::ServiceRemoved { key: key.clone() });
        }
        for mac in pre.devices.difference(&post.devices) {
            self.emit(EngineEvent::DeviceRemoved { mac: mac.clone() });
        }
        if pre.info_count != post.info_count || pre.command_count != post.command_count {
            self.emit(EngineEvent::DirectoryChanged {
                info: post.info_count,
                commands: post.command_count,
            });
        }

        let before = pre.execution.as_ref();
        let after = post.execution.as_ref();
        let same_surface = before.map(|e| e.surface) == after.map(|e| e.surface);
        if !same_surface {
            if let Some(closed) = before {
                self.emit(EngineEvent::ExecutionClosed {
                    surface: closed.surface,
                });
            }
            if let Some(opened) = after {
                self.emit(EngineEvent::ExecutionOpened {
                    surface: opened.surface,
                    command: opened.command.clone(),
                });
            }
        }
        if let Some(shown) = after {
            let was_finished = same_surface && before.is_some_and(|e| e.finished);
            if shown.finished && !was_finished {
                self.emit(EngineEvent::ExecutionFinished {
                    surface: shown.surface,
                });
            }
        }
    }

    /// send() fails only when nobody is subscribed, which is fine
    fn emit(&self, event: EngineEvent) {
        trace!("Engine event: {}", event.event_type());
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcnview_core::{CommandResponse, EntityRef, Value};
    use dcnview_transport::test_utils::{respond_with, test_command};
    use dcnview_transport::SimulatedNetwork;

    const WAIT: Duration = Duration::from_secs(2);

    fn engine(network: &SimulatedNetwork) -> Engine<SimulatedNetwork> {
        Engine::new(Arc::new(network.clone()), AppConfig::default()).unwrap()
    }

    #[test]
    fn test_engine_requires_runtime() {
        let result = Engine::new(Arc::new(SimulatedNetwork::new()), AppConfig::default());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_subscription_is_reported() {
        let network = SimulatedNetwork::new();
        let engine = engine(&network);
        let pattern = SubscriptionPattern::new("aa", "", "", "");

        assert!(engine.subscribe_commands(&pattern).await.unwrap());
        assert!(!engine.subscribe_commands(&pattern).await.unwrap());
        // the same pattern for the other kind is a separate subscription
        assert!(engine.subscribe_info(&pattern).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_subscription_can_be_retried() {
        let network = SimulatedNetwork::new();
        let mut engine = engine(&network);
        let pattern = SubscriptionPattern::new("aa", "", "", "");
        network.fail_subscriptions(1);

        assert!(engine.subscribe_commands(&pattern).await.is_err());
        assert!(engine.filter_tx.borrow().is_empty(EntityKind::Command));

        // the retry reaches the transport again
        assert!(engine.subscribe_commands(&pattern).await.unwrap());
        assert_eq!(engine.filter_tx.borrow().len(EntityKind::Command), 1);

        network.add_command(
            test_command("aa", "svc", "cat", "go"),
            respond_with(CommandResponse::empty()),
        );
        assert!(
            engine
                .run_until(WAIT, |state| state.directory.command_count() == 1)
                .await
        );
    }

    #[tokio::test]
    async fn test_unsubscribed_entities_never_arrive() {
        let network = SimulatedNetwork::new();
        let mut engine = engine(&network);
        engine
            .subscribe_commands(&SubscriptionPattern::new("aa", "", "", ""))
            .await
            .unwrap();

        network.add_command(
            test_command("bb", "svc", "cat", "other"),
            respond_with(CommandResponse::empty()),
        );
        network.add_command(
            test_command("aa", "svc", "cat", "mine"),
            respond_with(CommandResponse::empty()),
        );

        assert!(
            engine
                .run_until(WAIT, |state| state.directory.command_count() == 1)
                .await
        );
        assert!(engine.state.directory.device("bb").is_none());
    }

    #[tokio::test]
    async fn test_events_track_service_lifecycle() {
        let network = SimulatedNetwork::new();
        let mut engine = engine(&network);
        let mut events = engine.subscribe();
        engine.subscribe_info(&SubscriptionPattern::any()).await.unwrap();

        let entity = EntityRef::new("aa", "svc", "cat", "level");
        network.publish_info(&entity, Value::Int(1)).unwrap();
        assert!(
            engine
                .run_until(WAIT, |state| state.directory.info_count() == 1)
                .await
        );

        network.remove_info(&entity);
        assert!(
            engine
                .run_until(WAIT, |state| state.directory.is_empty())
                .await
        );

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event.event_type());
        }
        assert_eq!(
            seen,
            [
                "device_added",
                "service_added",
                "directory_changed",
                "service_removed",
                "device_removed",
                "directory_changed",
            ]
        );
    }

    #[tokio::test]
    async fn test_dropping_engine_invalidates_ui() {
        let network = SimulatedNetwork::new();
        let engine = engine(&network);
        let ui = engine.ui();
        assert!(ui.is_alive());

        drop(engine);
        assert!(!ui.is_alive());
        assert!(!ui.post(Message::Tick));
    }
}
