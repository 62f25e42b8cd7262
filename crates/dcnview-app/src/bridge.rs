//! Cross-thread event bridge
//!
//! Transport callbacks run on background threads. They never touch UI state;
//! they resolve a [`WeakUi`] and enqueue a [`Message`] on the UI loop's
//! channel. If the UI is gone the message is dropped silently.
//!
//! Add and update notifications carry identity only, so the bridge performs a
//! bounded lookup against the transport before posting. The subscription
//! filter is applied first so rejected identifiers cost no round trip.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

use dcnview_core::prelude::*;
use dcnview_core::{ChangeKind, EntityKind, Notification, SubscriptionFilter};
use dcnview_transport::Transport;

use crate::message::{InfoPayload, Message};

/// Owning end of the UI loop's inbox. Dropping it invalidates every [`WeakUi`].
pub struct UiInbox {
    tx: mpsc::UnboundedSender<Message>,
}

pub type UiHandle = Arc<UiInbox>;

/// Create the UI inbox and the receiver drained by the UI loop
pub fn ui_channel() -> (UiHandle, mpsc::UnboundedReceiver<Message>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(UiInbox { tx }), rx)
}

/// Non-owning reference to the UI loop
#[derive(Clone, Default)]
pub struct WeakUi {
    inner: Weak<UiInbox>,
}

impl WeakUi {
    pub fn new(handle: &UiHandle) -> Self {
        Self {
            inner: Arc::downgrade(handle),
        }
    }

    /// A reference that never resolves
    pub fn detached() -> Self {
        Self::default()
    }

    /// Enqueue `message` if the UI still exists.
    ///
    /// Never blocks. Returns false when the target is gone.
    pub fn post(&self, message: Message) -> bool {
        match self.inner.upgrade() {
            Some(inbox) => inbox.tx.send(message).is_ok(),
            None => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl std::fmt::Debug for WeakUi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakUi")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Delivery counters, shared so they outlive the bridge
#[derive(Debug, Default)]
pub struct BridgeStats {
    posted: AtomicU64,
    stale: AtomicU64,
    filtered: AtomicU64,
    empty_lookups: AtomicU64,
    malformed: AtomicU64,
}

impl BridgeStats {
    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }

    /// Deliveries dropped because the UI was gone
    pub fn stale(&self) -> u64 {
        self.stale.load(Ordering::Relaxed)
    }

    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    pub fn empty_lookups(&self) -> u64 {
        self.empty_lookups.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }
}

pub struct EventBridge<T> {
    transport: Arc<T>,
    ui: WeakUi,
    filter: watch::Receiver<Arc<SubscriptionFilter>>,
    lookup_timeout: Duration,
    runtime: Handle,
    stats: Arc<BridgeStats>,
    /// Arrival order of accepted notifications
    sequence: AtomicU64,
}

impl<T> EventBridge<T>
where
    T: Transport + Send + Sync + 'static,
{
    pub fn new(
        transport: Arc<T>,
        ui: WeakUi,
        filter: watch::Receiver<Arc<SubscriptionFilter>>,
        lookup_timeout: Duration,
        runtime: Handle,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            ui,
            filter,
            lookup_timeout,
            runtime,
            stats: Arc::new(BridgeStats::default()),
            sequence: AtomicU64::new(0),
        })
    }

    /// Register with the transport. The transport only holds a weak reference.
    pub fn install(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.transport
            .set_notification_handler(Arc::new(move |notification: Notification| {
                match weak.upgrade() {
                    Some(bridge) => bridge.handle_notification(notification),
                    None => trace!("Bridge gone, dropping {}", notification.identifier()),
                }
            }));
    }

    pub fn stats(&self) -> Arc<BridgeStats> {
        self.stats.clone()
    }

    /// Entry point for transport callbacks. Safe to call from any thread.
    pub fn handle_notification(self: &Arc<Self>, notification: Notification) {
        let identifier = notification.identifier();
        if !self.filter.borrow().accepts(&identifier, notification.kind) {
            self.stats.filtered.fetch_add(1, Ordering::Relaxed);
            trace!("Filtered out {}", identifier);
            return;
        }
        if !self.ui.is_alive() {
            self.stats.stale.fetch_add(1, Ordering::Relaxed);
            debug!("UI gone, dropping {}", identifier);
            return;
        }

        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        match notification.change {
            ChangeKind::Removed => {
                let message = match notification.kind {
                    EntityKind::Info => Message::ServiceInfoRemoved(notification.entity),
                    EntityKind::Command => Message::ServiceCommandRemoved(notification.entity),
                };
                self.deliver(Message::sequenced(seq, message));
            }
            ChangeKind::Added | ChangeKind::Updated => {
                let bridge = self.clone();
                self.runtime.spawn(async move {
                    bridge.lookup_and_post(notification, seq).await;
                });
            }
        }
    }

    /// Fetch content for an add/update and post it in lookup order
    async fn lookup_and_post(&self, notification: Notification, seq: u64) {
        let messages = match notification.kind {
            EntityKind::Command => self
                .transport
                .get_available_commands(&notification.entity, self.lookup_timeout)
                .await
                .into_iter()
                .filter(|record| self.accept_valid(record.validate()))
                .map(Message::ServiceCommandAdded)
                .collect::<Vec<_>>(),
            EntityKind::Info => self
                .transport
                .get_available_info_readers(&notification.entity, self.lookup_timeout)
                .await
                .into_iter()
                .filter_map(|source| {
                    let record = source.record()?;
                    self.accept_valid(record.validate())
                        .then(|| Message::ServiceInfoAdded(InfoPayload { record, source }))
                })
                .collect::<Vec<_>>(),
        };

        if messages.is_empty() {
            self.stats.empty_lookups.fetch_add(1, Ordering::Relaxed);
            debug!("Lookup for {} returned nothing", notification.identifier());
            return;
        }

        for message in messages {
            self.deliver(Message::sequenced(seq, message));
        }
    }

    fn accept_valid(&self, validation: Result<()>) -> bool {
        match validation {
            Ok(()) => true,
            Err(e) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                warn!("Dropping malformed record: {}", e);
                false
            }
        }
    }

    fn deliver(&self, message: Message) -> bool {
        if self.ui.post(message) {
            self.stats.posted.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            self.stats.stale.fetch_add(1, Ordering::Relaxed);
            debug!("UI gone, dropped bridge message");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcnview_core::{EntityRef, SubscriptionPattern, Value};
    use dcnview_transport::test_utils::{respond_with, subscribed_network, test_command};
    use dcnview_transport::SimulatedNetwork;
    use dcnview_core::CommandResponse;

    /// Strip the arrival stamp added by the bridge
    fn unstamped(message: Message) -> Message {
        match message {
            Message::Sequenced { message, .. } => *message,
            other => other,
        }
    }

    fn bridge_for(
        network: &SimulatedNetwork,
        ui: &UiHandle,
        filter: SubscriptionFilter,
    ) -> Arc<EventBridge<SimulatedNetwork>> {
        let (_tx, rx) = watch::channel(Arc::new(filter));
        let bridge = EventBridge::new(
            Arc::new(network.clone()),
            WeakUi::new(ui),
            rx,
            Duration::from_millis(200),
            Handle::current(),
        );
        bridge.install();
        bridge
    }

    #[test]
    fn test_post_to_dropped_ui_is_silent() {
        let (handle, _rx) = ui_channel();
        let weak = WeakUi::new(&handle);
        assert!(weak.post(Message::Tick));

        drop(handle);
        assert!(!weak.is_alive());
        assert!(!weak.post(Message::Tick));
        assert!(!WeakUi::detached().post(Message::Tick));
    }

    #[tokio::test]
    async fn test_added_command_is_looked_up_and_posted() {
        let network = subscribed_network().await;
        let (ui, mut rx) = ui_channel();
        let bridge = bridge_for(&network, &ui, SubscriptionFilter::new());

        network.add_command(
            test_command("aa", "svc", "cat", "reboot"),
            respond_with(CommandResponse::empty()),
        );

        let message = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match unstamped(message) {
            Message::ServiceCommandAdded(record) => assert_eq!(record.entity.name, "reboot"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(bridge.stats().posted(), 1);
    }

    #[tokio::test]
    async fn test_removal_is_posted_without_lookup() {
        let network = subscribed_network().await;
        let (ui, mut rx) = ui_channel();
        let entity = EntityRef::new("aa", "svc", "cat", "level");
        network.publish_info(&entity, Value::Int(1)).unwrap();

        let _bridge = bridge_for(&network, &ui, SubscriptionFilter::new());
        network.remove_info(&entity);

        match rx.try_recv().map(unstamped) {
            Ok(Message::ServiceInfoRemoved(removed)) => assert_eq!(removed, entity),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_notifications_are_stamped_in_arrival_order() {
        let network = subscribed_network().await;
        let (ui, mut rx) = ui_channel();
        let entity = EntityRef::new("aa", "svc", "cat", "level");
        network.publish_info(&entity, Value::Int(1)).unwrap();

        let _bridge = bridge_for(&network, &ui, SubscriptionFilter::new());
        network.remove_info(&entity);
        network.publish_info(&entity, Value::Int(2)).unwrap();

        let first = rx.try_recv().unwrap();
        let second = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(first, Message::Sequenced { seq: 1, .. }));
        assert!(matches!(second, Message::Sequenced { seq: 2, .. }));
    }

    #[tokio::test]
    async fn test_filtered_notification_skips_lookup() {
        let network = subscribed_network().await;
        let (ui, mut rx) = ui_channel();
        let mut filter = SubscriptionFilter::new();
        filter
            .add_command_filter(&SubscriptionPattern::new("", "other", "", ""))
            .unwrap();
        let bridge = bridge_for(&network, &ui, filter);

        network.add_command(
            test_command("aa", "svc", "cat", "reboot"),
            respond_with(CommandResponse::empty()),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(bridge.stats().filtered(), 1);
        assert_eq!(bridge.stats().empty_lookups(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_lookup_after_ui_drop_delivers_nothing() {
        let network = subscribed_network().await;
        network.set_lookup_delay(Duration::from_millis(50));
        let (ui, rx) = ui_channel();
        let bridge = bridge_for(&network, &ui, SubscriptionFilter::new());
        let stats = bridge.stats();

        network.add_command(
            test_command("aa", "svc", "cat", "reboot"),
            respond_with(CommandResponse::empty()),
        );
        drop(ui);
        drop(rx);
        drop(bridge);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(stats.posted(), 0);
        assert_eq!(stats.stale(), 1);
    }
}
