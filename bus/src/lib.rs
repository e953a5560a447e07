mod subscription;

pub use subscription::Subscription;

use std::{
    collections::{BTreeMap, HashSet},
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use dashlink_core::{EventEnvelope, EventType};
use dashlink_transport::EventChannel;
use tokio::task::JoinHandle;

pub type Handler = Arc<dyn Fn(&EventEnvelope) + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

struct Entry {
    event_types: HashSet<EventType>,
    handler: Handler,
}

impl Entry {
    fn matches(&self, event_type: &EventType) -> bool {
        self.event_types.is_empty() || self.event_types.contains(event_type)
    }
}

/// Fans one hub event channel out across many independent widget
/// subscriptions.
///
/// Handlers for the same event run in registration order, and a handler
/// fault never prevents delivery to the handlers after it. Subscriptions
/// are not released automatically; whoever subscribes must unsubscribe on
/// teardown (or hold the scoped guard), otherwise the handler leaks
/// silently.
#[derive(Clone)]
pub struct EventBus(Arc<BusInner>);

struct BusInner {
    entries: Mutex<BTreeMap<SubscriptionId, Arc<Entry>>>,
    counter: AtomicU64,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self(Arc::new(BusInner {
            entries: Mutex::new(BTreeMap::new()),
            counter: AtomicU64::new(1),
            pump: Mutex::new(None),
        }))
    }

    /// Register `handler` for the given event types.
    ///
    /// An empty set means the handler receives every event. This is a
    /// deliberate catch-all default, surprising as it may look.
    pub fn subscribe<H>(
        &self,
        handler: H,
        event_types: impl IntoIterator<Item = EventType>,
    ) -> SubscriptionId
    where
        H: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.0.counter.fetch_add(1, Ordering::SeqCst));
        let entry = Entry {
            event_types: event_types.into_iter().collect(),
            handler: Arc::new(handler),
        };

        self.0.entries.lock().unwrap().insert(id, Arc::new(entry));
        id
    }

    /// Register a handler for every event type.
    pub fn subscribe_all<H>(&self, handler: H) -> SubscriptionId
    where
        H: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        self.subscribe(handler, [])
    }

    /// Scoped variant: the registration lives exactly as long as the
    /// returned guard.
    pub fn subscribe_scoped<H>(
        &self,
        handler: H,
        event_types: impl IntoIterator<Item = EventType>,
    ) -> Subscription
    where
        H: Fn(&EventEnvelope) + Send + Sync + 'static,
    {
        Subscription::new(self.clone(), self.subscribe(handler, event_types))
    }

    /// Remove one subscription. Removal takes effect before the next
    /// `dispatch` call; calling twice is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.0.entries.lock().unwrap().remove(&id).is_none() {
            tracing::warn!("unsubscribe of unknown subscription {id:?}");
        }
    }

    /// Deliver one envelope to every live matching subscription, in
    /// registration order.
    ///
    /// The subscriber list is snapshotted up front, so a handler may
    /// subscribe or unsubscribe others without corrupting the in-progress
    /// loop: additions join from the next dispatch, and removals are
    /// honored within this one.
    pub fn dispatch(&self, envelope: &EventEnvelope) {
        let snapshot: Vec<(SubscriptionId, Handler)> = {
            let entries = self.0.entries.lock().unwrap();
            entries
                .iter()
                .filter(|(_, entry)| entry.matches(&envelope.event_type))
                .map(|(id, entry)| (*id, entry.handler.clone()))
                .collect()
        };

        for (id, handler) in snapshot {
            if !self.0.entries.lock().unwrap().contains_key(&id) {
                continue;
            }

            if panic::catch_unwind(AssertUnwindSafe(|| handler(envelope))).is_err() {
                tracing::error!(
                    "handler for '{}' panicked, continuing with remaining handlers",
                    envelope.event_type
                );
            }
        }
    }

    /// Pump every frame the channel yields through `dispatch`, in arrival
    /// order. Attaching a new channel replaces the previous pump.
    pub fn attach(&self, channel: EventChannel) {
        let bus = self.clone();
        let handle = tokio::spawn(async move {
            while let Ok(envelope) = channel.recv().await {
                bus.dispatch(&envelope);
            }
            tracing::info!("event channel closed, pump finished");
        });

        if let Some(previous) = self.0.pump.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.0.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BusInner {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.lock().unwrap().take() {
            pump.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(event_type: &str) -> EventEnvelope {
        serde_json::from_value(json!({"type": event_type, "args": {}})).unwrap()
    }

    fn recorder(
        log: Arc<Mutex<Vec<&'static str>>>,
        tag: &'static str,
    ) -> impl Fn(&EventEnvelope) + Send + Sync + 'static {
        move |_: &EventEnvelope| log.lock().unwrap().push(tag)
    }

    #[test]
    fn test_dispatch_order_and_catch_all() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(
            recorder(log.clone(), "typed"),
            [EventType::from("music.MusicPlayEvent")],
        );
        bus.subscribe_all(recorder(log.clone(), "all"));

        bus.dispatch(&envelope("music.MusicPlayEvent"));

        assert_eq!(*log.lock().unwrap(), vec!["typed", "all"]);
    }

    #[test]
    fn test_dispatch_skips_non_matching_types() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(
            recorder(log.clone(), "typed"),
            [EventType::from("music.MusicPlayEvent")],
        );

        bus.dispatch(&envelope("light.LightOnEvent"));

        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let id = bus.subscribe_all(recorder(log.clone(), "one"));
        bus.unsubscribe(id);
        bus.unsubscribe(id);

        bus.dispatch(&envelope("music.MusicPlayEvent"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_panicking_handler_does_not_block_later_handlers() {
        tracing_subscriber::fmt().with_test_writer().try_init().ok();

        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe_all(|_: &EventEnvelope| panic!("widget bug"));
        bus.subscribe_all(recorder(log.clone(), "survivor"));

        bus.dispatch(&envelope("music.MusicPlayEvent"));

        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }

    #[test]
    fn test_handler_can_unsubscribe_later_handler_mid_dispatch() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let victim_id = Arc::new(Mutex::new(None));

        let bus_clone = bus.clone();
        let victim_slot = victim_id.clone();
        bus.subscribe_all(move |_: &EventEnvelope| {
            if let Some(id) = *victim_slot.lock().unwrap() {
                bus_clone.unsubscribe(id);
            }
        });

        let id = bus.subscribe_all(recorder(log.clone(), "victim"));
        *victim_id.lock().unwrap() = Some(id);

        bus.dispatch(&envelope("music.MusicPlayEvent"));
        assert!(log.lock().unwrap().is_empty(), "removed handler still ran");
    }

    #[test]
    fn test_handler_subscribing_does_not_affect_current_dispatch() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let bus_clone = bus.clone();
        let log_clone = log.clone();
        bus.subscribe_all(move |_: &EventEnvelope| {
            let log = log_clone.clone();
            bus_clone.subscribe_all(move |_: &EventEnvelope| log.lock().unwrap().push("late"));
        });

        bus.dispatch(&envelope("music.MusicPlayEvent"));
        assert!(log.lock().unwrap().is_empty());

        bus.dispatch(&envelope("music.MusicPlayEvent"));
        assert_eq!(*log.lock().unwrap(), vec!["late"]);
    }

    #[test]
    fn test_scoped_subscription_released_on_drop() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        {
            let _guard = bus.subscribe_scoped(recorder(log.clone(), "scoped"), []);
            bus.dispatch(&envelope("music.MusicPlayEvent"));
        }

        bus.dispatch(&envelope("music.MusicPlayEvent"));

        assert_eq!(*log.lock().unwrap(), vec!["scoped"]);
        assert!(bus.is_empty());
    }
}
