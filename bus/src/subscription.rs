use crate::{EventBus, SubscriptionId};

/// Scoped handle for one bus registration.
///
/// Dropping the guard unsubscribes exactly once; the handler lives
/// exactly as long as the widget holding it.
pub struct Subscription {
    bus: EventBus,
    id: SubscriptionId,
}

impl Subscription {
    pub(crate) fn new(bus: EventBus, id: SubscriptionId) -> Self {
        Self { bus, id }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Release explicitly instead of waiting for scope end.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}
