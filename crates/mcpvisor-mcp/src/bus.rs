//! Typed publish/subscribe surface for provider events.
//!
//! Built on a tokio broadcast channel. Consumers either pull from an owned
//! `Subscription` or register a callback with `on`, which returns a
//! `ListenerHandle`; dropping either one unsubscribes. An outer layer that
//! has its own transport can instead attach an `EventEmitter` with
//! `with_forward`, which sees every event synchronously.

use std::fmt;
use std::sync::Arc;

use mcpvisor_core::{EventEmitter, ProviderEvent};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Broadcaster for provider lifecycle events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ProviderEvent>,
    forward: Option<Arc<dyn EventEmitter>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .field("forwarding", &self.forward.is_some())
            .finish()
    }
}

impl EventBus {
    /// `capacity` is the number of events buffered per subscriber before a
    /// slow subscriber starts losing the oldest ones.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            forward: None,
        }
    }

    /// Also hand every published event to `emitter`, before subscribers see
    /// it. Replaces any previous forward.
    #[must_use]
    pub fn with_forward(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.forward = Some(emitter);
        self
    }

    /// Broadcast an event to all current subscribers.
    pub fn publish(&self, event: ProviderEvent) {
        if let Some(forward) = &self.forward {
            forward.emit(event.clone());
        }
        // Only log if there are receivers
        if self.sender.receiver_count() > 0 {
            debug!(
                event = event.event_name(),
                provider_id = %event.provider_id(),
                "Publishing provider event"
            );
            let _ = self.sender.send(event);
        }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Run `listener` for every event published from now on.
    ///
    /// The subscription is taken before this returns, so no event published
    /// afterwards is missed. Must be called within a tokio runtime.
    pub fn on<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(ProviderEvent) + Send + 'static,
    {
        let mut subscription = self.subscribe();
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                listener(event);
            }
        });
        ListenerHandle { task }
    }

    /// Remove a listener registered with `on`.
    pub fn off(&self, handle: ListenerHandle) {
        drop(handle);
    }

    /// Number of live subscriptions and listeners.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(mcpvisor_core::settings::DEFAULT_EVENT_CAPACITY)
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event: ProviderEvent) {
        self.publish(event);
    }
}

/// Owned receiver of provider events. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ProviderEvent>,
}

impl Subscription {
    /// Next event, or `None` once the bus is gone.
    ///
    /// A subscriber that falls behind skips the events it missed.
    pub async fn recv(&mut self) -> Option<ProviderEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-buffered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ProviderEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged, events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

/// Registration of an `on` listener. Dropping it removes the listener.
#[derive(Debug)]
pub struct ListenerHandle {
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use mcpvisor_core::ProviderId;

    use super::*;

    fn removed(id: &str) -> ProviderEvent {
        ProviderEvent::removed(ProviderId::from(id))
    }

    #[tokio::test]
    async fn test_subscription_receives_in_order() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe();

        bus.publish(removed("a"));
        bus.publish(removed("b"));

        assert_eq!(sub.recv().await.unwrap().provider_id().as_str(), "a");
        assert_eq!(sub.recv().await.unwrap().provider_id().as_str(), "b");
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let bus = EventBus::new(16);
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_ahead() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();
        for id in ["a", "b", "c", "d"] {
            bus.publish(removed(id));
        }

        assert_eq!(sub.recv().await.unwrap().provider_id().as_str(), "c");
    }

    #[tokio::test]
    async fn test_on_and_off() {
        let bus = EventBus::new(16);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let handle = bus.on(move |event| {
            sink.lock().unwrap().push(event.provider_id().to_string());
        });
        assert!(handle.is_active());

        bus.publish(removed("a"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string()]);

        bus.off(handle);
        tokio::task::yield_now().await;
        bus.publish(removed("b"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    struct Recorder(Mutex<Vec<String>>);

    impl EventEmitter for Recorder {
        fn emit(&self, event: ProviderEvent) {
            self.0.lock().unwrap().push(event.provider_id().to_string());
        }
    }

    #[test]
    fn test_forward_sees_events_without_subscribers() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let bus = EventBus::new(16).with_forward(recorder.clone());
        assert_eq!(bus.subscriber_count(), 0);

        bus.publish(removed("a"));
        bus.clone().publish(removed("b"));

        assert_eq!(*recorder.0.lock().unwrap(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_bus_forwards_into_another_bus() {
        let outer = EventBus::new(16);
        let mut sub = outer.subscribe();
        let inner = EventBus::new(16).with_forward(Arc::new(outer.clone()));

        inner.publish(removed("a"));

        assert_eq!(sub.recv().await.unwrap().provider_id().as_str(), "a");
    }
}
