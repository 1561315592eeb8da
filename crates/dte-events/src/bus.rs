//! The cognitive event bus: typed pub/sub with bounded, per-subscriber
//! fan-out. The sole inter-module communication channel (§4.4/§5).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, trace, warn};

use crate::event::{Event, EventPayload, EventType};

/// Implemented by anything that wants to react to bus events. Each
/// subscription runs its handler on a dedicated task, so a slow handler
/// only backs up its own queue, never another subscriber's.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Event);
}

/// Token returned by `subscribe`, used to `unsubscribe` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

struct Subscription {
    event_type: EventType,
    sender: mpsc::Sender<Event>,
    cancel: Option<oneshot::Sender<()>>,
    drop_count: Arc<AtomicU64>,
}

/// Typed publish/subscribe bus. Cheaply `Clone`-able; clones share the
/// same subscriber table.
#[derive(Clone)]
pub struct EventBus {
    subscriptions: Arc<Mutex<HashMap<u64, Subscription>>>,
    next_token: Arc<AtomicU64>,
    next_seq: Arc<AtomicU64>,
    queue_depth: usize,
}

impl EventBus {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            next_token: Arc::new(AtomicU64::new(1)),
            next_seq: Arc::new(AtomicU64::new(1)),
            queue_depth,
        }
    }

    /// Registers `handler` for events of `event_type`. The handler runs on
    /// its own spawned task for the lifetime of the subscription.
    pub async fn subscribe<H>(&self, event_type: EventType, handler: H) -> SubscriptionToken
    where
        H: EventHandler + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<Event>(self.queue_depth.max(1));
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::SeqCst));
        let drop_count = Arc::new(AtomicU64::new(0));

        let handler = Arc::new(handler);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => {
                        break;
                    }
                    maybe_event = rx.recv() => {
                        match maybe_event {
                            Some(event) => handler.handle(event).await,
                            None => break,
                        }
                    }
                }
            }
        });

        self.subscriptions.lock().await.insert(
            token.0,
            Subscription {
                event_type,
                sender: tx,
                cancel: Some(cancel_tx),
                drop_count,
            },
        );
        debug!(?event_type, token = token.0, "subscribed");
        token
    }

    /// Ends a subscription. The dedicated task stops after its current
    /// handler invocation (if any) completes.
    pub async fn unsubscribe(&self, token: SubscriptionToken) {
        if let Some(mut sub) = self.subscriptions.lock().await.remove(&token.0) {
            if let Some(cancel) = sub.cancel.take() {
                let _ = cancel.send(());
            }
        }
    }

    /// Publishes an event to every current subscriber of its type.
    /// Non-blocking: a full subscriber queue drops the event for that
    /// subscriber only, counted in its drop metric. Never blocks on, or
    /// is slowed by, a subscriber that isn't consuming.
    pub async fn publish(&self, payload: EventPayload) -> Event {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            seq,
            emitted_at: chrono::Utc::now(),
            payload,
        };
        let kind = event.kind();

        let subs = self.subscriptions.lock().await;
        for sub in subs.values().filter(|s| s.event_type == kind) {
            match sub.sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    sub.drop_count.fetch_add(1, Ordering::SeqCst);
                    trace!(?kind, "subscriber queue full, event dropped for subscriber");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(?kind, "subscriber channel closed, event dropped for subscriber");
                }
            }
        }
        event
    }

    /// Total events dropped for a given subscription due to backpressure.
    pub async fn drop_count(&self, token: SubscriptionToken) -> u64 {
        self.subscriptions
            .lock()
            .await
            .get(&token.0)
            .map(|s| s.drop_count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct CollectingHandler(Arc<StdMutex<Vec<Event>>>);

    #[async_trait]
    impl EventHandler for CollectingHandler {
        async fn handle(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }
    }

    struct NeverConsumingHandler;

    #[async_trait]
    impl EventHandler for NeverConsumingHandler {
        async fn handle(&self, _event: Event) {
            // Sleep far longer than the test needs so the queue fills up.
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        }
    }

    #[tokio::test]
    async fn subscriber_receives_only_its_type() {
        let bus = EventBus::new(8);
        let collected = Arc::new(StdMutex::new(Vec::new()));
        bus.subscribe(EventType::DreamStarted, CollectingHandler(collected.clone()))
            .await;

        bus.publish(EventPayload::DreamStarted).await;
        bus.publish(EventPayload::DreamEnded { patterns_formed: 2 }).await;

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let events = collected.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventType::DreamStarted);
    }

    #[tokio::test]
    async fn slow_subscriber_drops_without_blocking_publisher() {
        let bus = EventBus::new(1);
        let token = bus.subscribe(EventType::PhaseTick, NeverConsumingHandler).await;

        for _ in 0..10 {
            bus.publish(EventPayload::PhaseTick(dte_types::ClockState::initial()))
                .await;
        }
        // The publish loop above must have returned promptly (no await point
        // can block on a full channel, since we use try_send).
        assert!(bus.drop_count(token).await >= 1);
    }

    #[tokio::test]
    async fn sequence_numbers_are_monotonic() {
        let bus = EventBus::new(8);
        let e1 = bus.publish(EventPayload::DreamStarted).await;
        let e2 = bus.publish(EventPayload::DreamStarted).await;
        assert!(e2.seq > e1.seq);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = EventBus::new(8);
        let collected = Arc::new(StdMutex::new(Vec::new()));
        let token = bus
            .subscribe(EventType::DreamStarted, CollectingHandler(collected.clone()))
            .await;
        bus.unsubscribe(token).await;
        bus.publish(EventPayload::DreamStarted).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(collected.lock().unwrap().len(), 0);
    }
}
