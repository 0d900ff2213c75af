//! # Change Notifier
//!
//! Fans out "promotions changed" events to every subscribed viewer.
//!
//! ## Delivery Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ActivationController ──notify()──► broadcast::Sender<ChangeEvent>      │
//! │                                          │                              │
//! │                      ┌───────────────────┼───────────────────┐          │
//! │                      ▼                   ▼                   ▼          │
//! │               Subscription        Subscription        on_change task    │
//! │               (viewer 1)          (viewer 2)          (callback)        │
//! │                                                                         │
//! │  • Events carry no payload. Receivers refetch.                         │
//! │  • At-least-once: a slow receiver that overflows the buffer gets one   │
//! │    event with `missed > 0` instead of the dropped ones.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::config::NotifierSettings;

/// Topic every promotion change is published on.
pub const PROMOTIONS_TOPIC: &str = "promotions";

/// Default per-subscriber buffer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Change Event
// =============================================================================

/// Something about the promotion set changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub topic: String,
    /// Monotonic per notifier. 0 when synthesized for a lagging stream.
    pub sequence: u64,
    pub emitted_at: DateTime<Utc>,
    /// Events this receiver lost before this one.
    pub missed: u64,
}

// =============================================================================
// Change Notifier
// =============================================================================

/// Cheap to clone; clones publish on the same channel.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    inner: Arc<NotifierInner>,
}

#[derive(Debug)]
struct NotifierInner {
    tx: broadcast::Sender<ChangeEvent>,
    sequence: AtomicU64,
}

impl ChangeNotifier {
    /// Creates a notifier buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        ChangeNotifier {
            inner: Arc::new(NotifierInner {
                tx,
                sequence: AtomicU64::new(0),
            }),
        }
    }

    pub fn from_settings(settings: &NotifierSettings) -> Self {
        Self::new(settings.channel_capacity)
    }

    pub fn topic(&self) -> &'static str {
        PROMOTIONS_TOPIC
    }

    /// Opens a new subscription. Only events published afterwards are seen.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: Some(self.inner.tx.subscribe()),
        }
    }

    /// Publishes one change event and returns its sequence number.
    ///
    /// Never fails. With no subscribers the event is dropped.
    pub fn notify(&self) -> u64 {
        let sequence = self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let event = ChangeEvent {
            topic: PROMOTIONS_TOPIC.to_string(),
            sequence,
            emitted_at: Utc::now(),
            missed: 0,
        };

        match self.inner.tx.send(event) {
            Ok(receivers) => debug!(sequence, receivers, "Promotion change published"),
            Err(_) => debug!(sequence, "Promotion change published with no subscribers"),
        }

        sequence
    }

    /// Number of open subscriptions (including `on_change` callbacks).
    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }

    /// Runs `callback` once per event on a background task until the
    /// returned handle is unsubscribed or dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_change<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(ChangeEvent) + Send + 'static,
    {
        let mut subscription = self.subscribe();
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                callback(event);
            }
        });

        CallbackHandle { task: Some(task) }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Receiving end of the promotions topic.
#[derive(Debug)]
pub struct Subscription {
    rx: Option<broadcast::Receiver<ChangeEvent>>,
}

impl Subscription {
    /// Waits for the next event.
    ///
    /// Returns `None` once the subscription is closed or every notifier
    /// clone has been dropped.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        let rx = self.rx.as_mut()?;
        let mut missed = 0u64;

        loop {
            match rx.recv().await {
                Ok(mut event) => {
                    event.missed += missed;
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Promotion change subscriber lagged");
                    missed += skipped;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Stops receiving. Safe to call more than once.
    pub fn close(&mut self) {
        if self.rx.take().is_some() {
            debug!("Promotion change subscription closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.rx.is_none()
    }

    /// Adapts the subscription into a `Stream` of events.
    ///
    /// A lag is reported as one synthesized event (sequence 0) carrying the
    /// number of events lost. A closed subscription yields an empty stream.
    pub fn into_stream(mut self) -> impl Stream<Item = ChangeEvent> + Send + Unpin {
        let rx = self.rx.take().unwrap_or_else(|| {
            let (tx, rx) = broadcast::channel(1);
            drop(tx);
            rx
        });

        BroadcastStream::new(rx).map(|item| match item {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => ChangeEvent {
                topic: PROMOTIONS_TOPIC.to_string(),
                sequence: 0,
                emitted_at: Utc::now(),
                missed: skipped,
            },
        })
    }
}

// =============================================================================
// Callback Handle
// =============================================================================

/// Keeps an `on_change` callback registered.
#[derive(Debug)]
pub struct CallbackHandle {
    task: Option<JoinHandle<()>>,
}

impl CallbackHandle {
    /// Stops the callback. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let notifier = ChangeNotifier::default();
        let mut sub = notifier.subscribe();

        let first = notifier.notify();
        let second = notifier.notify();

        let a = sub.recv().await.unwrap();
        let b = sub.recv().await.unwrap();
        assert_eq!(a.sequence, first);
        assert_eq!(b.sequence, second);
        assert_eq!(a.topic, "promotions");
        assert_eq!(a.missed, 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_gets_the_event() {
        let notifier = ChangeNotifier::default();
        let mut subs: Vec<Subscription> = (0..5).map(|_| notifier.subscribe()).collect();
        assert_eq!(notifier.subscriber_count(), 5);

        notifier.notify();

        for sub in subs.iter_mut() {
            assert_eq!(sub.recv().await.unwrap().sequence, 1);
        }
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let notifier = ChangeNotifier::default();
        let mut sub = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        sub.close();
        sub.close();

        assert!(sub.is_closed());
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.notify();
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_sees_missed_count() {
        let notifier = ChangeNotifier::new(2);
        let mut sub = notifier.subscribe();

        for _ in 0..5 {
            notifier.notify();
        }

        let event = sub.recv().await.unwrap();
        assert_eq!(event.missed, 3);
        assert_eq!(event.sequence, 4);
        assert_eq!(sub.recv().await.unwrap().sequence, 5);
    }

    #[tokio::test]
    async fn test_dropped_notifier_ends_subscription() {
        let notifier = ChangeNotifier::default();
        let mut sub = notifier.subscribe();
        drop(notifier);

        assert!(sub.recv().await.is_none());
        assert!(sub.is_closed());
    }

    #[tokio::test]
    async fn test_stream_adapter() {
        let notifier = ChangeNotifier::default();
        let stream = notifier.subscribe().into_stream();

        notifier.notify();
        notifier.notify();
        drop(notifier);

        let events: Vec<ChangeEvent> = stream.collect().await;
        assert_eq!(events.iter().map(|e| e.sequence).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_closed_subscription_streams_nothing() {
        let notifier = ChangeNotifier::default();
        let mut sub = notifier.subscribe();
        sub.close();

        let mut stream = sub.into_stream();
        notifier.notify();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_on_change_callback_and_unsubscribe() {
        let notifier = ChangeNotifier::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let mut handle = notifier.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(handle.is_subscribed());

        notifier.notify();
        notifier.notify();

        tokio::time::timeout(Duration::from_secs(1), async {
            while calls.load(Ordering::SeqCst) < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        handle.unsubscribe();
        handle.unsubscribe();
        assert!(!handle.is_subscribed());

        tokio::time::timeout(Duration::from_secs(1), async {
            while notifier.subscriber_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        notifier.notify();
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let event = ChangeEvent {
            topic: PROMOTIONS_TOPIC.to_string(),
            sequence: 7,
            emitted_at: Utc::now(),
            missed: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["sequence"], 7);
        assert!(json.get("emittedAt").is_some());
    }
}
