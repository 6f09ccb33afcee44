//! In-process topic bus
//!
//! Every subscriber owns a bounded `mpsc` queue. `emit` waits until the
//! event is queued for each live subscriber, so a slow consumer slows the
//! publisher down instead of losing events. Emitting to a topic nobody
//! listens to is accepted and reported as zero deliveries.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, trace};
use ytflow_core::domain::Event;
use ytflow_core::error::{AppError, Result};
use ytflow_core::port::{EventEmitter, EventReceiver, EventSubscriber};

/// Default per-subscriber queue capacity
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// In-memory event bus
pub struct InMemoryEventBus {
    topics: Mutex<HashMap<String, Vec<mpsc::Sender<Event>>>>,
    capacity: usize,
    closed: AtomicBool,
    subscribed: Notify,
}

impl InMemoryEventBus {
    /// Create a new bus with the specified per-subscriber queue capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
            subscribed: Notify::new(),
        }
    }

    /// Number of live subscribers on a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .map(|topics| {
                topics
                    .get(topic)
                    .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            })
            .unwrap_or(0)
    }

    /// Resolve once `topic` has at least one live subscriber
    pub async fn wait_for_subscriber(&self, topic: &str) {
        loop {
            let notified = self.subscribed.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent subscribe is not missed
            notified.as_mut().enable();

            if self.subscriber_count(topic) > 0 {
                return;
            }
            notified.await;
        }
    }

    /// Refuse further emits and drop every queue sender
    ///
    /// Receivers drain what is already queued, then see the end of stream.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut topics) = self.topics.lock() {
            topics.clear();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn poisoned<T>(_: T) -> AppError {
        AppError::Internal("event bus topic table poisoned".to_string())
    }

    /// Live senders for `topic`, pruning subscribers that went away
    fn senders(&self, topic: &str) -> Result<Vec<mpsc::Sender<Event>>> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|_| AppError::Delivery("event bus topic table poisoned".to_string()))?;

        let Some(senders) = topics.get_mut(topic) else {
            return Ok(Vec::new());
        };
        senders.retain(|tx| !tx.is_closed());
        Ok(senders.clone())
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

#[async_trait]
impl EventEmitter for InMemoryEventBus {
    async fn emit(&self, event: Event) -> Result<usize> {
        if self.is_closed() {
            return Err(AppError::Delivery(format!(
                "bus closed, cannot emit {}",
                event.topic
            )));
        }

        let senders = self.senders(&event.topic)?;
        if senders.is_empty() {
            debug!(topic = %event.topic, "No subscribers for topic");
            return Ok(0);
        }

        let mut delivered = 0;
        for tx in &senders {
            // Err only means this subscriber dropped its receiver
            if tx.send(event.clone()).await.is_ok() {
                delivered += 1;
            }
        }

        trace!(topic = %event.topic, delivered, "Event published");
        Ok(delivered)
    }
}

#[async_trait]
impl EventSubscriber for InMemoryEventBus {
    async fn subscribe(&self, topic: &str) -> Result<EventReceiver> {
        if self.is_closed() {
            return Err(AppError::Internal("bus closed".to_string()));
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        self.topics
            .lock()
            .map_err(Self::poisoned)?
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        self.subscribed.notify_waiters();

        Ok(EventReceiver::new(topic, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use ytflow_core::domain::YT_SUBMIT_TOPIC;

    fn submit_event(job_id: &str) -> Event {
        Event::new(
            YT_SUBMIT_TOPIC,
            json!({"jobId": job_id, "channel": "tech-news", "email": "a@b.com"}),
        )
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_accepted() {
        let bus = InMemoryEventBus::new(16);
        assert_eq!(bus.emit(submit_event("job_1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = InMemoryEventBus::new(16);
        let mut receiver = bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap();

        let delivered = bus.emit(submit_event("job_1")).await.unwrap();
        assert_eq!(delivered, 1);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.payload["jobId"], "job_1");
        assert_eq!(receiver.topic(), YT_SUBMIT_TOPIC);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let bus = InMemoryEventBus::new(16);
        let mut first = bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap();
        let mut second = bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap();
        assert_eq!(bus.subscriber_count(YT_SUBMIT_TOPIC), 2);

        assert_eq!(bus.emit(submit_event("job_1")).await.unwrap(), 2);

        assert_eq!(first.recv().await.unwrap().payload["jobId"], "job_1");
        assert_eq!(second.recv().await.unwrap().payload["jobId"], "job_1");
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let bus = InMemoryEventBus::new(16);
        let mut other = bus.subscribe("YT.other").await.unwrap();

        assert_eq!(bus.emit(submit_event("job_1")).await.unwrap(), 0);
        bus.emit(Event::new("YT.other", json!({"n": 1})))
            .await
            .unwrap();

        assert_eq!(other.recv().await.unwrap().payload["n"], 1);
    }

    #[tokio::test]
    async fn test_dropped_subscribers_count_as_zero() {
        let bus = InMemoryEventBus::new(16);
        drop(bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap());

        assert_eq!(bus.emit(submit_event("job_1")).await.unwrap(), 0);
        assert_eq!(bus.subscriber_count(YT_SUBMIT_TOPIC), 0);
    }

    #[tokio::test]
    async fn test_slow_subscriber_receives_every_event_in_order() {
        let bus = Arc::new(InMemoryEventBus::new(2));
        let mut receiver = bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap();

        let publisher = {
            let bus = bus.clone();
            tokio::spawn(async move {
                for i in 0..10 {
                    assert_eq!(bus.emit(submit_event(&format!("job_{}", i))).await.unwrap(), 1);
                }
            })
        };

        for i in 0..10 {
            tokio::time::sleep(Duration::from_millis(2)).await;
            let event = receiver.recv().await.unwrap();
            assert_eq!(event.payload["jobId"], format!("job_{}", i));
        }
        publisher.await.unwrap();
    }

    #[tokio::test]
    async fn test_full_queue_holds_emit_back() {
        let bus = InMemoryEventBus::new(2);
        let mut receiver = bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap();

        bus.emit(submit_event("job_0")).await.unwrap();
        bus.emit(submit_event("job_1")).await.unwrap();

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), bus.emit(submit_event("job_2"))).await;
        assert!(blocked.is_err(), "third emit must wait for queue space");

        // The abandoned emit queued nothing
        assert_eq!(receiver.recv().await.unwrap().payload["jobId"], "job_0");
        assert_eq!(receiver.recv().await.unwrap().payload["jobId"], "job_1");
        bus.emit(submit_event("job_3")).await.unwrap();
        assert_eq!(receiver.recv().await.unwrap().payload["jobId"], "job_3");
    }

    #[tokio::test]
    async fn test_wait_for_subscriber() {
        let bus = Arc::new(InMemoryEventBus::new(4));

        let waiter = {
            let bus = bus.clone();
            tokio::spawn(async move { bus.wait_for_subscriber(YT_SUBMIT_TOPIC).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        let _receiver = bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_bus_rejects_emit() {
        let bus = InMemoryEventBus::new(16);
        let mut receiver = bus.subscribe(YT_SUBMIT_TOPIC).await.unwrap();
        bus.emit(submit_event("job_0")).await.unwrap();
        bus.close();

        let err = bus.emit(submit_event("job_1")).await.unwrap_err();
        assert!(matches!(err, AppError::Delivery(_)));
        assert_eq!(receiver.recv().await.unwrap().payload["jobId"], "job_0");
        assert!(receiver.recv().await.is_none());
    }
}
