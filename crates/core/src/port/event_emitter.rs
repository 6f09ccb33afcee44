// Event Emitter Port (Interface)

use crate::domain::Event;
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Publishing side of the event bus
///
/// `emit` returns once every current subscriber has the event queued. A
/// subscriber whose queue is full holds `emit` back until it makes room;
/// callers bound that wait with a timeout.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Publish `event` to every current subscriber of `event.topic`
    ///
    /// Returns the number of subscribers the event was queued for.
    async fn emit(&self, event: Event) -> Result<usize>;
}

/// Subscribing side of the event bus
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to a topic; events published afterwards are received
    async fn subscribe(&self, topic: &str) -> Result<EventReceiver>;
}

/// One subscriber's private event queue
#[derive(Debug)]
pub struct EventReceiver {
    topic: String,
    queue: mpsc::Receiver<Event>,
}

impl EventReceiver {
    pub fn new(topic: impl Into<String>, queue: mpsc::Receiver<Event>) -> Self {
        Self {
            topic: topic.into(),
            queue,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next event
    ///
    /// Events arrive in emit order and none are skipped. Returns `None` once
    /// the bus is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.queue.recv().await
    }
}
