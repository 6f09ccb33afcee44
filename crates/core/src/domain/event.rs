// Event Domain Model

use serde::{Deserialize, Serialize};

/// Topic announcing a freshly created submission
pub const YT_SUBMIT_TOPIC: &str = "YT.submit";

/// Bus event: a topic plus an opaque JSON payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// `YT.submit` payload
///
/// Carries only what a consumer needs to start work. State and timestamps
/// are read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvent {
    pub job_id: String,
    pub channel: String,
    pub email: String,
}

impl SubmitEvent {
    pub fn into_event(self) -> crate::error::Result<Event> {
        Ok(Event::new(YT_SUBMIT_TOPIC, serde_json::to_value(self)?))
    }
}
