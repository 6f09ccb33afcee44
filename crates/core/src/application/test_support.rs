//! Port doubles shared by application tests

use crate::domain::{Event, JobRecord, JobState};
use crate::error::{AppError, Result};
use crate::port::{EventEmitter, IdProvider, JobStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// HashMap-backed store
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, JobRecord>>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.lock().unwrap().contains_key(key)
    }

    pub fn insert(&self, record: JobRecord) {
        self.records.lock().unwrap().insert(record.key(), record);
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn set(&self, key: &str, record: &JobRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<JobRecord>> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    async fn find_by_state(&self, state: JobState) -> Result<Vec<JobRecord>> {
        let mut found: Vec<JobRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.state == state)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }
}

/// Store whose writes always fail
pub struct FailingStore;

#[async_trait]
impl JobStore for FailingStore {
    async fn set(&self, _key: &str, _record: &JobRecord) -> Result<()> {
        Err(AppError::Persistence("disk full".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<JobRecord>> {
        Ok(None)
    }

    async fn find_by_state(&self, _state: JobState) -> Result<Vec<JobRecord>> {
        Ok(vec![])
    }
}

/// Store whose writes block until a permit is released
pub struct GatedStore {
    pub inner: Arc<MemoryStore>,
    pub gate: Arc<Semaphore>,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
        }
    }
}

#[async_trait]
impl JobStore for GatedStore {
    async fn set(&self, key: &str, record: &JobRecord) -> Result<()> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;
        self.inner.set(key, record).await
    }

    async fn get(&self, key: &str) -> Result<Option<JobRecord>> {
        self.inner.get(key).await
    }

    async fn find_by_state(&self, state: JobState) -> Result<Vec<JobRecord>> {
        self.inner.find_by_state(state).await
    }
}

/// Emitter that records every event, noting whether the job was already
/// stored at the moment of emission
pub struct RecordingEmitter {
    store: Arc<MemoryStore>,
    pub events: Mutex<Vec<(Event, bool)>>,
}

impl RecordingEmitter {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn emitted(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(event, _)| event.clone())
            .collect()
    }

    pub fn all_persisted_first(&self) -> bool {
        self.events.lock().unwrap().iter().all(|(_, stored)| *stored)
    }
}

#[async_trait]
impl EventEmitter for RecordingEmitter {
    async fn emit(&self, event: Event) -> Result<usize> {
        let stored = event
            .payload
            .get("jobId")
            .and_then(|v| v.as_str())
            .map(|id| self.store.contains(&crate::domain::job_key(id)))
            .unwrap_or(false);
        self.events.lock().unwrap().push((event, stored));
        Ok(1)
    }
}

/// Emitter that always fails
pub struct FailingEmitter;

#[async_trait]
impl EventEmitter for FailingEmitter {
    async fn emit(&self, _event: Event) -> Result<usize> {
        Err(AppError::Delivery("bus unavailable".to_string()))
    }
}

/// Emitter that blocks until a permit is released, then records
pub struct GatedEmitter {
    pub inner: RecordingEmitter,
    pub gate: Arc<Semaphore>,
}

#[async_trait]
impl EventEmitter for GatedEmitter {
    async fn emit(&self, event: Event) -> Result<usize> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| AppError::Delivery(e.to_string()))?;
        self.inner.emit(event).await
    }
}

/// Deterministic IDs: `job_test_1`, `job_test_2`, ...
#[derive(Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl IdProvider for SequentialIds {
    fn generate_id(&self) -> Result<String> {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("job_test_{}", n))
    }
}

/// ID provider that always fails
pub struct BrokenIds;

impl IdProvider for BrokenIds {
    fn generate_id(&self) -> Result<String> {
        Err(AppError::Identity("entropy source unavailable".to_string()))
    }
}
