//! In-memory ProgressRepository.
//!
//! Records live in a `HashMap` behind a tokio `RwLock`. An outage switch
//! makes every call fail with a storage error, which is how callers can
//! exercise their failure paths without a real database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ProgressRecord;
use crate::domain::ports::ProgressRepository;

/// Process-local progress store.
#[derive(Debug, Default)]
pub struct InMemoryProgressRepository {
    records: RwLock<HashMap<String, ProgressRecord>>,
    loads_unavailable: AtomicBool,
    saves_unavailable: AtomicBool,
    failed_loads_remaining: AtomicU64,
}

impl InMemoryProgressRepository {
    /// Empty store with every switch off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every load and save fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.loads_unavailable.store(unavailable, Ordering::Release);
        self.saves_unavailable.store(unavailable, Ordering::Release);
    }

    /// Make only saves fail until switched back.
    pub fn set_saves_unavailable(&self, unavailable: bool) {
        self.saves_unavailable.store(unavailable, Ordering::Release);
    }

    /// Fail the next `count` loads, then recover.
    pub fn fail_next_loads(&self, count: u64) {
        self.failed_loads_remaining.store(count, Ordering::Release);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_load(&self) -> DomainResult<()> {
        if self.loads_unavailable.load(Ordering::Acquire) {
            return Err(unavailable());
        }
        let consumed = self
            .failed_loads_remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(unavailable());
        }
        Ok(())
    }

    fn check_save(&self) -> DomainResult<()> {
        if self.saves_unavailable.load(Ordering::Acquire) {
            return Err(unavailable());
        }
        Ok(())
    }
}

fn unavailable() -> DomainError {
    DomainError::StorageError("progress store unavailable".to_string())
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn load(&self, user_id: &str) -> DomainResult<Option<ProgressRecord>> {
        self.check_load()?;
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn save(&self, record: &ProgressRecord) -> DomainResult<()> {
        self.check_save()?;
        let mut records = self.records.write().await;
        let mut stored = record.clone();
        if let Some(existing) = records.get(&record.user_id) {
            stored.created_at = existing.created_at;
        }
        records.insert(record.user_id.clone(), stored);
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> DomainResult<bool> {
        self.check_save()?;
        Ok(self.records.write().await.remove(user_id).is_some())
    }

    async fn list_user_ids(&self) -> DomainResult<Vec<String>> {
        self.check_load()?;
        let mut ids: Vec<String> = self.records.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
