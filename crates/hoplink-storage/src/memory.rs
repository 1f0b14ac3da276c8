use async_trait::async_trait;
use dashmap::DashMap;
use hoplink_core::store::Result;
use hoplink_core::{ClickEvent, NewUrlRecord, OwnerId, ShortCode, StorageError, UrlRecord, UrlStore};
use jiff::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory implementation of [`UrlStore`] using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking. Keying the record map by short code makes
/// the global uniqueness constraint structural; the compound
/// `(owner_id, short_code)` constraint follows from it.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<String, UrlRecord>,
    clicks: DashMap<String, Vec<Timestamp>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(&self) -> String {
        // 24 hex digits, the same shape the production backend's ids have.
        format!("{:024x}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl UrlStore for InMemoryStore {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        Ok(self.records.get(code.as_str()).map(|r| r.clone()))
    }

    async fn find_by_owner_and_code(
        &self,
        owner: &OwnerId,
        code: &ShortCode,
    ) -> Result<Option<UrlRecord>> {
        Ok(self
            .records
            .get(code.as_str())
            .filter(|r| &r.owner_id == owner)
            .map(|r| r.clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.records.contains_key(code.as_str()))
    }

    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord> {
        let now = Timestamp::now();
        let stored = UrlRecord {
            id: self.assign_id(),
            short_code: record.short_code.clone(),
            target_url: record.target_url,
            owner_id: record.owner_id,
            expires_at: record.expires_at,
            created_at: now,
            updated_at: now,
            click_count: 0,
            last_clicked_at: None,
        };

        // The entry API makes check-and-insert atomic; a concurrent
        // insert of the same code loses with a clean conflict.
        match self.records.entry(record.short_code.as_str().to_owned()) {
            dashmap::Entry::Occupied(_) => {
                Err(StorageError::Conflict(record.short_code.to_string()))
            }
            dashmap::Entry::Vacant(vacant) => {
                vacant.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn delete_by_owner_and_code(&self, owner: &OwnerId, code: &ShortCode) -> Result<bool> {
        Ok(self
            .records
            .remove_if(code.as_str(), |_, r| &r.owner_id == owner)
            .is_some())
    }

    async fn list_by_owner(
        &self,
        owner: &OwnerId,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<UrlRecord>> {
        let mut records: Vec<UrlRecord> = self
            .records
            .iter()
            .filter(|entry| &entry.owner_id == owner)
            .map(|entry| entry.clone())
            .collect();

        // Newest first; ids break creation-time ties deterministically.
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(records.into_iter().skip(skip).take(limit).collect())
    }

    async fn count_click_events(&self, code: &ShortCode) -> Result<u64> {
        Ok(self
            .clicks
            .get(code.as_str())
            .map_or(0, |events| events.len() as u64))
    }

    async fn latest_click_event(&self, code: &ShortCode) -> Result<Option<ClickEvent>> {
        Ok(self
            .clicks
            .get(code.as_str())
            .and_then(|events| events.iter().max().copied())
            .map(|created_at| ClickEvent {
                short_code: code.clone(),
                created_at,
            }))
    }

    async fn insert_click_event(&self, code: &ShortCode, at: Timestamp) -> Result<()> {
        self.clicks
            .entry(code.as_str().to_owned())
            .or_default()
            .push(at);
        Ok(())
    }

    async fn increment_click_counter(&self, code: &ShortCode, at: Timestamp) -> Result<()> {
        if let Some(mut record) = self.records.get_mut(code.as_str()) {
            record.click_count += 1;
            record.last_clicked_at = Some(at);
            record.updated_at = at;
        }
        Ok(())
    }
}
