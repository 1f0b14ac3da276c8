use crate::error::StorageError;
use crate::owner::OwnerId;
use crate::record::{ClickEvent, NewUrlRecord, UrlRecord};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;

/// Type alias for store results.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The durable store for URL records and their click-event log.
///
/// Implementations must enforce uniqueness on `short_code` and on the
/// `(owner_id, short_code)` pair; a duplicate insert fails with
/// [`StorageError::Conflict`] even when the caller has already performed
/// an existence check. Reads return records as stored, including expired
/// ones; expiration is enforced by the services at read time.
#[async_trait]
pub trait UrlStore: Send + Sync + 'static {
    /// Retrieves the record for a short code, regardless of owner.
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Retrieves the record only if it belongs to the given owner.
    async fn find_by_owner_and_code(
        &self,
        owner: &OwnerId,
        code: &ShortCode,
    ) -> Result<Option<UrlRecord>>;

    /// Checks whether a short code is already taken, expired rows included.
    ///
    /// Generation-retry uses this; an expired-but-present row still blocks
    /// reuse of its code until physically purged.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Inserts a new record, assigning its durable id and timestamps.
    /// Fails with [`StorageError::Conflict`] if the code is taken.
    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord>;

    /// Deletes the record only if it belongs to the given owner.
    /// Returns `true` if a record was removed.
    async fn delete_by_owner_and_code(&self, owner: &OwnerId, code: &ShortCode) -> Result<bool>;

    /// Lists an owner's records, newest first, paginated.
    async fn list_by_owner(
        &self,
        owner: &OwnerId,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<UrlRecord>>;

    /// Counts click events for a code. Authoritative for analytics.
    async fn count_click_events(&self, code: &ShortCode) -> Result<u64>;

    /// Returns the most recent click event for a code, if any.
    async fn latest_click_event(&self, code: &ShortCode) -> Result<Option<ClickEvent>>;

    /// Appends a click event. Events are never updated or deleted.
    async fn insert_click_event(&self, code: &ShortCode, at: Timestamp) -> Result<()>;

    /// Increments the record's best-effort click counter and refreshes
    /// `last_clicked_at`/`updated_at`. A missing record is not an error;
    /// the click may race a delete.
    async fn increment_click_counter(&self, code: &ShortCode, at: Timestamp) -> Result<()>;
}
