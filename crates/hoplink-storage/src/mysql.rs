use async_trait::async_trait;
use hoplink_core::store::Result;
use hoplink_core::{ClickEvent, NewUrlRecord, OwnerId, ShortCode, StorageError, UrlRecord, UrlStore};
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// MySQL implementation of the [`UrlStore`] contract.
///
/// Uniqueness is enforced by the schema: a unique index on `short_code`
/// and a compound unique index on `(owner_id, short_code)`. Deletes are
/// physical; click events live in their own append-only table and survive
/// record deletion. Reads return rows as stored, expired ones included,
/// since expiration is enforced by the services at read time.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn parse_timestamp(seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds)
        .map_err(|e| StorageError::InvalidData(format!("invalid timestamp '{}': {e}", seconds)))
}

fn parse_opt_timestamp(seconds: Option<i64>) -> Result<Option<Timestamp>> {
    seconds.map(parse_timestamp).transpose()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn row_to_record(row: &MySqlRow) -> Result<UrlRecord> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let target_url: String = row.try_get("target_url").map_err(map_sqlx_error)?;
    let owner_id: String = row.try_get("owner_id").map_err(map_sqlx_error)?;
    let expires_at: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: i64 = row.try_get("updated_at").map_err(map_sqlx_error)?;
    let click_count: u64 = row.try_get("click_count").map_err(map_sqlx_error)?;
    let last_clicked_at: Option<i64> = row.try_get("last_clicked_at").map_err(map_sqlx_error)?;

    let owner_id = OwnerId::new(owner_id)
        .map_err(|e| StorageError::InvalidData(format!("stored owner id: {e}")))?;

    Ok(UrlRecord {
        id: id.to_string(),
        short_code: ShortCode::new_unchecked(short_code),
        target_url,
        owner_id,
        expires_at: parse_opt_timestamp(expires_at)?,
        created_at: parse_timestamp(created_at)?,
        updated_at: parse_timestamp(updated_at)?,
        click_count,
        last_clicked_at: parse_opt_timestamp(last_clicked_at)?,
    })
}

const SELECT_COLUMNS: &str = "id, short_code, target_url, owner_id, expires_at, \
     created_at, updated_at, click_count, last_clicked_at";

#[async_trait]
impl UrlStore for MySqlStore {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM short_urls WHERE short_code = ? LIMIT 1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn find_by_owner_and_code(
        &self,
        owner: &OwnerId,
        code: &ShortCode,
    ) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM short_urls \
             WHERE owner_id = ? AND short_code = ? LIMIT 1"
        ))
        .bind(owner.as_str())
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM short_urls
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord> {
        let now = now_unix_seconds();
        let expires_at = record.expires_at.map(|ts| ts.as_second());

        let result = sqlx::query(
            r#"
            INSERT INTO short_urls
                (short_code, target_url, owner_id, expires_at, created_at, updated_at, click_count)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(record.short_code.as_str())
        .bind(&record.target_url)
        .bind(record.owner_id.as_str())
        .bind(expires_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(err) if is_unique_violation(&err) => {
                return Err(StorageError::Conflict(record.short_code.to_string()))
            }
            Err(err) => return Err(map_sqlx_error(err)),
        };

        let now = parse_timestamp(now)?;
        Ok(UrlRecord {
            id: result.last_insert_id().to_string(),
            short_code: record.short_code,
            target_url: record.target_url,
            owner_id: record.owner_id,
            expires_at: record.expires_at,
            created_at: now,
            updated_at: now,
            click_count: 0,
            last_clicked_at: None,
        })
    }

    async fn delete_by_owner_and_code(&self, owner: &OwnerId, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM short_urls
            WHERE owner_id = ? AND short_code = ?
            "#,
        )
        .bind(owner.as_str())
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(
        &self,
        owner: &OwnerId,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<UrlRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM short_urls \
             WHERE owner_id = ? \
             ORDER BY created_at DESC, id DESC \
             LIMIT ? OFFSET ?"
        ))
        .bind(owner.as_str())
        .bind(limit as i64)
        .bind(skip as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn count_click_events(&self, code: &ShortCode) -> Result<u64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM click_events
            WHERE short_code = ?
            "#,
        )
        .bind(code.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let total: i64 = row.try_get("total").map_err(map_sqlx_error)?;
        Ok(total as u64)
    }

    async fn latest_click_event(&self, code: &ShortCode) -> Result<Option<ClickEvent>> {
        let row = sqlx::query(
            r#"
            SELECT created_at
            FROM click_events
            WHERE short_code = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
        Ok(Some(ClickEvent {
            short_code: code.clone(),
            created_at: parse_timestamp(created_at)?,
        }))
    }

    async fn insert_click_event(&self, code: &ShortCode, at: Timestamp) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO click_events (short_code, created_at)
            VALUES (?, ?)
            "#,
        )
        .bind(code.as_str())
        .bind(at.as_second())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn increment_click_counter(&self, code: &ShortCode, at: Timestamp) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE short_urls
            SET click_count = click_count + 1,
                last_clicked_at = ?,
                updated_at = ?
            WHERE short_code = ?
            "#,
        )
        .bind(at.as_second())
        .bind(at.as_second())
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_roundtrip() {
        let ts = Timestamp::from_second(1_700_000_000).unwrap();
        assert_eq!(parse_timestamp(ts.as_second()).unwrap(), ts);
    }

    #[test]
    fn optional_timestamp_parsing() {
        assert_eq!(parse_opt_timestamp(None).unwrap(), None);
        assert!(parse_opt_timestamp(Some(1_700_000_000)).unwrap().is_some());
    }

    #[test]
    fn pool_timeout_maps_to_timeout() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StorageError::Timeout(_)));
    }

    #[test]
    fn pool_closed_maps_to_unavailable() {
        let err = map_sqlx_error(sqlx::Error::PoolClosed);
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[test]
    fn row_not_found_maps_to_invalid_data() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StorageError::InvalidData(_)));
    }
}
