use crate::error::ShortenError;
use hoplink_core::{
    cache_ttl, NewUrlRecord, OwnerId, ShortCode, StorageError, UrlAnalytics, UrlCache, UrlRecord,
    UrlStore,
};
use hoplink_generator::CodeGenerator;
use jiff::{SignedDuration, Timestamp};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Bounded retry for random code generation. Exhausting it means the
/// code space is effectively full for the current length, or the random
/// source is compromised; the error is an operational alarm.
const MAX_GENERATION_ATTEMPTS: u32 = 5;

const MIN_EXPIRES_IN: Duration = Duration::from_secs(60);
const MAX_EXPIRES_IN: Duration = Duration::from_secs(31_536_000);

/// Configures the shortening service.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ShortenConfig {
    /// Ceiling for write-through cache-entry TTLs; must match the
    /// resolver's so both paths populate equivalent entries.
    #[builder(default = Duration::from_secs(3600))]
    pub default_cache_ttl: Duration,
}

impl Default for ShortenConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct CreateParams {
    /// The absolute URL to be shortened.
    pub target_url: String,
    /// The verified owner of the new record.
    pub owner_id: OwnerId,
    /// Optional custom alias, used verbatim as the short code.
    pub custom_alias: Option<String>,
    /// Optional lifetime; bounded to 60 seconds through one year.
    pub expires_in: Option<Duration>,
}

/// Service for creating and managing shortened URLs.
///
/// Wraps the durable store, the cache layer, and a code generator.
/// Alias uniqueness is ultimately arbitrated by the store's unique
/// constraint; the pre-checks here only give earlier, friendlier
/// failures.
#[derive(Debug, Clone)]
pub struct ShortenService<S, C, G> {
    store: Arc<S>,
    cache: Arc<C>,
    generator: G,
    config: ShortenConfig,
}

impl<S, C, G> ShortenService<S, C, G>
where
    S: UrlStore,
    C: UrlCache,
    G: CodeGenerator,
{
    /// Creates a new service with the default configuration.
    pub fn new(store: Arc<S>, cache: Arc<C>, generator: G) -> Self {
        Self::with_config(store, cache, generator, ShortenConfig::default())
    }

    /// Creates a new service with a custom configuration.
    pub fn with_config(
        store: Arc<S>,
        cache: Arc<C>,
        generator: G,
        config: ShortenConfig,
    ) -> Self {
        Self {
            store,
            cache,
            generator,
            config,
        }
    }

    /// Creates a shortened URL and returns the stored record.
    pub async fn create(&self, params: CreateParams) -> Result<UrlRecord, ShortenError> {
        validate_url(&params.target_url)?;
        let expires_at = expiry_deadline(params.expires_in, Timestamp::now())?;

        let short_code = match params.custom_alias {
            Some(alias) => {
                let code = ShortCode::new(alias)?;
                if self
                    .store
                    .exists(&code)
                    .await
                    .map_err(storage_to_shorten_error)?
                {
                    return Err(ShortenError::AliasTaken(code.to_string()));
                }
                code
            }
            None => self.generate_unique_code().await?,
        };

        let record = self
            .store
            .insert(NewUrlRecord {
                short_code,
                target_url: params.target_url,
                owner_id: params.owner_id,
                expires_at,
            })
            .await
            .map_err(storage_to_shorten_error)?;

        // Write-through: the same TTL rule the resolver applies on a miss.
        if let Some(ttl) = cache_ttl(
            self.config.default_cache_ttl,
            record.expires_at,
            Timestamp::now(),
        ) {
            if let Err(e) = self
                .cache
                .set(&record.short_code, &record.target_url, ttl)
                .await
            {
                warn!(code = %record.short_code, error = %e, "failed to write-through cache");
            }
        }

        debug!(code = %record.short_code, owner = %record.owner_id, "created shortened URL");
        Ok(record)
    }

    /// Lists the owner's records, newest first, paginated.
    pub async fn list(
        &self,
        owner: &OwnerId,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<UrlRecord>, ShortenError> {
        self.store
            .list_by_owner(owner, limit, skip)
            .await
            .map_err(storage_to_shorten_error)
    }

    /// Deletes the owner's record for a short code.
    ///
    /// The cache entry is evicted whether or not a record matched, so a
    /// repeated delete still clears a lingering entry. Returns whether a
    /// record was actually deleted.
    pub async fn delete(&self, owner: &OwnerId, code: &ShortCode) -> Result<bool, ShortenError> {
        let deleted = self
            .store
            .delete_by_owner_and_code(owner, code)
            .await
            .map_err(storage_to_shorten_error)?;

        if let Err(e) = self.cache.del(code).await {
            warn!(code = %code, error = %e, "failed to evict cache entry on delete");
        }

        debug!(code = %code, owner = %owner, deleted, "delete shortened URL");
        Ok(deleted)
    }

    /// Fetches the owner's record together with on-demand analytics.
    ///
    /// `total_clicks` counts event-log rows and is authoritative; the
    /// record's own counter is best-effort and not consulted.
    pub async fn get_with_analytics(
        &self,
        owner: &OwnerId,
        code: &ShortCode,
    ) -> Result<Option<(UrlRecord, UrlAnalytics)>, ShortenError> {
        let Some(record) = self
            .store
            .find_by_owner_and_code(owner, code)
            .await
            .map_err(storage_to_shorten_error)?
        else {
            return Ok(None);
        };

        let total_clicks = self
            .store
            .count_click_events(code)
            .await
            .map_err(storage_to_shorten_error)?;
        let last_clicked_at = self
            .store
            .latest_click_event(code)
            .await
            .map_err(storage_to_shorten_error)?
            .map(|event| event.created_at);

        let analytics = UrlAnalytics {
            short_code: code.clone(),
            total_clicks,
            last_clicked_at,
        };
        Ok(Some((record, analytics)))
    }

    async fn generate_unique_code(&self) -> Result<ShortCode, ShortenError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = self.generator.generate();
            if !self
                .store
                .exists(&candidate)
                .await
                .map_err(storage_to_shorten_error)?
            {
                return Ok(candidate);
            }
            trace!(attempt, code = %candidate, "generated code collided, retrying");
        }

        warn!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "short-code generation exhausted"
        );
        Err(ShortenError::GenerationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }
}

/// Validates that the URL is absolute with an http(s) scheme and a host.
fn validate_url(url: &str) -> Result<(), ShortenError> {
    if url.is_empty() {
        return Err(ShortenError::InvalidUrl("URL cannot be empty".to_string()));
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(ShortenError::InvalidUrl(format!(
            "URL must have a valid scheme and host: {}",
            url
        )));
    };

    if scheme.is_empty() || rest.is_empty() {
        return Err(ShortenError::InvalidUrl(format!(
            "URL must have a valid scheme and host: {}",
            url
        )));
    }

    let scheme = scheme.to_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(ShortenError::InvalidUrl(format!(
            "URL scheme must be http or https: {}",
            scheme
        )));
    }

    Ok(())
}

/// Converts the requested lifetime into an absolute deadline.
fn expiry_deadline(
    expires_in: Option<Duration>,
    now: Timestamp,
) -> Result<Option<Timestamp>, ShortenError> {
    let Some(expires_in) = expires_in else {
        return Ok(None);
    };

    if !(MIN_EXPIRES_IN..=MAX_EXPIRES_IN).contains(&expires_in) {
        return Err(ShortenError::InvalidExpiry(format!(
            "lifetime must be between {} and {} seconds, got {}",
            MIN_EXPIRES_IN.as_secs(),
            MAX_EXPIRES_IN.as_secs(),
            expires_in.as_secs()
        )));
    }

    let expires_in = SignedDuration::try_from(expires_in)
        .map_err(|e| ShortenError::InvalidExpiry(e.to_string()))?;
    Ok(Some(now + expires_in))
}

/// Converts a StorageError to a ShortenError.
///
/// A store-level conflict means the alias lost the uniqueness race,
/// whether or not the pre-check saw it first.
fn storage_to_shorten_error(e: StorageError) -> ShortenError {
    match e {
        StorageError::Conflict(code) => ShortenError::AliasTaken(code),
        other => ShortenError::Storage(other.to_string()),
    }
}
