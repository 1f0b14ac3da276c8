use crate::owner::OwnerId;
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored URL record in the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Durable identifier assigned by the store.
    pub id: String,
    /// The unique short code mapping to the target.
    pub short_code: ShortCode,
    /// The absolute URL the short code redirects to.
    pub target_url: String,
    /// The owning user. Records are deleted by explicit owner action,
    /// never cascaded.
    pub owner_id: OwnerId,
    /// When the record expires, if ever.
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Best-effort counter maintained by the click worker only.
    pub click_count: u64,
    /// Maintained by the click worker only.
    pub last_clicked_at: Option<Timestamp>,
}

impl UrlRecord {
    /// Returns `true` if the record has an expiration in the past.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Returns `true` if the record is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}

/// A URL record as submitted for insertion.
///
/// The store assigns the durable id and the creation timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUrlRecord {
    pub short_code: ShortCode,
    pub target_url: String,
    pub owner_id: OwnerId,
    pub expires_at: Option<Timestamp>,
}

/// A single recorded visit to a short code. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub short_code: ShortCode,
    pub created_at: Timestamp,
}

/// Analytics derived from the click-event log.
///
/// `total_clicks` counts event rows and is authoritative; it is
/// independent of the best-effort `click_count` field on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlAnalytics {
    pub short_code: ShortCode,
    pub total_clicks: u64,
    pub last_clicked_at: Option<Timestamp>,
}
