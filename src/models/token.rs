//! Cached access-token data model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Safety margin subtracted from the upstream-provided lifetime so a token is
/// never presented right at its expiry boundary.
pub const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Fallback lifetime when the auth response carries no `expires_in`.
pub const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;

/// A bearer token with its absolute expiry instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Build a token from an auth response, applying the expiry margin.
    pub fn from_response(access_token: String, expires_in: Option<i64>, now: DateTime<Utc>) -> Self {
        let ttl = expires_in.unwrap_or(DEFAULT_TTL_SECONDS) - EXPIRY_MARGIN_SECONDS;
        Self {
            access_token,
            expires_at: now + Duration::seconds(ttl.max(0)),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
