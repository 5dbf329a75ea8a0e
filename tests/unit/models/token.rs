//! Unit tests for the cached-token model

use alphasignal::models::token::{CachedToken, DEFAULT_TTL_SECONDS, EXPIRY_MARGIN_SECONDS};
use chrono::{Duration, Utc};

#[test]
fn expiry_margin_is_applied() {
    let now = Utc::now();
    let token = CachedToken::from_response("abc".to_string(), Some(3600), now);
    assert_eq!(token.expires_at, now + Duration::seconds(3600 - EXPIRY_MARGIN_SECONDS));
}

#[test]
fn missing_expires_in_falls_back_to_24h() {
    let now = Utc::now();
    let token = CachedToken::from_response("abc".to_string(), None, now);
    assert_eq!(
        token.expires_at,
        now + Duration::seconds(DEFAULT_TTL_SECONDS - EXPIRY_MARGIN_SECONDS)
    );
}

#[test]
fn tiny_lifetime_never_goes_negative() {
    let now = Utc::now();
    let token = CachedToken::from_response("abc".to_string(), Some(10), now);
    assert_eq!(token.expires_at, now);
    assert!(token.is_expired(now));
}

#[test]
fn expiry_check_is_inclusive() {
    let now = Utc::now();
    let token = CachedToken {
        access_token: "abc".to_string(),
        expires_at: now,
    };
    assert!(token.is_expired(now));
    assert!(!token.is_expired(now - Duration::seconds(1)));
}

#[test]
fn token_round_trips_through_json() {
    let now = Utc::now();
    let token = CachedToken::from_response("tok-123".to_string(), Some(86400), now);
    let json = serde_json::to_string(&token).unwrap();
    let parsed: CachedToken = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.access_token, "tok-123");
    assert_eq!(parsed.expires_at, token.expires_at);
}
