//! Unit tests for plan tiers and market kinds

use alphasignal::models::watchlist::{MarketKind, Plan};

#[test]
fn plan_limits_match_tiers() {
    assert_eq!(Plan::Free.max_signals(), 1);
    assert_eq!(Plan::Basic.max_signals(), 5);
    assert_eq!(Plan::Pro.max_signals(), 20);
}

#[test]
fn unknown_plan_names_fall_back_to_free() {
    assert_eq!(Plan::parse("basic"), Plan::Basic);
    assert_eq!(Plan::parse("pro"), Plan::Pro);
    assert_eq!(Plan::parse("free"), Plan::Free);
    assert_eq!(Plan::parse("enterprise"), Plan::Free);
    assert_eq!(Plan::parse(""), Plan::Free);
}

#[test]
fn market_kind_round_trips() {
    for kind in [MarketKind::Kr, MarketKind::Global, MarketKind::Crypto] {
        assert_eq!(MarketKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(MarketKind::parse("bond"), None);
}

#[test]
fn market_kind_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&MarketKind::Kr).unwrap(), "\"kr\"");
    let parsed: MarketKind = serde_json::from_str("\"crypto\"").unwrap();
    assert_eq!(parsed, MarketKind::Crypto);
}
