//! Unit tests for LLM score extraction

use alphasignal::services::llm::extract_score;

#[test]
fn plain_number_reply() {
    assert_eq!(extract_score("85"), Some(85));
}

#[test]
fn number_embedded_in_narrative() {
    assert_eq!(
        extract_score("Considering recent news flow I would rate this 72 out of 100."),
        Some(72)
    );
}

#[test]
fn first_number_wins() {
    assert_eq!(extract_score("Score: 60. Confidence: 90%."), Some(60));
}

#[test]
fn out_of_range_values_are_clamped() {
    assert_eq!(extract_score("150"), Some(100));
    assert_eq!(extract_score("0"), Some(0));
}

#[test]
fn reply_without_digits_yields_none() {
    assert_eq!(extract_score("I cannot rate this instrument."), None);
    assert_eq!(extract_score(""), None);
}
