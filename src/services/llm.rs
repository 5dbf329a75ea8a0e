//! LLM scoring client (OpenAI-style chat completions)

use crate::models::watchlist::WatchlistItem;
use regex::Regex;
use serde::{Deserialize, Serialize};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one scoring call: the extracted score (when the reply contained
/// one) and the full narrative text.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub score: Option<u8>,
    pub text: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(base_url: &str, api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Ask the model for a 0-100 attractiveness score for one instrument.
    pub async fn analyze(&self, item: &WatchlistItem) -> Result<Analysis, BoxError> {
        let prompt = format!(
            "Instrument name: {}\n\
             Symbol/ticker: {}\n\
             Market segment: {}\n\n\
             Rate the overall investment attractiveness of this instrument on a\n\
             scale of 0 to 100, considering:\n\
             1. Recent news flow\n\
             2. Trading volume changes\n\
             3. Technical picture (chart patterns, support/resistance)\n\
             4. A brief fundamental assessment\n\n\
             Answer with the score as a number.",
            item.name,
            item.symbol,
            item.market.as_str(),
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: 0.7,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Box::new(std::io::Error::other(format!(
                "LLM API returned {}: {}",
                status, body
            ))));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        Ok(Analysis {
            score: extract_score(&text),
            text,
        })
    }
}

/// First integer in the reply, clamped to 0-100. Replies with no digits
/// yield None and the item is skipped by the caller.
pub fn extract_score(text: &str) -> Option<u8> {
    let re = Regex::new(r"\d+").ok()?;
    let digits = re.find(text)?.as_str();
    let value: u64 = digits.parse().ok()?;
    Some(value.min(100) as u8)
}
