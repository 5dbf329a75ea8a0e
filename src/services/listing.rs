//! Exchange instrument-listing fetcher
//!
//! Downloads the exchange's full corporate listing (an EUC-KR encoded CSV),
//! decodes it, and extracts company name + issue code pairs for the local
//! reference table.

use crate::models::news::ListedStock;
use encoding_rs::EUC_KR;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const NAME_COLUMN: &str = "회사명";
const CODE_COLUMN: &str = "종목코드";

pub struct ListingClient {
    http: reqwest::Client,
    listing_url: String,
}

impl ListingClient {
    pub fn new(listing_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            listing_url: listing_url.to_string(),
        }
    }

    /// Fetch and parse the full listing.
    pub async fn fetch_listing(&self) -> Result<Vec<ListedStock>, BoxError> {
        let response = self
            .http
            .get(&self.listing_url)
            .send()
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Box::new(std::io::Error::other(format!(
                "Listing download returned {}",
                status
            ))));
        }

        let bytes = response.bytes().await.map_err(|e| Box::new(e) as BoxError)?;
        let (decoded, _, _) = EUC_KR.decode(&bytes);

        parse_listing_csv(&decoded)
    }
}

/// Parse the decoded listing CSV. The header row locates the name and code
/// columns; issue codes are zero-padded to six digits.
pub fn parse_listing_csv(csv: &str) -> Result<Vec<ListedStock>, BoxError> {
    let mut lines = csv.lines();
    let header = lines.next().ok_or_else(|| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Empty listing CSV",
        )) as BoxError
    })?;

    let columns = split_csv_line(header);
    let name_idx = columns.iter().position(|c| c == NAME_COLUMN);
    let code_idx = columns.iter().position(|c| c == CODE_COLUMN);

    let (name_idx, code_idx) = match (name_idx, code_idx) {
        (Some(n), Some(c)) => (n, c),
        _ => {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Listing CSV missing expected columns, got: {}", header),
            )));
        }
    };

    let mut stocks = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_csv_line(line);
        let name = fields.get(name_idx).map(|s| s.trim()).unwrap_or("");
        let code = fields.get(code_idx).map(|s| s.trim()).unwrap_or("");
        if name.is_empty() || code.is_empty() {
            continue;
        }

        stocks.push(ListedStock {
            code: format!("{:0>6}", code),
            name: name.to_string(),
        });
    }

    Ok(stocks)
}

/// Split one CSV line honoring double-quoted fields ("" escapes a quote).
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields
}
