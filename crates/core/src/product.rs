use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ScrapeError;

pub const TITLE_NOT_FOUND: &str = "Title not found";
pub const PRICE_NOT_FOUND: &str = "Price not found";
pub const ERROR_SENTINEL: &str = "Error";
pub const STATUS_OK: &str = "OK";

/// Titles are cut to this many characters when written to a row.
pub const TITLE_CELL_LIMIT: usize = 150;

pub const DEFAULT_DOMAIN: &str = "www.amazon.co.uk";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-GB,en;q=0.9";

/// Opaque product code (an ASIN on Amazon).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for Identifier {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The retail site product pages are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSite {
    pub domain: String,
    pub scheme: String,
}

impl TargetSite {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            scheme: "https".to_string(),
        }
    }

    /// Plain `http` is only useful against a local mirror.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn product_url(&self, identifier: &Identifier) -> String {
        format!("{}://{}/dp/{}", self.scheme, self.domain, identifier)
    }
}

impl Default for TargetSite {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN)
    }
}

/// What the scraper presents itself as to the target site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

/// Extracted fields. Either may hold its "not found" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    pub price: String,
}

impl Product {
    /// Substitutes sentinels for missing fields.
    pub fn from_parts(title: Option<String>, price: Option<String>) -> Self {
        Self {
            title: title.unwrap_or_else(|| TITLE_NOT_FOUND.to_string()),
            price: price.unwrap_or_else(|| PRICE_NOT_FOUND.to_string()),
        }
    }
}

/// One identifier's outcome for a run. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub identifier: Identifier,
    pub outcome: Result<Product, ScrapeError>,
    pub timestamp: DateTime<Utc>,
}

impl ScrapeResult {
    pub fn new(identifier: Identifier, outcome: Result<Product, ScrapeError>) -> Self {
        Self::at(identifier, outcome, Utc::now())
    }

    pub fn at(
        identifier: Identifier,
        outcome: Result<Product, ScrapeError>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { identifier, outcome, timestamp }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn title(&self) -> &str {
        match &self.outcome {
            Ok(product) => &product.title,
            Err(_) => ERROR_SENTINEL,
        }
    }

    pub fn price(&self) -> &str {
        match &self.outcome {
            Ok(product) => &product.price,
            Err(_) => ERROR_SENTINEL,
        }
    }

    pub fn status(&self) -> &str {
        match &self.outcome {
            Ok(_) => STATUS_OK,
            Err(err) => &err.message,
        }
    }

    /// ISO-8601 in UTC with millisecond precision, e.g. `2025-01-31T09:15:02.118Z`.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn to_row(&self) -> SheetRow {
        SheetRow {
            identifier: self.identifier.to_string(),
            title: truncate_chars(self.title(), TITLE_CELL_LIMIT).to_string(),
            price: self.price().to_string(),
            timestamp: self.timestamp_iso(),
            status: self.status().to_string(),
        }
    }
}

/// A result as it lands in the spreadsheet: A..E.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    pub identifier: String,
    pub title: String,
    pub price: String,
    pub timestamp: String,
    pub status: String,
}

impl SheetRow {
    pub const HEADERS: [&'static str; 5] = ["ASIN", "Title", "Price", "Last Updated", "Status"];

    pub fn into_cells(self) -> Vec<String> {
        vec![self.identifier, self.title, self.price, self.timestamp, self.status]
    }
}

/// Cuts at a char boundary so multi-byte titles never split mid-codepoint.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScrapeErrorKind;

    fn ok(title: &str, price: &str) -> Result<Product, ScrapeError> {
        Ok(Product { title: title.into(), price: price.into() })
    }

    #[test]
    fn product_url_uses_domain_and_code() {
        let site = TargetSite::default();
        assert_eq!(
            site.product_url(&Identifier::from("B0DT6LG363")),
            "https://www.amazon.co.uk/dp/B0DT6LG363"
        );
        let mirror = TargetSite::new("127.0.0.1:8080").with_scheme("http");
        assert_eq!(mirror.product_url(&"B1".into()), "http://127.0.0.1:8080/dp/B1");
    }

    #[test]
    fn row_truncates_long_titles_to_150_chars() {
        let title = "é".repeat(400);
        let row = ScrapeResult::new("B1".into(), ok(&title, "£1.00")).to_row();
        assert_eq!(row.title.chars().count(), TITLE_CELL_LIMIT);
        assert_eq!(row.status, STATUS_OK);
    }

    #[test]
    fn failed_result_projects_error_sentinels() {
        let err = ScrapeError::new(ScrapeErrorKind::NavigationTimeout, "Navigation timeout of 30000 ms exceeded");
        let row = ScrapeResult::new("B2".into(), Err(err)).to_row();
        assert_eq!(row.title, ERROR_SENTINEL);
        assert_eq!(row.price, ERROR_SENTINEL);
        assert_eq!(row.status, "Navigation timeout of 30000 ms exceeded");
    }

    #[test]
    fn missing_fields_become_sentinels() {
        let product = Product::from_parts(Some("Kettle".into()), None);
        assert_eq!(product.price, PRICE_NOT_FOUND);
        assert_eq!(Product::from_parts(None, None).title, TITLE_NOT_FOUND);
    }

    #[test]
    fn timestamp_is_iso_utc_millis() {
        let ts = DateTime::parse_from_rfc3339("2025-03-01T10:20:30.5Z").unwrap().with_timezone(&Utc);
        let result = ScrapeResult::at("B3".into(), ok("t", "p"), ts);
        assert_eq!(result.timestamp_iso(), "2025-03-01T10:20:30.500Z");
        assert_eq!(
            result.to_row().into_cells(),
            vec!["B3", "t", "p", "2025-03-01T10:20:30.500Z", "OK"]
        );
    }
}
