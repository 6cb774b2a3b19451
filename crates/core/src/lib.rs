use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod product;
pub mod source;

pub use product::{
    ClientIdentity, Identifier, Product, ScrapeResult, SheetRow, TargetSite, DEFAULT_ACCEPT_LANGUAGE,
    DEFAULT_DOMAIN, DEFAULT_USER_AGENT, ERROR_SENTINEL, PRICE_NOT_FOUND, STATUS_OK,
    TITLE_CELL_LIMIT, TITLE_NOT_FOUND,
};
pub use source::{split_list, EnvListSource, StaticSource, DEFAULT_IDENTIFIERS};

/// Failure categories for a single identifier's scrape
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScrapeErrorKind {
    /// Page did not finish loading within the navigation timeout
    NavigationTimeout,
    /// The content marker never appeared within the selector timeout
    SelectorTimeout,
    /// Page loaded but its content could not be read or parsed
    ExtractionFailed,
    /// Browser, transport or anything else
    Unknown,
}

/// Per-identifier failure. The message is what ends up in the status cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ScrapeError {
    pub kind: ScrapeErrorKind,
    pub message: String,
}

impl ScrapeError {
    pub fn new(kind: ScrapeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn navigation_timeout(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorKind::NavigationTimeout, message)
    }

    pub fn selector_timeout(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorKind::SelectorTimeout, message)
    }

    pub fn extraction_failed(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorKind::ExtractionFailed, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ScrapeErrorKind::Unknown, message)
    }
}

/// Run-level failure to produce the identifier list
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read identifiers from {source_name}: {message}")]
    Read { source_name: String, message: String },
}

/// Loads one product page and pulls title and price out of it.
///
/// Implementations must not panic on bad pages; every failure comes back as
/// a [`ScrapeError`] so the batch can carry on with the next identifier.
#[async_trait]
pub trait ProductScraper: Send + Sync {
    async fn scrape(&self, identifier: &Identifier) -> Result<Product, ScrapeError>;

    /// Release long-lived resources (a shared browser, for instance).
    async fn shutdown(&self) {}
}

/// Produces the ordered identifiers for one run
#[async_trait]
pub trait IdentifierSource: Send + Sync {
    async fn resolve(&self) -> Result<Vec<Identifier>, SourceError>;

    fn describe(&self) -> String;
}
