use async_trait::async_trait;

use crate::{Identifier, IdentifierSource, SourceError};

/// Tracked when nothing else is configured.
pub const DEFAULT_IDENTIFIERS: &[&str] = &["B0DT6LG363", "B09FKZR5FW"];

/// A fixed list, in the order given.
pub struct StaticSource {
    identifiers: Vec<Identifier>,
}

impl StaticSource {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Identifier>,
    {
        Self {
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for StaticSource {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTIFIERS.iter().copied())
    }
}

#[async_trait]
impl IdentifierSource for StaticSource {
    async fn resolve(&self) -> Result<Vec<Identifier>, SourceError> {
        Ok(self.identifiers.clone())
    }

    fn describe(&self) -> String {
        format!("static list ({} entries)", self.identifiers.len())
    }
}

/// Comma-separated list taken from an environment variable.
pub struct EnvListSource {
    var: String,
    raw: String,
}

impl EnvListSource {
    pub fn new(var: impl Into<String>, raw: impl Into<String>) -> Self {
        Self { var: var.into(), raw: raw.into() }
    }
}

/// One identifier per comma-separated entry, surrounding whitespace removed.
/// Empty entries are kept so every entry maps to one result row; only a
/// blank list yields nothing.
pub fn split_list(raw: &str) -> Vec<Identifier> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::trim).map(Identifier::from).collect()
}

#[async_trait]
impl IdentifierSource for EnvListSource {
    async fn resolve(&self) -> Result<Vec<Identifier>, SourceError> {
        Ok(split_list(&self.raw))
    }

    fn describe(&self) -> String {
        format!("environment variable {}", self.var)
    }
}
