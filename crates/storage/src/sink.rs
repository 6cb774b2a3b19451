use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use pricewatch_core::{ScrapeResult, SheetRow};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::sheets::{SheetTarget, SpreadsheetApi};

/// Where a finished run's results go.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn save_results(&self, results: &[ScrapeResult]) -> Result<()>;

    fn describe(&self) -> String;
}

pub fn rows_for(results: &[ScrapeResult]) -> Vec<Vec<String>> {
    results.iter().map(|r| r.to_row().into_cells()).collect()
}

/// Bulk overwrite of the result range in one API call.
pub struct SheetSink {
    api: Arc<dyn SpreadsheetApi>,
    target: SheetTarget,
}

impl SheetSink {
    pub fn new(api: Arc<dyn SpreadsheetApi>, target: SheetTarget) -> Self {
        Self { api, target }
    }
}

#[async_trait]
impl ResultSink for SheetSink {
    async fn save_results(&self, results: &[ScrapeResult]) -> Result<()> {
        if results.is_empty() {
            return Ok(());
        }

        let range = self.target.result_range(results.len());
        let summary = self
            .api
            .update_values(&self.target.spreadsheet_id, &range, rows_for(results))
            .await
            .with_context(|| format!("writing {} rows to {}", results.len(), range))?;

        info!(
            range = %summary.updated_range,
            rows = summary.updated_rows,
            cells = summary.updated_cells,
            "sheet updated"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("spreadsheet {} ({})", self.target.spreadsheet_id, self.target.sheet_name)
    }
}

/// Tab-separated rows on stdout, header first.
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn render(results: &[ScrapeResult]) -> String {
        let mut out = SheetRow::HEADERS.join("\t");
        out.push('\n');
        for row in rows_for(results) {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }
}

#[async_trait]
impl ResultSink for ConsoleSink {
    async fn save_results(&self, results: &[ScrapeResult]) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(Self::render(results).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        "console".to_string()
    }
}

/// One pretty-printed JSON document per run.
pub struct JsonFileStorage {
    pub folder: PathBuf,
}

impl JsonFileStorage {
    pub fn new(folder: impl AsRef<Path>) -> Self {
        Self { folder: folder.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl ResultSink for JsonFileStorage {
    async fn save_results(&self, results: &[ScrapeResult]) -> Result<()> {
        tokio::fs::create_dir_all(&self.folder)
            .await
            .with_context(|| format!("creating {}", self.folder.display()))?;

        let path = self
            .folder
            .join(format!("run-{}.json", Utc::now().format("%Y%m%dT%H%M%S%3fZ")));
        let data = serde_json::to_string_pretty(results)?;
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        info!(path = %path.display(), results = results.len(), "results saved");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json files in {}", self.folder.display())
    }
}
