use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::auth::{AuthError, Authenticator};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Results start right under the header row.
pub const FIRST_DATA_ROW: usize = 2;

/// A tab inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

impl SheetTarget {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }

    /// Sheet name as it must appear in A1 notation.
    pub fn a1_sheet(&self) -> String {
        let plain = self
            .sheet_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if plain {
            self.sheet_name.clone()
        } else {
            format!("'{}'", self.sheet_name.replace('\'', "''"))
        }
    }

    /// `A2:E<n+1>`, sized to exactly `rows` result rows.
    pub fn result_range(&self, rows: usize) -> String {
        let last = FIRST_DATA_ROW + rows.max(1) - 1;
        format!("{}!A{}:E{}", self.a1_sheet(), FIRST_DATA_ROW, last)
    }

    /// Column A below the header, open-ended.
    pub fn identifier_column_range(&self) -> String {
        format!("{}!A{}:A", self.a1_sheet(), FIRST_DATA_ROW)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("sheets request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sheets API answered {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("cannot build request URL: {0}")]
    Url(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSummary {
    pub updated_range: String,
    pub updated_rows: u64,
    pub updated_cells: u64,
}

/// The two spreadsheet calls a run needs.
#[async_trait]
pub trait SpreadsheetApi: Send + Sync {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<Value>>, SheetsError>;

    /// Overwrites `range` with `rows` in one call (`USER_ENTERED`).
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<UpdateSummary, SheetsError>;
}

/// Sheets API v4 over reqwest.
pub struct SheetsClient {
    http: Client,
    base: Url,
    auth: Authenticator,
}

impl SheetsClient {
    pub fn new(http: Client, auth: Authenticator) -> Result<Self, SheetsError> {
        Self::with_base(http, auth, SHEETS_API_BASE)
    }

    pub fn with_base(http: Client, auth: Authenticator, base: &str) -> Result<Self, SheetsError> {
        let base = Url::parse(base).map_err(|e| SheetsError::Url(e.to_string()))?;
        Ok(Self { http, base, auth })
    }

    pub fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, SheetsError> {
        values_url(&self.base, spreadsheet_id, range)
    }
}

pub fn values_url(base: &Url, spreadsheet_id: &str, range: &str) -> Result<Url, SheetsError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SheetsError::Url(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
    Ok(url)
}

async fn api_error(response: reqwest::Response) -> SheetsError {
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Envelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    SheetsError::Api { status, message }
}

#[async_trait]
impl SpreadsheetApi for SheetsClient {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<Value>>, SheetsError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let token = self.auth.access_token().await?;
        debug!(%url, "values.get");

        let response = self.http.get(url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json::<ValueRange>().await?.values)
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<UpdateSummary, SheetsError> {
        let mut url = self.values_url(spreadsheet_id, range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "USER_ENTERED");
        let token = self.auth.access_token().await?;
        debug!(%url, rows = rows.len(), "values.update");

        let body = serde_json::json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });
        let response = self.http.put(url).bearer_auth(token).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json::<UpdateSummary>().await?)
    }
}
