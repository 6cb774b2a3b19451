use async_trait::async_trait;
use pricewatch_core::{Identifier, IdentifierSource, SourceError};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::sheets::{SheetTarget, SpreadsheetApi};

/// Identifiers kept in column A of the destination sheet.
pub struct SheetColumnSource {
    api: Arc<dyn SpreadsheetApi>,
    target: SheetTarget,
}

impl SheetColumnSource {
    pub fn new(api: Arc<dyn SpreadsheetApi>, target: SheetTarget) -> Self {
        Self { api, target }
    }
}

/// First cell of each row, blanks dropped, order kept.
pub fn column_identifiers(rows: &[Vec<Value>]) -> Vec<Identifier> {
    rows.iter()
        .filter_map(|row| row.first())
        .filter_map(|cell| match cell {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|code| !code.is_empty())
        .map(Identifier::from)
        .collect()
}

#[async_trait]
impl IdentifierSource for SheetColumnSource {
    async fn resolve(&self) -> Result<Vec<Identifier>, SourceError> {
        let range = self.target.identifier_column_range();
        let rows = self
            .api
            .get_values(&self.target.spreadsheet_id, &range)
            .await
            .map_err(|e| SourceError::Read {
                source_name: self.describe(),
                message: e.to_string(),
            })?;

        let ids = column_identifiers(&rows);
        info!(%range, rows = rows.len(), identifiers = ids.len(), "read identifier column");
        Ok(ids)
    }

    fn describe(&self) -> String {
        format!("spreadsheet column {}", self.target.identifier_column_range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blanks_are_filtered_in_order() {
        let rows = vec![vec![json!("X1")], vec![json!("")], vec![json!("X2")]];
        assert_eq!(column_identifiers(&rows), vec![Identifier::from("X1"), Identifier::from("X2")]);
    }

    #[test]
    fn empty_rows_and_whitespace_cells_are_skipped() {
        let rows = vec![vec![], vec![json!("  ")], vec![json!(" B0DT6LG363 "), json!("old title")], vec![json!(12345)]];
        assert_eq!(
            column_identifiers(&rows),
            vec![Identifier::from("B0DT6LG363"), Identifier::from("12345")]
        );
    }
}
