//! Tabular view of SELECT results.

use crate::cursor::Record;
use crate::error::ChainResult;
use serde::Serialize;
use serde_json::Value;

/// Column-named table of JSON cells.
///
/// Built from a non-empty row sequence; column names come from the first row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Convert rows into a frame. Returns `None` for an empty sequence.
    pub fn from_records<R: Record>(records: &[R]) -> ChainResult<Option<Self>> {
        let Some(first) = records.first() else {
            return Ok(None);
        };
        let columns = first.columns();
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut cells = Vec::with_capacity(columns.len());
            for column in &columns {
                cells.push(record.value(column)?);
            }
            rows.push(cells);
        }
        Ok(Some(Self { columns, rows }))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row `idx`, cells in column order.
    pub fn row(&self, idx: usize) -> Option<&[Value]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Every cell of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|cells| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(cells.iter().cloned())
                    .collect()
            })
            .collect()
    }
}
