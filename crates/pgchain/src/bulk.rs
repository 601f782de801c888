//! Bulk-render path for multi-row INSERT.
//!
//! [`BulkRows`] holds column names and a row matrix. The statement renders it
//! as a single `VALUES ($1,$2),($3,$4),...` clause, so the whole batch goes to
//! the server in one round trip.
//!
//! # Example
//! ```ignore
//! use pgchain::{BulkRows, Param, Statement};
//!
//! let rows = BulkRows::new(["name", "age"])
//!     .row([Param::new("Ada"), Param::new(36i32)])?
//!     .row([Param::new("Grace"), Param::new(45i32)])?;
//! let stmt = Statement::new("users").insert_bulk(rows);
//! # Ok::<(), pgchain::ChainError>(())
//! ```

use crate::error::{ChainError, ChainResult};
use crate::fields::Fields;
use crate::param::Param;
use std::fmt::Write;

/// Largest number of bind parameters PostgreSQL accepts in one statement.
pub const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// Tabular input for [`Statement::insert_bulk`](crate::Statement::insert_bulk).
#[derive(Clone, Debug, Default)]
pub struct BulkRows {
    columns: Vec<String>,
    rows: Vec<Vec<Param>>,
}

impl BulkRows {
    /// Start a batch with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a batch from a sequence of [`Fields`].
    ///
    /// Column order is taken from the first entry; every other entry must set
    /// exactly the same columns (in any order).
    pub fn from_fields(entries: impl IntoIterator<Item = Fields>) -> ChainResult<Self> {
        let mut iter = entries.into_iter();
        let Some(first) = iter.next() else {
            return Ok(Self::default());
        };
        let columns: Vec<String> = first.names().map(str::to_string).collect();
        let mut out = Self {
            rows: vec![first.into_iter().map(|(_, v)| v).collect()],
            columns,
        };
        for (i, fields) in iter.enumerate() {
            if fields.len() != out.columns.len() {
                return Err(ChainError::validation(format!(
                    "bulk row {} sets {} column(s), expected {}",
                    i + 1,
                    fields.len(),
                    out.columns.len()
                )));
            }
            let mut row = Vec::with_capacity(out.columns.len());
            for column in &out.columns {
                let value = fields.get(column).ok_or_else(|| {
                    ChainError::validation(format!(
                        "bulk row {} is missing column '{column}'",
                        i + 1
                    ))
                })?;
                row.push(value.clone());
            }
            out.rows.push(row);
        }
        Ok(out)
    }

    /// Append one row, consuming and returning the batch.
    pub fn row(mut self, values: impl IntoIterator<Item = Param>) -> ChainResult<Self> {
        self.push_row(values)?;
        Ok(self)
    }

    /// Append one row. Its width must match the column count.
    pub fn push_row(&mut self, values: impl IntoIterator<Item = Param>) -> ChainResult<()> {
        let row: Vec<Param> = values.into_iter().collect();
        if row.len() != self.columns.len() {
            return Err(ChainError::validation(format!(
                "bulk row has {} value(s), expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of bound values the batch contributes.
    pub fn value_count(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    /// Check the batch can be rendered as one statement.
    pub(crate) fn validate(&self) -> ChainResult<()> {
        if self.columns.is_empty() {
            return Err(ChainError::validation("bulk insert requires at least one column"));
        }
        if self.rows.is_empty() {
            return Err(ChainError::validation("bulk insert requires at least one row"));
        }
        if let Some(bad) = self.rows.iter().position(|r| r.len() != self.columns.len()) {
            return Err(ChainError::validation(format!(
                "bulk row {bad} has {} value(s), expected {}",
                self.rows[bad].len(),
                self.columns.len()
            )));
        }
        if self.value_count() > MAX_BIND_PARAMS {
            return Err(ChainError::validation(format!(
                "bulk insert binds {} values, PostgreSQL accepts at most {MAX_BIND_PARAMS}",
                self.value_count()
            )));
        }
        Ok(())
    }

    /// Write `($n,$n+1),(...)` placeholders, advancing `next` past the last one.
    pub(crate) fn write_placeholders(&self, out: &mut String, next: &mut usize) {
        for (r, row) in self.rows.iter().enumerate() {
            if r > 0 {
                out.push(',');
            }
            out.push('(');
            for c in 0..row.len() {
                if c > 0 {
                    out.push(',');
                }
                let _ = write!(out, "${}", *next);
                *next += 1;
            }
            out.push(')');
        }
    }

    /// Write the rows with literal values, for diagnostics.
    pub(crate) fn write_literals(&self, out: &mut String) {
        for (r, row) in self.rows.iter().enumerate() {
            if r > 0 {
                out.push(',');
            }
            out.push('(');
            for (c, value) in row.iter().enumerate() {
                if c > 0 {
                    out.push(',');
                }
                out.push_str(&value.literal());
            }
            out.push(')');
        }
    }

    /// Values in row-major order.
    pub(crate) fn values(&self) -> impl Iterator<Item = &Param> {
        self.rows.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> BulkRows {
        BulkRows::new(["name", "age"])
            .row([Param::new("Ada"), Param::new(36i32)])
            .unwrap()
            .row([Param::new("Grace"), Param::new(45i32)])
            .unwrap()
    }

    #[test]
    fn placeholders_number_row_major() {
        let rows = two_by_two();
        let mut out = String::new();
        let mut next = 1;
        rows.write_placeholders(&mut out, &mut next);
        assert_eq!(out, "($1,$2),($3,$4)");
        assert_eq!(next, 5);
        assert_eq!(rows.value_count(), 4);
    }

    #[test]
    fn placeholders_continue_from_offset() {
        let rows = two_by_two();
        let mut out = String::new();
        let mut next = 3;
        rows.write_placeholders(&mut out, &mut next);
        assert_eq!(out, "($3,$4),($5,$6)");
    }

    #[test]
    fn literals_render_row_values() {
        let mut out = String::new();
        two_by_two().write_literals(&mut out);
        assert_eq!(out, "(Ada,36),(Grace,45)");
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = BulkRows::new(["a", "b"]).row([Param::new(1i32)]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn rejects_empty_batch() {
        assert!(BulkRows::new(["a"]).validate().is_err());
        assert!(BulkRows::default().validate().is_err());
    }

    #[test]
    fn rejects_batches_over_the_bind_limit() {
        let mut rows = BulkRows::new(["a", "b"]);
        for i in 0..(MAX_BIND_PARAMS / 2 + 1) {
            rows.push_row([Param::new(i as i64), Param::new(i as i64)]).unwrap();
        }
        let err = rows.validate().unwrap_err();
        assert!(err.to_string().contains("at most 65535"));
    }

    #[test]
    fn from_fields_aligns_by_column_name() {
        let rows = BulkRows::from_fields([
            Fields::new().set("name", "Ada").set("age", 36i32),
            Fields::new().set("age", 45i32).set("name", "Grace"),
        ])
        .unwrap();
        assert_eq!(rows.columns(), ["name", "age"]);
        let literals: Vec<String> = rows.values().map(Param::literal).collect();
        assert_eq!(literals, ["Ada", "36", "Grace", "45"]);
    }

    #[test]
    fn from_fields_rejects_missing_columns() {
        let err = BulkRows::from_fields([
            Fields::new().set("name", "Ada").set("age", 36i32),
            Fields::new().set("name", "Grace").set("email", "g@example.com"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("missing column 'age'"));
    }
}
