//! Fluent statement builder.
//!
//! A [`Statement`] is bound to one table. It is started by exactly one
//! *resetting* call (`select`, `get`, `insert`, `insert_bulk`, `update`,
//! `delete`, `raw`) and extended by *appending* calls (`where_`, `filter_by`,
//! `between`, `join`, `order_by`, `limit`, `returns`). Identifiers are quoted
//! and values are bound to `$n` placeholders at render time.
//!
//! # Example
//!
//! ```ignore
//! use pgchain::{ExecOptions, Executor, Fields, Statement};
//!
//! let stmt = Statement::new("users")
//!     .select()
//!     .filter_by(Fields::new().set("status", "active"))
//!     .order_by("created_at", "DESC")?
//!     .limit(10);
//!
//! assert_eq!(
//!     stmt.to_sql()?,
//!     r#"SELECT * FROM "users" WHERE "status" = $1 ORDER BY "created_at"DESC LIMIT $2"#
//! );
//! let rows = Executor::new(&mut cursor).execute(stmt, ExecOptions::new()).await?;
//! ```

mod builder;
mod clause;


pub use clause::{CmpOp, SortDir};

use crate::bulk::BulkRows;
use crate::error::{ChainError, ChainResult};
use crate::ident::{Ident, IntoIdent};
use crate::operation::{Operation, ResultShape};
use crate::param::{Param, ParamList};
use std::fmt::Write;
use tokio_postgres::types::ToSql;

/// A value bound positionally to one template marker.
#[derive(Debug, Clone)]
pub enum TemplateParam {
    /// A schema identifier, rendered quoted.
    Ident(Ident),
    /// A literal SQL fragment inserted verbatim.
    Raw(String),
    /// A placeholder consumed by the next bound value.
    Slot,
    /// The multi-row VALUES list of a bulk insert.
    Rows,
}

#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Marker,
}

/// A finished statement: SQL text with `$n` placeholders plus its values.
#[derive(Debug, Clone)]
pub struct Rendered {
    sql: String,
    values: ParamList,
}

impl Rendered {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &ParamList {
        &self.values
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values.as_refs()
    }
}

/// An in-progress SQL statement for one table.
///
/// Statements are single-use: build, execute once, discard.
#[must_use]
#[derive(Debug, Clone)]
pub struct Statement {
    table: Result<Ident, String>,
    operation: Option<Operation>,
    pieces: Vec<Piece>,
    params: Vec<TemplateParam>,
    values: ParamList,
    bulk: Option<BulkRows>,
    returning: bool,
    has_filter: bool,
    to_frame: bool,
    started: bool,
    build_error: Option<String>,
}

impl Statement {
    /// Create an empty statement for `table`.
    ///
    /// An invalid table name is reported when the statement is rendered.
    pub fn new(table: impl IntoIdent) -> Self {
        Self {
            table: table.into_ident().map_err(|e| e.to_string()),
            operation: None,
            pieces: Vec::new(),
            params: Vec::new(),
            values: ParamList::new(),
            bulk: None,
            returning: false,
            has_filter: false,
            to_frame: false,
            started: false,
            build_error: None,
        }
    }

    // ==================== state ====================

    /// The explicitly set operation, if any.
    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    /// The operation the executor will dispatch on: the explicit tag, or the
    /// leading keyword of the rendered SQL.
    pub fn kind(&self) -> ChainResult<Operation> {
        if let Some(op) = self.operation {
            return Ok(op);
        }
        Operation::resolve(None, &self.template_text())
    }

    /// Result shape implied by the operation and RETURNING.
    pub fn result_shape(&self) -> ChainResult<ResultShape> {
        Ok(ResultShape::of(self.kind()?, self.returning))
    }

    /// Whether `returns()` was applied.
    pub fn is_returning(&self) -> bool {
        self.returning
    }

    /// Whether a filter (WHERE) clause has been attached.
    pub fn has_filter(&self) -> bool {
        self.has_filter
    }

    /// Whether SELECT results should be converted to a [`Frame`](crate::Frame).
    pub fn wants_frame(&self) -> bool {
        self.to_frame
    }

    /// First construction defect, if any.
    pub fn build_error(&self) -> Option<&str> {
        self.build_error.as_deref()
    }

    /// Template with `{}` for each marker.
    pub fn template_text(&self) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Marker => out.push_str("{}"),
            }
        }
        out
    }

    /// Markers' values, in order.
    pub fn params(&self) -> &[TemplateParam] {
        &self.params
    }

    /// Bound slot values, in order (bulk rows excluded).
    pub fn values(&self) -> &ParamList {
        &self.values
    }

    /// Number of `Slot` entries among the params.
    pub fn slot_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| matches!(p, TemplateParam::Slot))
            .count()
    }

    // ==================== internal bookkeeping ====================

    /// Discard all template state, keeping only the table.
    fn reset(&mut self) {
        self.operation = None;
        self.pieces.clear();
        self.params.clear();
        self.values = ParamList::new();
        self.bulk = None;
        self.returning = false;
        self.has_filter = false;
        self.to_frame = false;
        self.started = true;
        self.build_error = None;
    }

    /// Record the first construction defect.
    fn fail(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }

    /// Appending calls are only valid after a resetting call.
    fn require_started(&mut self, method: &str) -> bool {
        if !self.started {
            self.fail(format!(
                "{method}() called before select/get/insert/insert_bulk/update/delete/raw"
            ));
        }
        self.started
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.pieces.last_mut() {
            Some(Piece::Text(last)) => last.push_str(text),
            _ => self.pieces.push(Piece::Text(text.to_string())),
        }
    }

    fn push_param(&mut self, param: TemplateParam) {
        self.pieces.push(Piece::Marker);
        self.params.push(param);
    }

    fn push_slot(&mut self, value: Param) {
        self.push_param(TemplateParam::Slot);
        self.values.push_param(value);
    }

    fn push_table(&mut self) {
        match self.table.clone() {
            Ok(table) => self.push_param(TemplateParam::Ident(table)),
            Err(message) => {
                self.fail(format!("invalid table name: {message}"));
                self.push_param(TemplateParam::Raw(String::new()));
            }
        }
    }

    fn push_ident_param(&mut self, name: impl IntoIdent) {
        match name.into_ident() {
            Ok(ident) => self.push_param(TemplateParam::Ident(ident)),
            Err(e) => {
                self.fail(e.to_string());
                self.push_param(TemplateParam::Raw(String::new()));
            }
        }
    }

    /// Comma-joined quoted identifiers as one raw fragment.
    fn push_ident_list<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: IntoIdent,
    {
        let mut fragment = String::new();
        let mut count = 0;
        for name in names {
            match name.into_ident() {
                Ok(ident) => {
                    if count > 0 {
                        fragment.push(',');
                    }
                    ident.write_sql(&mut fragment);
                    count += 1;
                }
                Err(e) => self.fail(e.to_string()),
            }
        }
        self.push_param(TemplateParam::Raw(fragment));
        count
    }

    /// Attach the WHERE/AND keyword for the next filter condition.
    fn push_filter_keyword(&mut self) {
        if self.has_filter {
            self.push_text(" AND ");
        } else {
            self.push_text(" WHERE ");
            self.has_filter = true;
        }
    }

    // ==================== rendering ====================

    /// Check build state and invariants without rendering.
    pub fn validate(&self) -> ChainResult<()> {
        if let Some(message) = &self.build_error {
            return Err(ChainError::Validation(message.clone()));
        }
        let markers = self
            .pieces
            .iter()
            .filter(|p| matches!(p, Piece::Marker))
            .count();
        if markers != self.params.len() {
            return Err(ChainError::validation(format!(
                "template has {markers} marker(s) but {} param(s)",
                self.params.len()
            )));
        }
        let slots = self.slot_count();
        if slots != self.values.len() {
            return Err(ChainError::SlotMismatch {
                slots,
                values: self.values.len(),
            });
        }
        let has_rows = self.params.iter().any(|p| matches!(p, TemplateParam::Rows));
        match (&self.bulk, has_rows) {
            (Some(bulk), true) => bulk.validate()?,
            (None, false) => {}
            (None, true) => return Err(ChainError::validation("VALUES marker without bulk rows")),
            (Some(_), false) => return Err(ChainError::validation("bulk rows without VALUES marker")),
        }
        Ok(())
    }

    /// Render SQL text with `$1, $2, ...` placeholders and collect the values
    /// in placeholder order.
    pub fn render(&self) -> ChainResult<Rendered> {
        self.validate()?;

        let mut sql = String::new();
        let mut values = ParamList::new();
        let mut slot_values = self.values.iter();
        let mut params = self.params.iter();
        let mut next = 1usize;

        for piece in &self.pieces {
            let param = match piece {
                Piece::Text(t) => {
                    sql.push_str(t);
                    continue;
                }
                Piece::Marker => params.next(),
            };
            match param {
                Some(TemplateParam::Ident(ident)) => ident.write_sql(&mut sql),
                Some(TemplateParam::Raw(fragment)) => sql.push_str(fragment),
                Some(TemplateParam::Slot) => {
                    let _ = write!(&mut sql, "${next}");
                    next += 1;
                    if let Some(value) = slot_values.next() {
                        values.push_param(value.clone());
                    }
                }
                Some(TemplateParam::Rows) => {
                    if let Some(bulk) = &self.bulk {
                        bulk.write_placeholders(&mut sql, &mut next);
                        values.extend_params(bulk.values().cloned());
                    }
                }
                None => {}
            }
        }

        Ok(Rendered { sql, values })
    }

    /// Rendered SQL text.
    pub fn to_sql(&self) -> ChainResult<String> {
        Ok(self.render()?.sql)
    }

    /// Human-readable SQL with literal values substituted for placeholders.
    ///
    /// Values are not quoted or escaped. For logs only; never execute this.
    pub fn debug_sql(&self) -> ChainResult<String> {
        self.validate()?;

        let mut out = String::new();
        let mut slot_values = self.values.iter();
        let mut params = self.params.iter();

        for piece in &self.pieces {
            let param = match piece {
                Piece::Text(t) => {
                    out.push_str(t);
                    continue;
                }
                Piece::Marker => params.next(),
            };
            match param {
                Some(TemplateParam::Ident(ident)) => ident.write_sql(&mut out),
                Some(TemplateParam::Raw(fragment)) => out.push_str(fragment),
                Some(TemplateParam::Slot) => {
                    if let Some(value) = slot_values.next() {
                        out.push_str(&value.literal());
                    }
                }
                Some(TemplateParam::Rows) => {
                    if let Some(bulk) = &self.bulk {
                        bulk.write_literals(&mut out);
                    }
                }
                None => {}
            }
        }
        Ok(out)
    }
}
