//! Resetting and appending builder methods.

use super::clause::{CmpOp, SortDir};
use super::{Statement, TemplateParam};
use crate::bulk::BulkRows;
use crate::error::ChainResult;
use crate::fields::Fields;
use crate::ident::IntoIdent;
use crate::operation::Operation;
use crate::param::Param;
use tokio_postgres::types::ToSql;

impl Statement {
    // ==================== resetting ====================

    /// `SELECT * FROM <table>`
    pub fn select(mut self) -> Self {
        self.reset();
        self.operation = Some(Operation::Select);
        self.push_text("SELECT ");
        self.push_param(TemplateParam::Raw("*".to_string()));
        self.push_text(" FROM ");
        self.push_table();
        self
    }

    /// `SELECT "a","b" FROM <table>`
    ///
    /// An empty column list selects `*`.
    pub fn select_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIdent,
    {
        self.reset();
        self.operation = Some(Operation::Select);
        self.push_text("SELECT ");
        if self.push_ident_list(columns) == 0 {
            if let Some(TemplateParam::Raw(fragment)) = self.params.last_mut() {
                *fragment = "*".to_string();
            }
        }
        self.push_text(" FROM ");
        self.push_table();
        self
    }

    /// Fetch the row whose `id` equals `id`.
    ///
    /// Renders `SELECT * FROM <table> WHERE "id" = $1 LIMIT $2` and dispatches
    /// as [`Operation::Get`].
    ///
    /// The wire type follows the Rust type of `id`, so it must match the
    /// column: `get(7i64)` for `bigint`/`bigserial`, `get(7i32)` for `integer`.
    /// A mismatch is reported as [`ChainError::Validation`](crate::ChainError::Validation)
    /// when the statement runs.
    pub fn get<T: ToSql + Send + Sync + 'static>(self, id: T) -> Self {
        self.get_by(Fields::new().set("id", id))
    }

    /// Fetch the first row matching every entry of `filters`.
    pub fn get_by(self, filters: Fields) -> Self {
        let mut stmt = self.select().filter_by(filters).limit(1);
        // after select(), which tags the statement as SELECT
        stmt.operation = Some(Operation::Get);
        stmt
    }

    /// `INSERT INTO <table> ("a","b") VALUES ($1,$2)`
    pub fn insert(mut self, fields: Fields) -> Self {
        self.reset();
        self.operation = Some(Operation::Insert);
        if fields.is_empty() {
            self.fail("insert() requires at least one field");
        }
        self.push_text("INSERT INTO ");
        self.push_table();
        self.push_text(" (");
        let (names, values): (Vec<String>, Vec<Param>) = fields.into_iter().unzip();
        self.push_ident_list(names);
        self.push_text(") VALUES (");
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.push_text(",");
            }
            self.push_slot(value);
        }
        self.push_text(")");
        self
    }

    /// `INSERT INTO <table> ("a","b") VALUES ($1,$2),($3,$4),...`
    pub fn insert_bulk(mut self, rows: BulkRows) -> Self {
        self.reset();
        self.operation = Some(Operation::InsertBulk);
        self.push_text("INSERT INTO ");
        self.push_table();
        self.push_text(" (");
        self.push_ident_list(rows.columns().iter());
        self.push_text(") VALUES ");
        self.push_param(TemplateParam::Rows);
        self.bulk = Some(rows);
        self
    }

    /// `UPDATE <table> SET "a" = $1, "b" = $2`
    pub fn update(mut self, fields: Fields) -> Self {
        self.reset();
        self.operation = Some(Operation::Update);
        if fields.is_empty() {
            self.fail("update() requires at least one field");
        }
        self.push_text("UPDATE ");
        self.push_table();
        self.push_text(" SET ");
        for (i, (column, value)) in fields.into_iter().enumerate() {
            if i > 0 {
                self.push_text(", ");
            }
            self.push_ident_param(column);
            self.push_text(" = ");
            self.push_slot(value);
        }
        self
    }

    /// `DELETE FROM <table>`
    pub fn delete(mut self) -> Self {
        self.reset();
        self.operation = Some(Operation::Delete);
        self.push_text("DELETE FROM ");
        self.push_table();
        self
    }

    /// Start from raw SQL text; the operation is inferred from its leading
    /// keyword unless set with [`Statement::with_operation`].
    ///
    /// The text is used verbatim. Compose dynamic parts with `push_ident` and
    /// `push_bind`.
    pub fn raw(mut self, sql: &str) -> Self {
        self.reset();
        self.push_text(sql);
        self
    }

    // ==================== appending ====================

    /// Override the dispatch operation.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Request a [`Frame`](crate::Frame) instead of a row list for this SELECT.
    pub fn as_frame(mut self) -> Self {
        if self.require_started("as_frame") {
            if self.operation == Some(Operation::Select) {
                self.to_frame = true;
            } else {
                self.fail("as_frame() is only valid for SELECT");
            }
        }
        self
    }

    /// Append ` RETURNING id`.
    pub fn returns(mut self) -> Self {
        if !self.require_started("returns") {
            return self;
        }
        match self.operation {
            Some(Operation::Insert | Operation::Update) => {
                self.returning = true;
                self.push_text(" RETURNING id");
            }
            other => self.fail(format!(
                "returns() is only valid for INSERT or UPDATE, not {}",
                other.map_or("an untagged statement", Operation::as_str)
            )),
        }
        self
    }

    /// Append ` JOIN <table> ON <left_key> = <right_key>`.
    ///
    /// Keys may be qualified: `join("orders", ["users", "id"], ["orders", "user_id"])`.
    pub fn join(
        mut self,
        table: impl IntoIdent,
        left_key: impl IntoIdent,
        right_key: impl IntoIdent,
    ) -> Self {
        if !self.require_started("join") {
            return self;
        }
        self.push_text(" JOIN ");
        self.push_ident_param(table);
        self.push_text(" ON ");
        self.push_ident_param(left_key);
        self.push_text(" = ");
        self.push_ident_param(right_key);
        self
    }

    /// Filter on `column <op> value`, where `op` is one of `=`, `>`, `>=`, `<`, `<=`.
    ///
    /// Any other operator fails immediately with [`ChainError::Validation`](crate::ChainError::Validation).
    ///
    /// As with every bound value, the Rust type of `value` must match the
    /// column type (`i64` for `bigint`).
    #[doc(alias = "where")]
    pub fn where_<T: ToSql + Send + Sync + 'static>(
        self,
        column: impl IntoIdent,
        op: &str,
        value: T,
    ) -> ChainResult<Self> {
        let op: CmpOp = op.parse()?;
        Ok(self.where_op(column, op, value))
    }

    /// Typed form of [`Statement::where_`].
    pub fn where_op<T: ToSql + Send + Sync + 'static>(
        mut self,
        column: impl IntoIdent,
        op: CmpOp,
        value: T,
    ) -> Self {
        if !self.require_started("where") {
            return self;
        }
        self.push_filter_keyword();
        self.push_ident_param(column);
        self.push_text(" ");
        self.push_text(op.as_str());
        self.push_text(" ");
        self.push_slot(Param::new(value));
        self
    }

    /// Equality filter for every entry of `filters`, in order.
    pub fn filter_by(mut self, filters: Fields) -> Self {
        if !self.require_started("filter_by") {
            return self;
        }
        for (column, value) in filters {
            self.push_filter_keyword();
            self.push_ident_param(column);
            self.push_text(" = ");
            self.push_slot(value);
        }
        self
    }

    /// Filter on `column BETWEEN low AND high`.
    pub fn between<L, H>(mut self, column: impl IntoIdent, low: L, high: H) -> Self
    where
        L: ToSql + Send + Sync + 'static,
        H: ToSql + Send + Sync + 'static,
    {
        if !self.require_started("between") {
            return self;
        }
        self.push_filter_keyword();
        self.push_ident_param(column);
        self.push_text(" BETWEEN ");
        self.push_slot(Param::new(low));
        self.push_text(" AND ");
        self.push_slot(Param::new(high));
        self
    }

    /// Append ` ORDER BY <column><direction>`, where direction is `ASC` or `DESC`.
    ///
    /// The direction is written directly after the quoted column
    /// (`"created_at"DESC`), which PostgreSQL parses as two tokens.
    pub fn order_by(self, column: impl IntoIdent, direction: &str) -> ChainResult<Self> {
        let direction: SortDir = direction.parse()?;
        Ok(self.order_by_dir(column, direction))
    }

    /// ` ORDER BY <column>ASC`, the default direction ([`SortDir::default`]).
    pub fn order_by_asc(self, column: impl IntoIdent) -> Self {
        self.order_by_dir(column, SortDir::default())
    }

    /// Typed form of [`Statement::order_by`].
    pub fn order_by_dir(mut self, column: impl IntoIdent, direction: SortDir) -> Self {
        if !self.require_started("order_by") {
            return self;
        }
        self.push_text(" ORDER BY ");
        self.push_ident_param(column);
        self.push_text(direction.as_str());
        self
    }

    /// Append ` LIMIT $n`.
    pub fn limit(mut self, n: u32) -> Self {
        if !self.require_started("limit") {
            return self;
        }
        self.push_text(" LIMIT ");
        self.push_slot(Param::new(i64::from(n)));
        self
    }

    // ==================== low-level composition ====================

    /// Append raw SQL text (no parameters).
    pub fn push_sql(mut self, sql: &str) -> Self {
        if self.require_started("push_sql") {
            self.push_text(sql);
        }
        self
    }

    /// Append a quoted identifier.
    pub fn push_ident(mut self, name: impl IntoIdent) -> Self {
        if self.require_started("push_ident") {
            self.push_ident_param(name);
        }
        self
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind<T: ToSql + Send + Sync + 'static>(mut self, value: T) -> Self {
        if self.require_started("push_bind") {
            self.push_slot(Param::new(value));
        }
        self
    }
}
