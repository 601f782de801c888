//! Connection/cursor capability consumed by the executor.
//!
//! [`Cursor`] is the narrow interface the executor needs: run a statement,
//! fetch the buffered result rows, commit or roll back. [`PgCursor`]
//! implements it over a `tokio_postgres::Client`; tests implement it with
//! in-memory fakes.

use crate::error::{ChainError, ChainResult};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt::{self, Write};
use tokio_postgres::types::{FromSql, Kind, ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};

/// Scalar id returned by `INSERT ... RETURNING id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowId {
    Int(i64),
    Uuid(uuid::Uuid),
    Text(String),
}

impl RowId {
    /// The integer id, if this is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RowId::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Interpret a decoded JSON cell as an id.
    pub fn from_value(column: &str, value: &serde_json::Value) -> ChainResult<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(RowId::Int)
                .ok_or_else(|| ChainError::decode(column, format!("id {n} is not an integer"))),
            serde_json::Value::String(s) => Ok(match uuid::Uuid::parse_str(s) {
                Ok(u) => RowId::Uuid(u),
                Err(_) => RowId::Text(s.clone()),
            }),
            other => Err(ChainError::decode(
                column,
                format!("unsupported id value {other}"),
            )),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(v) => write!(f, "{v}"),
            RowId::Uuid(v) => write!(f, "{v}"),
            RowId::Text(v) => f.write_str(v),
        }
    }
}

/// A result row with named-field access.
pub trait Record: Send {
    /// Column names, in result order.
    fn columns(&self) -> Vec<String>;

    /// Value of `column` as JSON.
    fn value(&self, column: &str) -> ChainResult<serde_json::Value>;

    /// Value of the `id` column.
    fn id(&self) -> ChainResult<RowId> {
        let value = self.value("id")?;
        RowId::from_value("id", &value)
    }
}

/// A DB-API style cursor over one connection.
///
/// `execute` buffers any rows the statement produced; `fetch_one` and
/// `fetch_all` drain that buffer. At most one statement is in flight at a
/// time (`&mut self`).
pub trait Cursor: Send {
    type Row: Record;

    /// Run a statement with positional values.
    fn execute(
        &mut self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<()>> + Send;

    /// Take the next buffered row.
    fn fetch_one(&mut self) -> Option<Self::Row>;

    /// Take every remaining buffered row.
    fn fetch_all(&mut self) -> Vec<Self::Row>;

    /// Commit the current transaction.
    fn commit(&mut self) -> impl std::future::Future<Output = ChainResult<()>> + Send;

    /// Roll back the current transaction.
    fn rollback(&mut self) -> impl std::future::Future<Output = ChainResult<()>> + Send;

    /// Whether the underlying connection is gone.
    fn is_closed(&self) -> bool;
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    type Row = C::Row;

    fn execute(
        &mut self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<()>> + Send {
        (**self).execute(sql, params)
    }

    fn fetch_one(&mut self) -> Option<Self::Row> {
        (**self).fetch_one()
    }

    fn fetch_all(&mut self) -> Vec<Self::Row> {
        (**self).fetch_all()
    }

    fn commit(&mut self) -> impl std::future::Future<Output = ChainResult<()>> + Send {
        (**self).commit()
    }

    fn rollback(&mut self) -> impl std::future::Future<Output = ChainResult<()>> + Send {
        (**self).rollback()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

// ==================== tokio-postgres ====================

/// [`Cursor`] over a `tokio_postgres::Client`.
///
/// Like a DB-API driver, a transaction is opened implicitly before the first
/// statement and stays open until `commit` or `rollback`.
pub struct PgCursor {
    client: Client,
    pending: VecDeque<Row>,
    in_transaction: bool,
}

impl PgCursor {
    /// Wrap an already connected client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            pending: VecDeque::new(),
            in_transaction: false,
        }
    }

    /// Connect without TLS and drive the connection on a background task.
    pub async fn connect(dsn: &str) -> ChainResult<Self> {
        let (client, connection) = tokio_postgres::connect(dsn, NoTls)
            .await
            .map_err(|e| ChainError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(target: "pgchain.session", error = %e, "connection closed with error");
            }
        });
        Ok(Self::new(client))
    }

    /// Whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// The wrapped client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Cursor for PgCursor {
    type Row = Row;

    async fn execute(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<()> {
        self.pending.clear();
        if !self.in_transaction {
            self.client
                .batch_execute("BEGIN")
                .await
                .map_err(ChainError::from_db_error)?;
            self.in_transaction = true;
        }
        let rows = self
            .client
            .query(sql, params)
            .await
            .map_err(ChainError::from_db_error)?;
        self.pending.extend(rows);
        Ok(())
    }

    fn fetch_one(&mut self) -> Option<Row> {
        self.pending.pop_front()
    }

    fn fetch_all(&mut self) -> Vec<Row> {
        self.pending.drain(..).collect()
    }

    async fn commit(&mut self) -> ChainResult<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.client
            .batch_execute("COMMIT")
            .await
            .map_err(ChainError::from_db_error)?;
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> ChainResult<()> {
        self.pending.clear();
        if !self.in_transaction {
            return Ok(());
        }
        // the server ends the transaction even if this reports an error
        self.in_transaction = false;
        self.client
            .batch_execute("ROLLBACK")
            .await
            .map_err(ChainError::from_db_error)
    }

    fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}

impl Record for Row {
    fn columns(&self) -> Vec<String> {
        Row::columns(self)
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    fn value(&self, column: &str) -> ChainResult<serde_json::Value> {
        let idx = Row::columns(self)
            .iter()
            .position(|c| c.name() == column)
            .ok_or_else(|| ChainError::decode(column, "no such column"))?;
        decode_cell(self, idx)
    }

    fn id(&self) -> ChainResult<RowId> {
        let idx = Row::columns(self)
            .iter()
            .position(|c| c.name() == "id")
            .ok_or_else(|| ChainError::decode("id", "no such column"))?;
        let ty = Row::columns(self)[idx].type_();
        let decode = |e: tokio_postgres::Error| ChainError::decode("id", e.to_string());
        let id = match *ty {
            Type::INT2 => RowId::Int(i64::from(self.try_get::<_, i16>(idx).map_err(decode)?)),
            Type::INT4 => RowId::Int(i64::from(self.try_get::<_, i32>(idx).map_err(decode)?)),
            Type::INT8 => RowId::Int(self.try_get::<_, i64>(idx).map_err(decode)?),
            Type::UUID => RowId::Uuid(self.try_get::<_, uuid::Uuid>(idx).map_err(decode)?),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                RowId::Text(self.try_get::<_, String>(idx).map_err(decode)?)
            }
            ref other => {
                return Err(ChainError::decode(
                    "id",
                    format!("unsupported id type {other}"),
                ));
            }
        };
        Ok(id)
    }
}

/// Decode a nullable cell of type `T` with `f`.
fn cell<'a, T: FromSql<'a>>(
    row: &'a Row,
    idx: usize,
    name: &str,
    f: impl Fn(T) -> Value,
) -> ChainResult<Value> {
    let value: Option<T> = row
        .try_get(idx)
        .map_err(|e| ChainError::decode(name, e.to_string()))?;
    Ok(value.map_or(Value::Null, f))
}

/// Decode a one-dimensional array cell into a JSON array.
fn array<'a, T: FromSql<'a>>(
    row: &'a Row,
    idx: usize,
    name: &str,
    f: impl Fn(T) -> Value,
) -> ChainResult<Value> {
    let items: Option<Vec<Option<T>>> = row
        .try_get(idx)
        .map_err(|e| ChainError::decode(name, e.to_string()))?;
    Ok(items.map_or(Value::Null, |items| {
        Value::Array(
            items
                .into_iter()
                .map(|item| item.map_or(Value::Null, &f))
                .collect(),
        )
    }))
}

/// `bytea` in PostgreSQL's hex output format (`\x0a1b`).
fn bytea_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

// Expands to `Some(value)` for a supported type, `None` otherwise.
macro_rules! decode_as {
    ($ty:expr, $get:ident, $row:expr, $idx:expr, $name:expr) => {
        match *$ty {
            Type::BOOL => Some($get::<bool>($row, $idx, $name, Value::from)?),
            Type::INT2 => Some($get::<i16>($row, $idx, $name, Value::from)?),
            Type::INT4 => Some($get::<i32>($row, $idx, $name, Value::from)?),
            Type::INT8 => Some($get::<i64>($row, $idx, $name, Value::from)?),
            Type::OID => Some($get::<u32>($row, $idx, $name, Value::from)?),
            Type::FLOAT4 => Some($get::<f32>($row, $idx, $name, Value::from)?),
            Type::FLOAT8 => Some($get::<f64>($row, $idx, $name, Value::from)?),
            // string keeps the full precision
            Type::NUMERIC => Some($get::<Decimal>($row, $idx, $name, |d: Decimal| {
                Value::from(d.to_string())
            })?),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                Some($get::<String>($row, $idx, $name, Value::from)?)
            }
            Type::JSON | Type::JSONB => Some($get::<Value>($row, $idx, $name, |v: Value| v)?),
            Type::UUID => Some($get::<uuid::Uuid>($row, $idx, $name, |u: uuid::Uuid| {
                Value::from(u.to_string())
            })?),
            Type::TIMESTAMPTZ => Some($get::<chrono::DateTime<chrono::Utc>>(
                $row,
                $idx,
                $name,
                |t: chrono::DateTime<chrono::Utc>| Value::from(t.to_rfc3339()),
            )?),
            Type::TIMESTAMP => Some($get::<chrono::NaiveDateTime>(
                $row,
                $idx,
                $name,
                |t: chrono::NaiveDateTime| Value::from(t.to_string()),
            )?),
            Type::DATE => Some($get::<chrono::NaiveDate>($row, $idx, $name, |d: chrono::NaiveDate| {
                Value::from(d.to_string())
            })?),
            Type::TIME => Some($get::<chrono::NaiveTime>($row, $idx, $name, |t: chrono::NaiveTime| {
                Value::from(t.to_string())
            })?),
            Type::BYTEA => Some($get::<Vec<u8>>($row, $idx, $name, |b: Vec<u8>| {
                Value::from(bytea_hex(&b))
            })?),
            _ => None,
        }
    };
}

/// Convert one cell to JSON according to its PostgreSQL type.
///
/// Types without a JSON mapping decode to `null` with a warning, so one
/// exotic column does not fail a whole frame.
fn decode_cell(row: &Row, idx: usize) -> ChainResult<Value> {
    let column = &row.columns()[idx];
    let name = column.name();
    let ty = column.type_();

    let value = match ty.kind() {
        Kind::Array(member) => decode_as!(member, array, row, idx, name),
        _ => decode_as!(ty, cell, row, idx, name),
    };
    Ok(value.unwrap_or_else(|| {
        tracing::warn!(
            target: "pgchain.exec",
            column = name,
            column_type = %ty,
            "no JSON mapping for column type, decoded as null"
        );
        Value::Null
    }))
}
