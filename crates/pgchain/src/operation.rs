//! Operation kinds and result shapes.

use crate::error::{ChainError, ChainResult};
use std::fmt;

/// The kind of statement being executed.
///
/// Resetting builder methods set this explicitly. [`Operation::infer`] is the
/// fallback for statements composed through the low-level `raw`/`push_*` API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `SELECT`, returning every row
    Select,
    /// `SELECT ... LIMIT 1`, returning at most one row
    Get,
    /// `INSERT` of a single row
    Insert,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
    /// Multi-row `INSERT` rendered by the bulk path
    InsertBulk,
}

impl Operation {
    /// Keyword form used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Select => "SELECT",
            Operation::Get => "GET",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::InsertBulk => "INSERT_BULK",
        }
    }

    /// Infer the operation from the leading keyword of a SQL string.
    ///
    /// Only `SELECT`, `INSERT`, `UPDATE` and `DELETE` are recognized; `GET` and
    /// `INSERT_BULK` must always be set explicitly.
    pub fn infer(sql: &str) -> Option<Self> {
        let trimmed = strip_sql_prefix(sql);
        if starts_with_keyword(trimmed, "SELECT") {
            Some(Operation::Select)
        } else if starts_with_keyword(trimmed, "INSERT") {
            Some(Operation::Insert)
        } else if starts_with_keyword(trimmed, "UPDATE") {
            Some(Operation::Update)
        } else if starts_with_keyword(trimmed, "DELETE") {
            Some(Operation::Delete)
        } else {
            None
        }
    }

    /// Resolve an explicit tag, falling back to inference from `sql`.
    pub fn resolve(explicit: Option<Self>, sql: &str) -> ChainResult<Self> {
        match explicit.or_else(|| Self::infer(sql)) {
            Some(op) => Ok(op),
            None => {
                let keyword = strip_sql_prefix(sql)
                    .split_whitespace()
                    .next()
                    .unwrap_or("");
                if keyword.is_empty() {
                    Err(ChainError::operation("No operation specified"))
                } else {
                    Err(ChainError::operation(format!(
                        "Unrecognized operation '{keyword}'"
                    )))
                }
            }
        }
    }

    /// Whether the executor commits after this operation when asked to.
    pub fn is_mutation(self) -> bool {
        !matches!(self, Operation::Select | Operation::Get)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structural contract of what an execution returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Every row (or a frame)
    Rows,
    /// At most one row
    SingleRow,
    /// The `id` of the affected row
    ScalarId,
    /// Acknowledgement only
    None,
}

impl ResultShape {
    pub fn of(operation: Operation, returning: bool) -> Self {
        match operation {
            Operation::Select => ResultShape::Rows,
            Operation::Get => ResultShape::SingleRow,
            Operation::Insert | Operation::Update if returning => ResultShape::ScalarId,
            Operation::Insert | Operation::Update | Operation::Delete | Operation::InsertBulk => {
                ResultShape::None
            }
        }
    }
}

/// Strip leading whitespace, SQL comments (`--` and `/* */`), and parentheses
/// from a SQL string to find the first meaningful keyword.
fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            if let Some(pos) = s.find('\n') {
                s = &s[pos + 1..];
                continue;
            }
            return "";
        }
        if s.starts_with("/*") {
            if let Some(pos) = s.find("*/") {
                s = &s[pos + 2..];
                continue;
            }
            return "";
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    let Some(prefix) = s.get(0..keyword.len()) else {
        return false;
    };
    // "SELECTED" is not "SELECT"
    let boundary = s[keyword.len()..]
        .chars()
        .next()
        .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));
    prefix.eq_ignore_ascii_case(keyword) && boundary
}
