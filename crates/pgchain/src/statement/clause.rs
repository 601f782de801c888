//! Filter operators and sort directions accepted by the clause methods.

use crate::error::{ChainError, ChainResult};
use std::fmt;
use std::str::FromStr;

/// Comparison operator accepted by [`Statement::where_`](crate::Statement::where_).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
        }
    }
}

impl FromStr for CmpOp {
    type Err = ChainError;

    fn from_str(s: &str) -> ChainResult<Self> {
        match s {
            "=" => Ok(CmpOp::Eq),
            ">" => Ok(CmpOp::Gt),
            ">=" => Ok(CmpOp::Gte),
            "<" => Ok(CmpOp::Lt),
            "<=" => Ok(CmpOp::Lte),
            other => Err(ChainError::validation(format!(
                "invalid operator '{other}', expected one of =, >, >=, <, <="
            ))),
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction accepted by [`Statement::order_by`](crate::Statement::order_by).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

impl FromStr for SortDir {
    type Err = ChainError;

    fn from_str(s: &str) -> ChainResult<Self> {
        match s {
            "ASC" => Ok(SortDir::Asc),
            "DESC" => Ok(SortDir::Desc),
            other => Err(ChainError::validation(format!(
                "invalid sort direction '{other}', expected ASC or DESC"
            ))),
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_operators() {
        for op in ["=", ">", ">=", "<", "<="] {
            assert_eq!(op.parse::<CmpOp>().unwrap().as_str(), op);
        }
    }

    #[test]
    fn rejects_other_operators() {
        for op in ["~", "!=", "<>", "LIKE", "= 1; --", ""] {
            assert!(op.parse::<CmpOp>().unwrap_err().is_validation(), "{op}");
        }
    }

    #[test]
    fn sort_direction_is_case_sensitive() {
        assert_eq!("DESC".parse::<SortDir>().unwrap(), SortDir::Desc);
        assert!("desc".parse::<SortDir>().is_err());
        assert_eq!(SortDir::default(), SortDir::Asc);
    }
}
