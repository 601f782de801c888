//! Safe SQL identifier handling.
//!
//! [`Ident`] represents a schema identifier (table or column). Every part is
//! rendered as a quoted identifier, with embedded `"` doubled, so names that
//! contain spaces, punctuation or reserved words can never be read as SQL
//! structure.
//!
//! A plain string is always a *single* identifier part: `"users.id"` names a
//! column literally called `users.id`. Use [`Ident::qualified`] (or pass an
//! array such as `["users", "id"]`) for a dotted reference.
//!
//! # Example
//! ```ignore
//! use pgchain::Ident;
//!
//! assert_eq!(Ident::new("users")?.to_sql(), r#""users""#);
//! assert_eq!(Ident::qualified(["public", "users"])?.to_sql(), r#""public"."users""#);
//! # Ok::<(), pgchain::ChainError>(())
//! ```

use crate::error::{ChainError, ChainResult};

/// A SQL identifier (column, table, or schema-qualified name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<String>,
}

fn check_part(name: &str) -> ChainResult<()> {
    if name.is_empty() {
        return Err(ChainError::validation("Identifier cannot be empty"));
    }
    if name.contains('\0') {
        return Err(ChainError::validation(
            "Identifier cannot contain NUL character",
        ));
    }
    Ok(())
}

impl Ident {
    /// Create a single-part identifier.
    pub fn new(name: &str) -> ChainResult<Self> {
        check_part(name)?;
        Ok(Self {
            parts: vec![name.to_string()],
        })
    }

    /// Create a qualified identifier such as `"schema"."table"` or `"table"."column"`.
    pub fn qualified<I, S>(parts: I) -> ChainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for part in parts {
            let part = part.as_ref();
            check_part(part)?;
            out.push(part.to_string());
        }
        if out.is_empty() {
            return Err(ChainError::validation("Identifier cannot be empty"));
        }
        Ok(Self { parts: out })
    }

    /// The unquoted parts of this identifier.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        // surrounding quotes + dots; escapes may add more
        let cap = self.parts.iter().map(|p| p.len() + 3).sum();
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push('"');
            for ch in part.chars() {
                if ch == '"' {
                    out.push_str("\"\"");
                } else {
                    out.push(ch);
                }
            }
            out.push('"');
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> ChainResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> ChainResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> ChainResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> ChainResult<Ident> {
        Ident::new(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> ChainResult<Ident> {
        Ident::new(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> ChainResult<Ident> {
        Ident::new(self)
    }
}

impl<const N: usize> IntoIdent for [&str; N] {
    fn into_ident(self) -> ChainResult<Ident> {
        Ident::qualified(self)
    }
}

impl IntoIdent for &[&str] {
    fn into_ident(self) -> ChainResult<Ident> {
        Ident::qualified(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::new("users").unwrap();
        assert_eq!(ident.to_sql(), r#""users""#);
    }

    #[test]
    fn ident_qualified() {
        let ident = Ident::qualified(["public", "users"]).unwrap();
        assert_eq!(ident.to_sql(), r#""public"."users""#);
    }

    #[test]
    fn ident_dot_in_plain_string_stays_one_part() {
        let ident = Ident::new("users.id").unwrap();
        assert_eq!(ident.to_sql(), r#""users.id""#);
    }

    #[test]
    fn ident_escapes_quote() {
        let ident = Ident::new(r#"has"quote"#).unwrap();
        assert_eq!(ident.to_sql(), r#""has""quote""#);
    }

    #[test]
    fn ident_reserved_word_is_quoted() {
        assert_eq!(Ident::new("select").unwrap().to_sql(), r#""select""#);
        assert_eq!(Ident::new("order").unwrap().to_sql(), r#""order""#);
    }

    #[test]
    fn ident_injection_attempt_stays_inside_quotes() {
        let ident = Ident::new(r#"x"; DROP TABLE users; --"#).unwrap();
        assert_eq!(ident.to_sql(), r#""x""; DROP TABLE users; --""#);
    }

    #[test]
    fn ident_array_is_qualified() {
        let ident = ["users", "id"].into_ident().unwrap();
        assert_eq!(ident.to_sql(), r#""users"."id""#);
    }

    #[test]
    fn ident_rejects_empty() {
        assert!(Ident::new("").is_err());
        assert!(Ident::qualified(Vec::<&str>::new()).is_err());
        assert!(Ident::qualified(["public", ""]).is_err());
    }

    #[test]
    fn ident_rejects_nul() {
        assert!(Ident::new("bad\0name").is_err());
    }
}
