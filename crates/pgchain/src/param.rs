//! Bound parameter storage.

use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bound value.
///
/// Values are kept behind an `Arc` so statements (and the fields collections
/// they are built from) can be cloned without copying the values themselves.
#[derive(Clone)]
pub struct Param(pub(crate) Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }

    /// Render the value as an unquoted literal for diagnostics.
    ///
    /// Strings lose their surrounding quotes and `None` becomes `NULL`, so
    /// the output is not valid SQL in general and must never be executed.
    pub fn literal(&self) -> String {
        let debug = format!("{:?}", self.0);
        let inner = match debug.strip_prefix("Some(").and_then(|s| s.strip_suffix(')')) {
            Some(inner) => inner.to_string(),
            None if debug == "None" => return "NULL".to_string(),
            None => debug,
        };
        match inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            Some(text) => text.replace("\\\"", "\"").replace("\\\\", "\\"),
            None => inner,
        }
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Param").field(&self.0).finish()
    }
}

/// An ordered collection of bound values.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a pre-wrapped Param and return its 1-based index.
    pub fn push_param(&mut self, param: Param) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over the bound values in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.params.iter()
    }

    /// Get all parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }

    /// Extend this list with parameters from an iterator.
    pub fn extend_params(&mut self, params: impl IntoIterator<Item = Param>) {
        self.params.extend(params);
    }
}

impl<'a> IntoIterator for &'a ParamList {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_strips_string_quotes() {
        assert_eq!(Param::new("active").literal(), "active");
        assert_eq!(Param::new(String::from("Ada")).literal(), "Ada");
    }

    #[test]
    fn literal_numbers_and_options() {
        assert_eq!(Param::new(10i64).literal(), "10");
        assert_eq!(Param::new(Some(7i32)).literal(), "7");
        assert_eq!(Param::new(None::<i32>).literal(), "NULL");
        assert_eq!(Param::new(true).literal(), "true");
    }

    #[test]
    fn param_list_indices_are_one_based() {
        let mut list = ParamList::new();
        assert!(list.is_empty());
        assert_eq!(list.push_param(Param::new(1i32)), 1);
        assert_eq!(list.push_param(Param::new("x")), 2);
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_refs().len(), 2);
    }
}
