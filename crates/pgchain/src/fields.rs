//! Ordered column → value mappings.
//!
//! INSERT, UPDATE and `filter_by` read column names and bound values from the
//! same [`Fields`] collection in one pass, so column order and value order
//! always line up.

use crate::param::Param;
use tokio_postgres::types::ToSql;

/// An insertion-ordered mapping of column names to bound values.
///
/// # Example
/// ```ignore
/// use pgchain::Fields;
///
/// let fields = Fields::new().set("name", "Ada").set("age", 36i32);
/// assert_eq!(fields.names().collect::<Vec<_>>(), ["name", "age"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Fields {
    entries: Vec<(String, Param)>,
}

impl Fields {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set a column value, consuming and returning the mapping.
    ///
    /// Setting a column that is already present replaces its value in place,
    /// keeping the original position.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: impl Into<String>, value: T) -> Self {
        self.insert(column, Param::new(value));
        self
    }

    /// Set a pre-wrapped value.
    pub fn insert(&mut self, column: impl Into<String>, value: Param) {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Keep only the entries whose column satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(name, _)| keep(name));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Look up the value bound to `column`.
    pub fn get(&self, column: &str) -> Option<&Param> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl IntoIterator for Fields {
    type Item = (String, Param);
    type IntoIter = std::vec::IntoIter<(String, Param)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: ToSql + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (column, value) in iter {
            fields.insert(column, Param::new(value));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let fields = Fields::new().set("b", 2i32).set("a", 1i32).set("c", 3i32);
        assert_eq!(fields.names().collect::<Vec<_>>(), ["b", "a", "c"]);
    }

    #[test]
    fn resetting_a_column_keeps_its_position() {
        let fields = Fields::new().set("a", 1i32).set("b", 2i32).set("a", 9i32);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(fields.get("a").map(Param::literal).as_deref(), Some("9"));
    }

    #[test]
    fn collects_from_pairs() {
        let fields: Fields = [("x", 1i64), ("y", 2i64)].into_iter().collect();
        assert_eq!(fields.names().collect::<Vec<_>>(), ["x", "y"]);
    }

    #[test]
    fn retain_filters_columns() {
        let mut fields = Fields::new().set("id", 1i64).set("name", "Ada");
        fields.retain(|c| c != "id");
        assert_eq!(fields.names().collect::<Vec<_>>(), ["name"]);
    }
}
