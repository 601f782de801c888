//! Declared table descriptors.
//!
//! An [`Entity`] names its table and columns up front; statements built from
//! it only ever touch the declared columns.

use crate::fields::Fields;
use crate::statement::Statement;

/// A type that maps to one table.
///
/// # Example
/// ```ignore
/// use pgchain::{Entity, Fields, Statement};
///
/// struct User {
///     name: String,
///     email: String,
/// }
///
/// impl Entity for User {
///     const TABLE: &'static str = "users";
///     const COLUMNS: &'static [&'static str] = &["id", "name", "email"];
///
///     fn fields(&self) -> Fields {
///         Fields::new()
///             .set("name", self.name.clone())
///             .set("email", self.email.clone())
///     }
/// }
///
/// let stmt = Statement::insert_entity(&user).returns();
/// ```
pub trait Entity {
    /// Table name.
    const TABLE: &'static str;

    /// Declared column names.
    const COLUMNS: &'static [&'static str];

    /// Current column values of this instance.
    fn fields(&self) -> Fields;
}

impl Statement {
    /// Empty statement for `E`'s table.
    pub fn for_entity<E: Entity>() -> Self {
        Statement::new(E::TABLE)
    }

    /// `SELECT <declared columns> FROM <table>`
    pub fn select_entity<E: Entity>() -> Self {
        Self::for_entity::<E>().select_columns(E::COLUMNS.iter().copied())
    }

    /// INSERT of `entity`'s values, keeping only declared columns.
    pub fn insert_entity<E: Entity>(entity: &E) -> Self {
        let mut fields = entity.fields();
        fields.retain(|name| E::COLUMNS.iter().any(|c| *c == name));
        Self::for_entity::<E>().insert(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User {
        name: &'static str,
        nickname: Option<&'static str>,
    }

    impl Entity for User {
        const TABLE: &'static str = "users";
        const COLUMNS: &'static [&'static str] = &["id", "name"];

        fn fields(&self) -> Fields {
            Fields::new()
                .set("name", self.name.to_string())
                .set("nickname", self.nickname.map(str::to_string))
        }
    }

    #[test]
    fn select_uses_declared_columns() {
        assert_eq!(
            Statement::select_entity::<User>().to_sql().unwrap(),
            r#"SELECT "id","name" FROM "users""#
        );
    }

    #[test]
    fn insert_drops_undeclared_columns() {
        let user = User {
            name: "Ada",
            nickname: Some("countess"),
        };
        let stmt = Statement::insert_entity(&user).returns();
        assert_eq!(
            stmt.to_sql().unwrap(),
            r#"INSERT INTO "users" ("name") VALUES ($1) RETURNING id"#
        );
        assert_eq!(stmt.values().len(), 1);
    }

    #[test]
    fn for_entity_targets_table() {
        let stmt = Statement::for_entity::<User>().delete();
        assert_eq!(stmt.to_sql().unwrap(), r#"DELETE FROM "users""#);
    }
}
