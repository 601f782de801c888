//! # pgchain
//!
//! A fluent, parameter-safe statement builder and dispatching executor for
//! PostgreSQL.
//!
//! ## Features
//!
//! - **Chained construction**: one resetting call (`select`, `get`, `insert`,
//!   `insert_bulk`, `update`, `delete`, `raw`) followed by appending calls
//! - **Injection-safe**: identifiers are always quoted, values are always bound
//!   to `$n` placeholders
//! - **Uniform results**: the executor maps each operation to one [`Outcome`]
//!   shape
//! - **Failure handling**: failed statements are rolled back and logged, then
//!   returned as errors
//!
//! ## Example
//!
//! ```ignore
//! use pgchain::prelude::*;
//!
//! let mut session = Session::from_env()?;
//!
//! // SELECT
//! let users = session
//!     .execute(
//!         Statement::new("users")
//!             .select()
//!             .filter_by(Fields::new().set("status", "active"))
//!             .order_by("created_at", "DESC")?
//!             .limit(10),
//!         ExecOptions::new(),
//!     )
//!     .await?
//!     .into_rows();
//!
//! // INSERT ... RETURNING id
//! let id = session
//!     .execute(
//!         Statement::new("users")
//!             .insert(Fields::new().set("name", "Ada").set("status", "active"))
//!             .returns(),
//!         ExecOptions::new().commit(),
//!     )
//!     .await?;
//!
//! // DELETE
//! session
//!     .execute(
//!         Statement::new("users").delete().where_("id", "=", 7i64)?,
//!         ExecOptions::new().commit(),
//!     )
//!     .await?;
//! ```

pub mod bulk;
pub mod cursor;
pub mod entity;
pub mod error;
pub mod executor;
pub mod fields;
pub mod frame;
pub mod ident;
pub mod operation;
pub mod param;
pub mod prelude;
pub mod session;
pub mod statement;

pub use bulk::{BulkRows, MAX_BIND_PARAMS};
pub use cursor::{Cursor, PgCursor, Record, RowId};
pub use entity::Entity;
pub use error::{ChainError, ChainResult};
pub use executor::{ErrorPolicy, ExecOptions, Executor, Outcome};
pub use fields::Fields;
pub use frame::Frame;
pub use ident::{Ident, IntoIdent};
pub use operation::{Operation, ResultShape};
pub use param::{Param, ParamList};
pub use session::{Session, SessionConfig};
pub use statement::{CmpOp, Rendered, SortDir, Statement, TemplateParam};
