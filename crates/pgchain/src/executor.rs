//! Statement execution and result shaping.
//!
//! The [`Executor`] renders a finished [`Statement`], dispatches on its
//! operation, and maps the cursor's output to an [`Outcome`]:
//!
//! | operation | outcome |
//! |---|---|
//! | SELECT | `Rows` (or `Frame` when requested and non-empty) |
//! | GET | `Row(Option<_>)` |
//! | INSERT / UPDATE | `Id` with RETURNING, else `Done` |
//! | DELETE / INSERT_BULK | `Done` |
//!
//! Driver failures are rolled back and logged before the [`ErrorPolicy`]
//! decides what the caller sees.

use crate::cursor::{Cursor, Record, RowId};
use crate::error::{ChainError, ChainResult};
use crate::frame::Frame;
use crate::operation::Operation;
use crate::statement::{Rendered, Statement};

/// Per-execution options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Commit after a successful INSERT/UPDATE/DELETE/INSERT_BULK.
    ///
    /// The commit happens before the `RETURNING id` row is read. A
    /// [`ChainError::NotFound`] for a missing row is therefore reported after
    /// the write has already been committed.
    pub commit: bool,
    /// Log the statement with literal values at `INFO`.
    pub debug: bool,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit on success. Ignored for SELECT and GET.
    pub fn commit(mut self) -> Self {
        self.commit = true;
        self
    }

    /// Log the human-readable statement before running it.
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }
}

/// What the caller sees when execution fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return the error after rolling back.
    #[default]
    Propagate,
    /// Roll back, log, and return [`Outcome::Nothing`].
    ///
    /// A failed statement then looks like one that produced nothing; only use
    /// this where callers cannot handle errors.
    Swallow,
}

/// Result of one execution, shaped by the operation.
#[derive(Debug)]
pub enum Outcome<R> {
    /// SELECT rows; empty when nothing matched.
    Rows(Vec<R>),
    /// SELECT rows converted to a frame.
    Frame(Frame),
    /// GET result; `None` when nothing matched.
    Row(Option<R>),
    /// `id` of the row affected by INSERT/UPDATE ... RETURNING.
    Id(RowId),
    /// Acknowledgement for statements without a result.
    Done { committed: bool },
    /// The statement failed and [`ErrorPolicy::Swallow`] hid the error.
    Nothing,
}

impl<R> Outcome<R> {
    /// SELECT rows, or an empty vec for every other outcome.
    pub fn into_rows(self) -> Vec<R> {
        match self {
            Outcome::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }

    /// GET row.
    pub fn into_row(self) -> Option<R> {
        match self {
            Outcome::Row(row) => row,
            _ => None,
        }
    }

    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Outcome::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&RowId> {
        match self {
            Outcome::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Whether the execution committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Done { committed: true })
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Outcome::Nothing)
    }
}

/// Runs statements against a [`Cursor`].
///
/// Pass `&mut cursor` to keep ownership of the cursor.
pub struct Executor<C> {
    cursor: C,
    policy: ErrorPolicy,
}

impl<C: Cursor> Executor<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            policy: ErrorPolicy::default(),
        }
    }

    /// Set how failures are reported.
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut C {
        &mut self.cursor
    }

    pub fn into_inner(self) -> C {
        self.cursor
    }

    /// Execute a statement once.
    ///
    /// Build errors, slot mismatches and unknown operations fail before the
    /// cursor is touched. Failures while running are rolled back first.
    pub async fn execute(
        &mut self,
        stmt: Statement,
        options: ExecOptions,
    ) -> ChainResult<Outcome<C::Row>> {
        let rendered = stmt.render()?;
        let operation = Operation::resolve(stmt.operation(), rendered.sql())?;

        if options.debug {
            // render() succeeded, so this cannot fail
            let literal = stmt.debug_sql().unwrap_or_default();
            tracing::info!(target: "pgchain.sql", operation = %operation, sql = %literal);
        }
        tracing::debug!(
            target: "pgchain.sql",
            operation = %operation,
            param_count = rendered.values().len(),
            sql = %rendered.sql(),
        );

        let result = self.dispatch(operation, &stmt, &rendered, options).await;
        self.intercept(operation, result).await
    }

    async fn dispatch(
        &mut self,
        operation: Operation,
        stmt: &Statement,
        rendered: &Rendered,
        options: ExecOptions,
    ) -> ChainResult<Outcome<C::Row>> {
        let params = rendered.params_ref();
        self.cursor.execute(rendered.sql(), &params).await?;

        match operation {
            Operation::Select => {
                let rows = self.cursor.fetch_all();
                if stmt.wants_frame() {
                    if let Some(frame) = Frame::from_records(&rows)? {
                        return Ok(Outcome::Frame(frame));
                    }
                }
                return Ok(Outcome::Rows(rows));
            }
            Operation::Get => return Ok(Outcome::Row(self.cursor.fetch_one())),
            _ => {}
        }

        let committed = options.commit && operation.is_mutation();
        if committed {
            self.cursor.commit().await?;
        }
        if stmt.is_returning() {
            let row = self.cursor.fetch_one().ok_or_else(|| {
                ChainError::not_found(format!("{operation} ... RETURNING id produced no row"))
            })?;
            return Ok(Outcome::Id(row.id()?));
        }
        Ok(Outcome::Done { committed })
    }

    /// Roll back and log on failure, then apply the error policy.
    async fn intercept(
        &mut self,
        operation: Operation,
        result: ChainResult<Outcome<C::Row>>,
    ) -> ChainResult<Outcome<C::Row>> {
        let error = match result {
            Ok(outcome) => return Ok(outcome),
            Err(error) => error,
        };

        let error = match self.cursor.rollback().await {
            Ok(()) => error,
            Err(rollback_err) => {
                ChainError::Other(format!("{error} (rollback failed: {rollback_err})"))
            }
        };
        tracing::error!(
            target: "pgchain.exec",
            operation = %operation,
            policy = ?self.policy,
            error = %error,
            "statement failed, transaction rolled back"
        );

        match self.policy {
            ErrorPolicy::Propagate => Err(error),
            ErrorPolicy::Swallow => Ok(Outcome::Nothing),
        }
    }
}
