//! Convenient imports for typical `pgchain` usage.
//!
//! ```ignore
//! use pgchain::prelude::*;
//! ```

pub use crate::{
    BulkRows, ChainError, ChainResult, Cursor, Entity, ErrorPolicy, ExecOptions, Executor,
    Fields, Outcome, Record, Session, SessionConfig, Statement,
};
