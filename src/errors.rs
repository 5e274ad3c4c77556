//! Typed error hierarchy for the board engine.
//!
//! Three enums cover the client-side failure taxonomy:
//! - `ValidationError` — bad input caught before any request is sent
//! - `PreconditionError` — operations rejected from already-known local state
//! - `EngineError` — the umbrella type returned by engine operations,
//!   including remote rejections and the rename-migration partial failure
//!
//! None of these are fatal: every error terminates at the UI boundary as a
//! transient notice and the model remains usable afterwards.

use thiserror::Error;

use crate::remote::RemoteError;

/// Input problems detected locally, before a request goes out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Column name cannot be blank")]
    BlankColumnName,

    #[error("Column name '{name}' already exists")]
    DuplicateColumnName { name: String },

    #[error("Card title cannot be empty")]
    EmptyCardTitle,

    #[error("Message cannot be empty")]
    EmptyMessage,
}

/// Operations rejected because local committed state forbids them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Column '{column}' still holds {cards} card(s) and cannot be deleted")]
    ColumnNotEmpty { column: String, cards: usize },

    #[error("The board must keep at least one column")]
    LastColumn,

    #[error("Unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("Unknown card {id}")]
    UnknownCard { id: i64 },

    #[error("No project is currently open")]
    NoActiveProject,
}

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The rename-migration flow stopped partway: `migrated` of `total`
    /// cards were re-pointed before the failure. No compensation requests
    /// are issued; the caller reports how far the flow got.
    #[error(
        "Renaming column '{column}' failed after migrating {migrated} of {total} card(s): {source}"
    )]
    RenameMigration {
        column: String,
        migrated: usize,
        total: usize,
        #[source]
        source: RemoteError,
    },
}

impl EngineError {
    /// Whether the operation left local state exactly as it was before the
    /// attempt. Validation and precondition failures never touch state;
    /// remote failures are rolled back where the engine holds a snapshot,
    /// so only the rename-migration path reports `false`.
    pub fn state_unchanged(&self) -> bool {
        !matches!(self, EngineError::RenameMigration { .. })
    }
}
