use thiserror::Error;

use tallybook_core::{DomainError, Money, MoneyError};

use crate::entry::EntryStatus;

/// Typed journal validation/transition error.
///
/// These are deterministic failures over caller-supplied data; the caller
/// corrects input and resubmits. They convert into [`DomainError`] at the
/// dispatch boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JournalError {
    #[error("journal entry must have at least 2 lines, found {lines}")]
    EmptyEntry { lines: usize },

    #[error("invalid journal line {index}: {reason}")]
    InvalidLine { index: usize, reason: String },

    #[error("entry is unbalanced: debits {debits} != credits {credits}")]
    Unbalanced { debits: Money, credits: Money },

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("entry is {status} and its lines are immutable")]
    Immutable { status: EntryStatus },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: EntryStatus, to: EntryStatus },

    #[error("a non-empty reason is required to {action} an entry")]
    ReasonRequired { action: &'static str },

    #[error("journal entry already exists")]
    AlreadyExists,

    #[error("journal entry not found")]
    NotFound,

    #[error("entry_id does not match the aggregate")]
    EntryIdMismatch,
}

impl From<JournalError> for DomainError {
    fn from(value: JournalError) -> Self {
        match &value {
            JournalError::EmptyEntry { .. }
            | JournalError::InvalidLine { .. }
            | JournalError::ReasonRequired { .. } => DomainError::validation(value.to_string()),
            JournalError::Unbalanced { .. }
            | JournalError::Money(_)
            | JournalError::Immutable { .. }
            | JournalError::EntryIdMismatch => DomainError::invariant(value.to_string()),
            JournalError::InvalidTransition { .. } | JournalError::AlreadyExists => {
                DomainError::conflict(value.to_string())
            }
            JournalError::NotFound => DomainError::not_found(),
        }
    }
}
