//! Event-stream projections (read models derived from journal events).
//!
//! Projections are idempotent: a per-aggregate cursor skips duplicates and
//! rejects sequence gaps, so at-least-once delivery from the bus is safe.

pub mod account_balances;
pub mod audit_trail;
pub mod journal_entries;

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use tallybook_core::AggregateId;

pub use account_balances::{AccountBalance, AccountBalancesProjection};
pub use audit_trail::{AuditAction, AuditRecord, AuditTrailProjection};
pub use journal_entries::{JournalEntriesProjection, JournalEntryReadModel};

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize event payload: {0}")]
    Deserialize(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Per-aggregate sequence cursors guarding idempotent application.
#[derive(Debug, Default)]
pub(crate) struct Cursors {
    inner: RwLock<HashMap<AggregateId, u64>>,
}

impl Cursors {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Gate an incoming sequence number.
    ///
    /// Returns `Ok(false)` for an already-seen event (skip it), `Ok(true)`
    /// when the event should be applied. A fresh cursor accepts any starting
    /// sequence (rebuild tolerance); after that, gaps are errors.
    pub(crate) fn gate(
        &self,
        aggregate_id: AggregateId,
        sequence_number: u64,
    ) -> Result<bool, ProjectionError> {
        let last = match self.inner.read() {
            Ok(map) => map.get(&aggregate_id).copied().unwrap_or(0),
            Err(_) => 0,
        };

        if sequence_number == 0 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: 0 });
        }
        if sequence_number <= last {
            return Ok(false);
        }
        if last != 0 && sequence_number != last + 1 {
            return Err(ProjectionError::NonMonotonicSequence {
                last,
                found: sequence_number,
            });
        }
        Ok(true)
    }

    pub(crate) fn advance(&self, aggregate_id: AggregateId, sequence_number: u64) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(aggregate_id, sequence_number);
        }
    }
}
