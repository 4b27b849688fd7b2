use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tallybook_events::EventEnvelope;
use tallybook_journal::{EntryId, JournalEvent};

use crate::projections::{Cursors, ProjectionError};
use crate::read_model::KeyedStore;

/// Lifecycle action recorded against a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Drafted,
    LinesRevised,
    Approved,
    Posted,
    Unposted,
    Rejected,
    Discarded,
}

/// One audit trail row. Unpost and reject carry the operator's reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub entry_id: EntryId,
    pub action: AuditAction,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub sequence_number: u64,
}

/// Projection: journal events -> per-entry audit trail.
///
/// This is the queryable face of the "logged, not silently mutated"
/// requirement; the event stream itself remains the durable record.
#[derive(Debug)]
pub struct AuditTrailProjection<S>
where
    S: KeyedStore<EntryId, Vec<AuditRecord>>,
{
    store: S,
    cursors: Cursors,
}

impl<S> AuditTrailProjection<S>
where
    S: KeyedStore<EntryId, Vec<AuditRecord>>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: Cursors::new(),
        }
    }

    /// Audit rows for one entry, in stream order.
    pub fn for_entry(&self, entry_id: &EntryId) -> Vec<AuditRecord> {
        self.store.get(entry_id).unwrap_or_default()
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != "journal.entry" {
            return Ok(());
        }
        if !self.cursors.gate(envelope.aggregate_id(), envelope.sequence_number())? {
            return Ok(());
        }

        let ev: JournalEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let (entry_id, action, reason, occurred_at) = match ev {
            JournalEvent::EntryDrafted(e) => (e.entry_id, AuditAction::Drafted, None, e.occurred_at),
            JournalEvent::LinesRevised(e) => {
                (e.entry_id, AuditAction::LinesRevised, None, e.occurred_at)
            }
            JournalEvent::EntryApproved(e) => {
                (e.entry_id, AuditAction::Approved, None, e.occurred_at)
            }
            JournalEvent::EntryPosted(e) => (e.entry_id, AuditAction::Posted, None, e.occurred_at),
            JournalEvent::EntryUnposted(e) => (
                e.entry_id,
                AuditAction::Unposted,
                Some(e.reason),
                e.occurred_at,
            ),
            JournalEvent::EntryRejected(e) => (
                e.entry_id,
                AuditAction::Rejected,
                Some(e.reason),
                e.occurred_at,
            ),
            JournalEvent::EntryDiscarded(e) => {
                (e.entry_id, AuditAction::Discarded, None, e.occurred_at)
            }
        };

        let mut trail = self.store.get(&entry_id).unwrap_or_default();
        trail.push(AuditRecord {
            entry_id,
            action,
            reason,
            occurred_at,
            sequence_number: envelope.sequence_number(),
        });
        self.store.upsert(entry_id, trail);

        self.cursors.advance(envelope.aggregate_id(), envelope.sequence_number());
        Ok(())
    }
}
