use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tallybook_core::Currency;
use tallybook_events::EventEnvelope;
use tallybook_journal::{EntryId, EntryStatus, JournalEvent, JournalLine};

use crate::projections::{Cursors, ProjectionError};
use crate::read_model::KeyedStore;

/// Read model: one journal entry as the list/query surface sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryReadModel {
    pub entry_id: EntryId,
    pub date: DateTime<Utc>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub status: EntryStatus,
    pub lines: Vec<JournalLine>,
    /// Lenient display totals in minor units (drafts may be unbalanced).
    pub total_debit_minor: i64,
    pub total_credit_minor: i64,
    pub currency: Option<Currency>,
    pub posted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

fn totals(lines: &[JournalLine]) -> (i64, i64, Option<Currency>) {
    let mut debit: i64 = 0;
    let mut credit: i64 = 0;
    let mut currency = None;
    for line in lines {
        if let Some(d) = &line.debit {
            debit = debit.saturating_add(d.minor());
            currency.get_or_insert(d.currency());
        }
        if let Some(c) = &line.credit {
            credit = credit.saturating_add(c.minor());
            currency.get_or_insert(c.currency());
        }
    }
    (debit, credit, currency)
}

/// Projection: journal events -> entry read models.
#[derive(Debug)]
pub struct JournalEntriesProjection<S>
where
    S: KeyedStore<EntryId, JournalEntryReadModel>,
{
    store: S,
    cursors: Cursors,
}

impl<S> JournalEntriesProjection<S>
where
    S: KeyedStore<EntryId, JournalEntryReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: Cursors::new(),
        }
    }

    pub fn get(&self, entry_id: &EntryId) -> Option<JournalEntryReadModel> {
        self.store.get(entry_id)
    }

    pub fn list(&self) -> Vec<JournalEntryReadModel> {
        self.store.list()
    }

    /// Case-insensitive substring search over reference and description,
    /// newest first, optionally capped.
    pub fn search(&self, query: Option<&str>, limit: Option<usize>) -> Vec<JournalEntryReadModel> {
        let needle = query.map(|q| q.to_lowercase());
        let mut entries: Vec<JournalEntryReadModel> = self
            .store
            .list()
            .into_iter()
            .filter(|rm| match &needle {
                None => true,
                Some(n) if n.is_empty() => true,
                Some(n) => {
                    rm.reference
                        .as_deref()
                        .is_some_and(|r| r.to_lowercase().contains(n))
                        || rm
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(n))
                }
            })
            .collect();

        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.updated_at.cmp(&a.updated_at)));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
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

        match ev {
            JournalEvent::EntryDrafted(e) => {
                let (total_debit_minor, total_credit_minor, currency) = totals(&e.lines);
                self.store.upsert(
                    e.entry_id,
                    JournalEntryReadModel {
                        entry_id: e.entry_id,
                        date: e.date,
                        reference: e.reference,
                        description: e.description,
                        status: EntryStatus::Draft,
                        lines: e.lines,
                        total_debit_minor,
                        total_credit_minor,
                        currency,
                        posted_at: None,
                        updated_at: e.occurred_at,
                    },
                );
            }
            JournalEvent::LinesRevised(e) => {
                if let Some(mut rm) = self.store.get(&e.entry_id) {
                    let (d, c, currency) = totals(&e.lines);
                    rm.lines = e.lines;
                    rm.total_debit_minor = d;
                    rm.total_credit_minor = c;
                    rm.currency = currency;
                    rm.updated_at = e.occurred_at;
                    self.store.upsert(e.entry_id, rm);
                }
            }
            JournalEvent::EntryApproved(e) => {
                self.update_status(e.entry_id, EntryStatus::Approved, None, e.occurred_at);
            }
            JournalEvent::EntryPosted(e) => {
                self.update_status(e.entry_id, EntryStatus::Posted, Some(e.occurred_at), e.occurred_at);
            }
            JournalEvent::EntryUnposted(e) => {
                if let Some(mut rm) = self.store.get(&e.entry_id) {
                    rm.status = EntryStatus::Draft;
                    rm.posted_at = None;
                    rm.updated_at = e.occurred_at;
                    self.store.upsert(e.entry_id, rm);
                }
            }
            JournalEvent::EntryRejected(e) => {
                self.update_status(e.entry_id, EntryStatus::Rejected, None, e.occurred_at);
            }
            JournalEvent::EntryDiscarded(e) => {
                // Discarded drafts disappear from the surface entirely.
                self.store.remove(&e.entry_id);
            }
        }

        self.cursors.advance(envelope.aggregate_id(), envelope.sequence_number());
        Ok(())
    }

    fn update_status(
        &self,
        entry_id: EntryId,
        status: EntryStatus,
        posted_at: Option<DateTime<Utc>>,
        occurred_at: DateTime<Utc>,
    ) {
        if let Some(mut rm) = self.store.get(&entry_id) {
            rm.status = status;
            if let Some(ts) = posted_at {
                rm.posted_at = Some(ts);
            }
            rm.updated_at = occurred_at;
            self.store.upsert(entry_id, rm);
        }
    }
}
