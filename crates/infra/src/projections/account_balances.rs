use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tallybook_accounts::AccountId;
use tallybook_events::EventEnvelope;
use tallybook_journal::{JournalEvent, JournalLine};

use crate::projections::{Cursors, ProjectionError};
use crate::read_model::KeyedStore;

/// Read model: running balance per ledger account.
///
/// Balances are signed minor units, debit-positive. Only posted entries
/// contribute; an unpost reverses exactly what the post applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub balance: i128,
}

/// Projection: journal events -> account balances.
#[derive(Debug)]
pub struct AccountBalancesProjection<S>
where
    S: KeyedStore<AccountId, AccountBalance>,
{
    store: S,
    cursors: Cursors,
}

impl<S> AccountBalancesProjection<S>
where
    S: KeyedStore<AccountId, AccountBalance>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: Cursors::new(),
        }
    }

    pub fn get(&self, account_id: &AccountId) -> Option<AccountBalance> {
        self.store.get(account_id)
    }

    pub fn list(&self) -> Vec<AccountBalance> {
        self.store.list()
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

        match &ev {
            JournalEvent::EntryPosted(e) => self.apply_lines(&e.lines, 1),
            JournalEvent::EntryUnposted(e) => self.apply_lines(&e.lines, -1),
            _ => {}
        }

        self.cursors.advance(envelope.aggregate_id(), envelope.sequence_number());
        Ok(())
    }

    fn apply_lines(&self, lines: &[JournalLine], direction: i128) {
        for line in lines {
            // Debit positive, credit negative; a validated posted entry has
            // exactly one side per line.
            let delta: i128 = match (&line.debit, &line.credit) {
                (Some(d), None) => i128::from(d.minor()),
                (None, Some(c)) => -i128::from(c.minor()),
                _ => continue,
            };

            let mut balance = self.store.get(&line.account_id).unwrap_or(AccountBalance {
                account_id: line.account_id,
                balance: 0,
            });
            balance.balance += delta * direction;
            self.store.upsert(line.account_id, balance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_model::InMemoryStore;
    use chrono::Utc;
    use std::sync::Arc;
    use tallybook_core::{AggregateId, Currency, Money};
    use tallybook_journal::{EntryId, EntryPosted, EntryUnposted};
    use uuid::Uuid;

    fn usd(minor: i64) -> Money {
        Money::from_minor(minor, Currency::new("USD").unwrap())
    }

    fn envelope(aggregate_id: AggregateId, seq: u64, ev: &JournalEvent) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            aggregate_id,
            "journal.entry",
            seq,
            serde_json::to_value(ev).unwrap(),
        )
    }

    fn projection() -> AccountBalancesProjection<Arc<InMemoryStore<AccountId, AccountBalance>>> {
        AccountBalancesProjection::new(Arc::new(InMemoryStore::new()))
    }

    #[test]
    fn posted_lines_move_balances_debit_positive() {
        let p = projection();
        let agg = AggregateId::new();
        let cash = AccountId::new(AggregateId::new());
        let revenue = AccountId::new(AggregateId::new());

        let lines = vec![
            JournalLine::debit(cash, usd(50_000)),
            JournalLine::credit(revenue, usd(50_000)),
        ];
        let posted = JournalEvent::EntryPosted(EntryPosted {
            entry_id: EntryId::new(agg),
            lines,
            occurred_at: Utc::now(),
        });

        p.apply_envelope(&envelope(agg, 1, &posted)).unwrap();

        assert_eq!(p.get(&cash).unwrap().balance, 50_000);
        assert_eq!(p.get(&revenue).unwrap().balance, -50_000);
    }

    #[test]
    fn unpost_reverses_the_posted_contribution() {
        let p = projection();
        let agg = AggregateId::new();
        let cash = AccountId::new(AggregateId::new());
        let revenue = AccountId::new(AggregateId::new());

        let lines = vec![
            JournalLine::debit(cash, usd(12_345)),
            JournalLine::credit(revenue, usd(12_345)),
        ];
        let posted = JournalEvent::EntryPosted(EntryPosted {
            entry_id: EntryId::new(agg),
            lines: lines.clone(),
            occurred_at: Utc::now(),
        });
        let unposted = JournalEvent::EntryUnposted(EntryUnposted {
            entry_id: EntryId::new(agg),
            lines,
            reason: "wrong period".to_string(),
            occurred_at: Utc::now(),
        });

        p.apply_envelope(&envelope(agg, 1, &posted)).unwrap();
        p.apply_envelope(&envelope(agg, 2, &unposted)).unwrap();

        assert_eq!(p.get(&cash).unwrap().balance, 0);
        assert_eq!(p.get(&revenue).unwrap().balance, 0);
    }

    #[test]
    fn duplicate_delivery_is_a_no_op() {
        let p = projection();
        let agg = AggregateId::new();
        let cash = AccountId::new(AggregateId::new());
        let revenue = AccountId::new(AggregateId::new());

        let posted = JournalEvent::EntryPosted(EntryPosted {
            entry_id: EntryId::new(agg),
            lines: vec![
                JournalLine::debit(cash, usd(100)),
                JournalLine::credit(revenue, usd(100)),
            ],
            occurred_at: Utc::now(),
        });

        let env = envelope(agg, 1, &posted);
        p.apply_envelope(&env).unwrap();
        p.apply_envelope(&env).unwrap();

        assert_eq!(p.get(&cash).unwrap().balance, 100);
    }

    #[test]
    fn sequence_gaps_are_rejected() {
        let p = projection();
        let agg = AggregateId::new();

        let posted = JournalEvent::EntryPosted(EntryPosted {
            entry_id: EntryId::new(agg),
            lines: vec![],
            occurred_at: Utc::now(),
        });

        p.apply_envelope(&envelope(agg, 1, &posted)).unwrap();
        let err = p.apply_envelope(&envelope(agg, 3, &posted)).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::NonMonotonicSequence { last: 1, found: 3 }
        ));
    }
}
