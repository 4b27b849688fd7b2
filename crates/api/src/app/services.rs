//! In-memory service wiring: store + bus + dispatcher + projections +
//! reference-data registries, with a background bus -> projection subscriber.

use std::sync::Arc;

use tallybook_accounts::AccountId;
use tallybook_core::{AggregateId, Currency, Money};
use tallybook_events::{EventBus, EventEnvelope, InMemoryEventBus};
use tallybook_infra::{
    command_dispatcher::{CommandDispatcher, DispatchError},
    event_store::{InMemoryEventStore, StoredEvent},
    projections::{
        AccountBalance, AccountBalancesProjection, AuditRecord, AuditTrailProjection,
        JournalEntriesProjection, JournalEntryReadModel,
    },
    read_model::InMemoryStore,
    registry::{AccountDirectory, BankDirectory},
};
use tallybook_journal::{EntryId, EntryStatus, JournalCommand, JournalEntry};
use tallybook_reconciliation::BookTransaction;

type InMemoryDispatcher = CommandDispatcher<
    Arc<InMemoryEventStore>,
    Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>,
>;

type BalancesProjection = AccountBalancesProjection<Arc<InMemoryStore<AccountId, AccountBalance>>>;
type EntriesProjection =
    JournalEntriesProjection<Arc<InMemoryStore<EntryId, JournalEntryReadModel>>>;
type AuditProjection = AuditTrailProjection<Arc<InMemoryStore<EntryId, Vec<AuditRecord>>>>;

pub struct AppServices {
    dispatcher: Arc<InMemoryDispatcher>,
    balances: Arc<BalancesProjection>,
    entries: Arc<EntriesProjection>,
    audit: Arc<AuditProjection>,
    accounts: Arc<AccountDirectory>,
    banks: Arc<BankDirectory>,
}

/// Wire the in-memory stack.
///
/// The command path appends to the store and publishes to the bus; a
/// background thread drains the bus into the projections, so read models are
/// eventually consistent with the stream.
pub fn build_services() -> AppServices {
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>> =
        Arc::new(InMemoryEventBus::new());

    let balances: Arc<BalancesProjection> =
        Arc::new(AccountBalancesProjection::new(Arc::new(InMemoryStore::new())));
    let entries: Arc<EntriesProjection> =
        Arc::new(JournalEntriesProjection::new(Arc::new(InMemoryStore::new())));
    let audit: Arc<AuditProjection> =
        Arc::new(AuditTrailProjection::new(Arc::new(InMemoryStore::new())));

    // Background subscriber: bus -> projections. Exits when the bus is
    // dropped (recv fails).
    {
        let sub = bus.subscribe();
        let balances = balances.clone();
        let entries = entries.clone();
        let audit = audit.clone();
        std::thread::spawn(move || loop {
            match sub.recv() {
                Ok(env) => {
                    if let Err(e) = balances.apply_envelope(&env) {
                        tracing::warn!("balances projection apply failed: {e}");
                    }
                    if let Err(e) = entries.apply_envelope(&env) {
                        tracing::warn!("entries projection apply failed: {e}");
                    }
                    if let Err(e) = audit.apply_envelope(&env) {
                        tracing::warn!("audit projection apply failed: {e}");
                    }
                }
                Err(_) => break,
            }
        });
    }

    let dispatcher: Arc<InMemoryDispatcher> = Arc::new(CommandDispatcher::new(store, bus));

    AppServices {
        dispatcher,
        balances,
        entries,
        audit,
        accounts: Arc::new(AccountDirectory::new()),
        banks: Arc::new(BankDirectory::new()),
    }
}

impl AppServices {
    pub fn dispatch_journal(
        &self,
        aggregate_id: AggregateId,
        command: JournalCommand,
    ) -> Result<Vec<StoredEvent>, DispatchError> {
        self.dispatcher
            .dispatch::<JournalEntry>(aggregate_id, "journal.entry", command, |id| {
                JournalEntry::empty(EntryId::new(id))
            })
    }

    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    pub fn banks(&self) -> &BankDirectory {
        &self.banks
    }

    pub fn entry_get(&self, entry_id: &EntryId) -> Option<JournalEntryReadModel> {
        self.entries.get(entry_id)
    }

    pub fn entries_search(
        &self,
        query: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<JournalEntryReadModel> {
        self.entries.search(query, limit)
    }

    pub fn audit_for_entry(&self, entry_id: &EntryId) -> Vec<AuditRecord> {
        self.audit.for_entry(entry_id)
    }

    pub fn balances_list(&self) -> Vec<AccountBalance> {
        self.balances.list()
    }

    pub fn balance_for_account(&self, account_id: &AccountId) -> i128 {
        self.balances
            .get(account_id)
            .map(|b| b.balance)
            .unwrap_or(0)
    }

    /// Book balance for a ledger account code, in the given currency.
    ///
    /// An unknown code or an account with no postings is a zero balance, not
    /// an error. `None` means the balance does not fit the money range.
    pub fn book_balance_for_code(&self, code: &str, currency: Currency) -> Option<Money> {
        let minor = match self.accounts.find_by_code(code) {
            Some(account) => self.balance_for_account(&account.id),
            None => 0,
        };
        i64::try_from(minor).ok().map(|m| Money::from_minor(m, currency))
    }

    /// Posted transactions touching the given ledger account, reduced to
    /// signed amounts from that account's perspective.
    pub fn book_transactions_for_account(
        &self,
        account_id: &AccountId,
        currency: Currency,
    ) -> Vec<BookTransaction> {
        let mut out = Vec::new();
        for rm in self.entries.list() {
            if rm.status != EntryStatus::Posted {
                continue;
            }
            let mut minor: i64 = 0;
            let mut touched = false;
            for line in &rm.lines {
                if line.account_id != *account_id {
                    continue;
                }
                touched = true;
                if let Some(d) = &line.debit {
                    minor = minor.saturating_add(d.minor());
                }
                if let Some(c) = &line.credit {
                    minor = minor.saturating_sub(c.minor());
                }
            }
            if touched {
                out.push(BookTransaction {
                    entry_id: rm.entry_id,
                    posted_on: rm.date.date_naive(),
                    amount: Money::from_minor(minor, currency),
                    reference: rm.reference.clone(),
                });
            }
        }
        out
    }
}
