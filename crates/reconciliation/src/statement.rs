use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tallybook_core::{AggregateId, Currency, Entity, Money};
use tallybook_journal::EntryId;

/// Bank account identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankAccountId(pub AggregateId);

impl BankAccountId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for BankAccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A bank account under reconciliation.
///
/// `ledger_account_code` names the ledger account whose book balance this
/// bank account is measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub name: String,
    pub ledger_account_code: String,
    pub currency: Currency,
}

impl Entity for BankAccount {
    type Id = BankAccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One line on a bank statement. `amount` is signed from the bank's
/// perspective: deposits positive, withdrawals negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    pub posted_on: NaiveDate,
    pub amount: Money,
    pub reference: String,
}

/// A bank statement as reported by the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStatement {
    pub bank_account_id: BankAccountId,
    pub statement_date: NaiveDate,
    pub closing_balance: Money,
    pub lines: Vec<StatementLine>,
}

/// A book-side transaction derived from a posted journal entry, reduced to
/// the bank account's perspective (signed amount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookTransaction {
    pub entry_id: EntryId,
    pub posted_on: NaiveDate,
    pub amount: Money,
    pub reference: Option<String>,
}
