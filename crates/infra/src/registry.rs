//! Reference-data registries: the account directory and the bank directory.
//!
//! Deliberately not event-sourced — the chart of accounts and bank
//! statements are externally owned reference data; the engine only needs a
//! consistent snapshot to validate against and reconcile with.

use std::collections::HashMap;
use std::sync::RwLock;

use tallybook_accounts::{Account, AccountId, ChartError};
use tallybook_reconciliation::{BankAccount, BankAccountId, BankStatement};

/// Directory of ledger accounts, unique by id and by code.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    inner: RwLock<HashMap<AccountId, Account>>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a validated account; duplicate codes are rejected.
    pub fn insert(&self, account: Account) -> Result<(), ChartError> {
        account.validate()?;

        let mut map = match self.inner.write() {
            Ok(map) => map,
            Err(_) => return Ok(()), // poisoned lock: drop the write
        };
        if map.values().any(|a| a.code == account.code && a.id != account.id) {
            return Err(ChartError::DuplicateCode(account.code));
        }
        map.insert(account.id, account);
        Ok(())
    }

    pub fn get(&self, id: &AccountId) -> Option<Account> {
        self.inner.read().ok()?.get(id).cloned()
    }

    pub fn find_by_code(&self, code: &str) -> Option<Account> {
        self.inner
            .read()
            .ok()?
            .values()
            .find(|a| a.code == code)
            .cloned()
    }

    /// All accounts, sorted by code ascending.
    pub fn list(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .inner
            .read()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts
    }
}

/// Bank accounts plus the most recent statement per bank account.
#[derive(Debug, Default)]
pub struct BankDirectory {
    accounts: RwLock<HashMap<BankAccountId, BankAccount>>,
    statements: RwLock<HashMap<BankAccountId, BankStatement>>,
}

impl BankDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&self, account: BankAccount) {
        if let Ok(mut map) = self.accounts.write() {
            map.insert(account.id, account);
        }
    }

    pub fn get_account(&self, id: &BankAccountId) -> Option<BankAccount> {
        self.accounts.read().ok()?.get(id).cloned()
    }

    pub fn list_accounts(&self) -> Vec<BankAccount> {
        self.accounts
            .read()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Register a statement; newer statements replace older ones.
    pub fn put_statement(&self, statement: BankStatement) {
        if let Ok(mut map) = self.statements.write() {
            map.insert(statement.bank_account_id, statement);
        }
    }

    /// Latest statement, if any has been registered ("no data" otherwise).
    pub fn latest_statement(&self, id: &BankAccountId) -> Option<BankStatement> {
        self.statements.read().ok()?.get(id).cloned()
    }
}
