use serde::{Deserialize, Serialize};

use tallybook_core::{AggregateId, Entity};

use crate::chart::ChartError;

/// Account identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub AggregateId);

impl AccountId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// High-level account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    /// The side on which increases to this account type are recorded.
    pub fn normal_balance(&self) -> Side {
        match self {
            AccountType::Asset | AccountType::Expense => Side::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Income => Side::Credit,
        }
    }
}

/// One side of a double-entry posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Debit,
    Credit,
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Side::Debit => f.write_str("debit"),
            Side::Credit => f.write_str("credit"),
        }
    }
}

/// Chart-of-accounts node.
///
/// `code` is the unique, sortable key the chart is ordered by; `parent_id`
/// forms the hierarchy (see [`crate::chart::build_tree`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub normal_balance: Side,
    pub parent_id: Option<AccountId>,
    pub is_active: bool,
}

impl Account {
    /// Create an active account with the normal balance implied by its type.
    pub fn new(
        id: AccountId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            account_type,
            normal_balance: account_type.normal_balance(),
            parent_id: None,
            is_active: true,
        }
    }

    /// Override the implied normal balance (contra accounts).
    pub fn with_normal_balance(mut self, side: Side) -> Self {
        self.normal_balance = side;
        self
    }

    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        if self.code.trim().is_empty() {
            return Err(ChartError::InvalidAccount {
                code: self.code.clone(),
                reason: "account code must not be empty".to_string(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(ChartError::InvalidAccount {
                code: self.code.clone(),
                reason: "account name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
