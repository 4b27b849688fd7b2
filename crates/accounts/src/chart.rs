//! Chart-of-accounts tree assembly.
//!
//! A flat account list becomes a forest in two passes: build an id -> account
//! map, then attach each account to its parent or promote it to a root.
//! Orphans (missing or self parent) are promoted to roots and reported as
//! data-integrity warnings; cycles among present accounts are a hard error.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tallybook_core::DomainError;

use crate::account::{Account, AccountId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("invalid account {code:?}: {reason}")]
    InvalidAccount { code: String, reason: String },

    #[error("duplicate account code: {0}")]
    DuplicateCode(String),

    #[error("duplicate account id: {0}")]
    DuplicateId(AccountId),

    #[error("cyclic account hierarchy involving {} account(s)", account_ids.len())]
    CyclicHierarchy { account_ids: Vec<AccountId> },
}

impl From<ChartError> for DomainError {
    fn from(value: ChartError) -> Self {
        match &value {
            ChartError::InvalidAccount { .. } => DomainError::validation(value.to_string()),
            ChartError::DuplicateCode(_) | ChartError::DuplicateId(_) => {
                DomainError::conflict(value.to_string())
            }
            ChartError::CyclicHierarchy { .. } => DomainError::invariant(value.to_string()),
        }
    }
}

/// Data-integrity warning attached to a built chart.
///
/// The affected account still renders (as a root), but the condition points
/// at inconsistent reference data and is surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartWarning {
    /// `parent_id` does not exist in the chart; the account was promoted to
    /// a root.
    MissingParent {
        account_id: AccountId,
        code: String,
        parent_id: AccountId,
    },
    /// The account names itself as its parent; promoted to a root.
    SelfParent { account_id: AccountId, code: String },
}

impl core::fmt::Display for ChartWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ChartWarning::MissingParent { code, parent_id, .. } => {
                write!(f, "account {code:?} references missing parent {parent_id}; treated as root")
            }
            ChartWarning::SelfParent { code, .. } => {
                write!(f, "account {code:?} references itself as parent; treated as root")
            }
        }
    }
}

/// A chart node: one account plus its children, each level sorted by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNode {
    pub account: Account,
    pub children: Vec<AccountNode>,
}

/// Assembled chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    pub roots: Vec<AccountNode>,
    pub warnings: Vec<ChartWarning>,
}

impl Chart {
    /// Total number of accounts in the forest.
    pub fn len(&self) -> usize {
        fn count(node: &AccountNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first (pre-order) walk over all accounts.
    pub fn accounts(&self) -> Vec<&Account> {
        fn walk<'a>(node: &'a AccountNode, out: &mut Vec<&'a Account>) {
            out.push(&node.account);
            for child in &node.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        for root in &self.roots {
            walk(root, &mut out);
        }
        out
    }

    pub fn find_by_code(&self, code: &str) -> Option<&Account> {
        self.accounts().into_iter().find(|a| a.code == code)
    }
}

/// Build the account forest from a flat list.
///
/// Roots (and every child list) are sorted by `code` ascending. An account
/// whose parent is missing or is itself becomes a root with a
/// [`ChartWarning`]; accounts trapped in a parent cycle fail the whole build
/// with [`ChartError::CyclicHierarchy`].
pub fn build_tree(accounts: Vec<Account>) -> Result<Chart, ChartError> {
    let mut by_id: HashMap<AccountId, Account> = HashMap::with_capacity(accounts.len());
    let mut codes: HashSet<String> = HashSet::with_capacity(accounts.len());

    for account in accounts {
        account.validate()?;
        if !codes.insert(account.code.clone()) {
            return Err(ChartError::DuplicateCode(account.code));
        }
        let id = account.id;
        if by_id.insert(id, account).is_some() {
            return Err(ChartError::DuplicateId(id));
        }
    }

    let mut warnings = Vec::new();
    let mut children: HashMap<AccountId, Vec<AccountId>> = HashMap::new();
    let mut root_ids: Vec<AccountId> = Vec::new();

    for account in by_id.values() {
        match account.parent_id {
            None => root_ids.push(account.id),
            Some(parent) if parent == account.id => {
                warnings.push(ChartWarning::SelfParent {
                    account_id: account.id,
                    code: account.code.clone(),
                });
                root_ids.push(account.id);
            }
            Some(parent) if !by_id.contains_key(&parent) => {
                warnings.push(ChartWarning::MissingParent {
                    account_id: account.id,
                    code: account.code.clone(),
                    parent_id: parent,
                });
                root_ids.push(account.id);
            }
            Some(parent) => children.entry(parent).or_default().push(account.id),
        }
    }

    // Everything not reachable from a root sits on a parent cycle.
    let mut reachable: HashSet<AccountId> = HashSet::with_capacity(by_id.len());
    let mut stack: Vec<AccountId> = root_ids.clone();
    while let Some(id) = stack.pop() {
        if reachable.insert(id) {
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }
    }
    if reachable.len() != by_id.len() {
        let mut account_ids: Vec<AccountId> = by_id
            .keys()
            .filter(|id| !reachable.contains(id))
            .copied()
            .collect();
        account_ids.sort_by_key(|id| *id.0.as_uuid());
        return Err(ChartError::CyclicHierarchy { account_ids });
    }

    // Each id is reachable exactly once, so the remove always hits; the
    // Option keeps the walk panic-free regardless.
    fn assemble(
        id: AccountId,
        by_id: &mut HashMap<AccountId, Account>,
        children: &HashMap<AccountId, Vec<AccountId>>,
    ) -> Option<AccountNode> {
        let account = by_id.remove(&id)?;
        let mut kids: Vec<AccountNode> = children
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|child| assemble(*child, by_id, children))
                    .collect()
            })
            .unwrap_or_default();
        kids.sort_by(|a, b| a.account.code.cmp(&b.account.code));
        Some(AccountNode { account, children: kids })
    }

    let mut roots: Vec<AccountNode> = root_ids
        .into_iter()
        .filter_map(|id| assemble(id, &mut by_id, &children))
        .collect();
    roots.sort_by(|a, b| a.account.code.cmp(&b.account.code));

    Ok(Chart { roots, warnings })
}
