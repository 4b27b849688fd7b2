//! Pure reconciliation arithmetic.
//!
//! Difference and classification follow standard bank-reconciliation
//! doctrine: a positive difference means the statement reports more than the
//! books (look for missing deposits/bank-side items), a negative one means
//! the books carry more than the statement (look for outstanding checks and
//! uncleared debits). Statement-line matching is an explicit, policy-driven
//! step; nothing is matched implicitly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tallybook_core::{Money, MoneyError};
use tallybook_journal::EntryId;

use crate::statement::{BankAccountId, BankStatement, BookTransaction, StatementLine};

/// Outcome classification of a statement-vs-book comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Statement and book balances agree.
    Reconciled,
    /// Statement higher than books: investigate missing deposits or other
    /// bank-side items not yet booked.
    StatementHigher,
    /// Books higher than statement: investigate outstanding checks and
    /// uncleared debits.
    BooksHigher,
}

impl core::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ReconciliationStatus::Reconciled => "reconciled",
            ReconciliationStatus::StatementHigher => "statement_higher",
            ReconciliationStatus::BooksHigher => "books_higher",
        };
        f.write_str(s)
    }
}

/// `statement_balance - book_balance`, currency-checked.
pub fn compute_difference(
    statement_balance: &Money,
    book_balance: &Money,
) -> Result<Money, MoneyError> {
    statement_balance.checked_sub(book_balance)
}

pub fn classify(difference: &Money) -> ReconciliationStatus {
    if difference.is_zero() {
        ReconciliationStatus::Reconciled
    } else if difference.is_positive() {
        ReconciliationStatus::StatementHigher
    } else {
        ReconciliationStatus::BooksHigher
    }
}

/// Matching policy for pairing book transactions with statement lines.
///
/// Matching by amount plus date window is a capability this engine adds on
/// top of manual reconciliation; callers opt in by choosing a window. A zero
/// window still requires same-day, equal-amount pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPolicy {
    pub date_window_days: i64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self { date_window_days: 3 }
    }
}

/// Result of a matching pass. Counts, not transaction objects, feed the
/// summary surface; the index/id pairs are kept for drill-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Matched pairs: (book entry id, statement line index).
    pub matched: Vec<(EntryId, usize)>,
    pub unmatched_book: Vec<EntryId>,
    pub unmatched_statement: Vec<usize>,
}

/// Greedily pair book transactions with statement lines of equal signed
/// amount whose dates fall within the policy window; the nearest date wins.
/// Each statement line matches at most once.
pub fn match_lines(
    book: &[BookTransaction],
    statement_lines: &[StatementLine],
    policy: &MatchPolicy,
) -> MatchOutcome {
    let mut taken = vec![false; statement_lines.len()];
    let mut matched = Vec::new();
    let mut unmatched_book = Vec::new();

    for txn in book {
        let mut best: Option<(usize, i64)> = None;
        for (idx, line) in statement_lines.iter().enumerate() {
            if taken[idx] || line.amount != txn.amount {
                continue;
            }
            let gap = (line.posted_on - txn.posted_on).num_days().abs();
            if gap > policy.date_window_days {
                continue;
            }
            if best.is_none_or(|(_, best_gap)| gap < best_gap) {
                best = Some((idx, gap));
            }
        }

        match best {
            Some((idx, _)) => {
                taken[idx] = true;
                matched.push((txn.entry_id, idx));
            }
            None => unmatched_book.push(txn.entry_id),
        }
    }

    let unmatched_statement = taken
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(idx, _)| idx)
        .collect();

    MatchOutcome {
        matched,
        unmatched_book,
        unmatched_statement,
    }
}

/// Derived reconciliation summary. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub bank_account_id: BankAccountId,
    pub statement_date: NaiveDate,
    pub statement_balance: Money,
    pub book_balance: Money,
    pub difference: Money,
    pub status: ReconciliationStatus,
    pub reconciled_count: usize,
    pub unreconciled_count: usize,
}

/// Compare a statement against the book balance and count matched vs
/// unmatched transactions up to the statement date.
pub fn summarize(
    book: &[BookTransaction],
    book_balance: Money,
    statement: &BankStatement,
    policy: &MatchPolicy,
) -> Result<ReconciliationRecord, MoneyError> {
    let cutoff = statement.statement_date;
    let in_scope: Vec<BookTransaction> = book
        .iter()
        .filter(|t| t.posted_on <= cutoff)
        .cloned()
        .collect();

    let outcome = match_lines(&in_scope, &statement.lines, policy);
    let difference = compute_difference(&statement.closing_balance, &book_balance)?;

    Ok(ReconciliationRecord {
        bank_account_id: statement.bank_account_id,
        statement_date: cutoff,
        statement_balance: statement.closing_balance,
        book_balance,
        difference,
        status: classify(&difference),
        reconciled_count: outcome.matched.len(),
        unreconciled_count: outcome.unmatched_book.len(),
    })
}
