use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use tallybook_accounts::{AccountId, Side};
use tallybook_core::Money;

use crate::error::JournalError;

/// One debit-or-credit posting against an account.
///
/// Exactly one of `debit`/`credit` carries a positive amount; the other is
/// `None`. [`validate_lines`] enforces this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_id: AccountId,
    pub description: Option<String>,
    pub debit: Option<Money>,
    pub credit: Option<Money>,
}

impl JournalLine {
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            description: None,
            debit: Some(amount),
            credit: None,
        }
    }

    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            description: None,
            debit: None,
            credit: Some(amount),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Which side this line posts to, if the shape is valid.
    pub fn side(&self) -> Option<Side> {
        match (&self.debit, &self.credit) {
            (Some(_), None) => Some(Side::Debit),
            (None, Some(_)) => Some(Side::Credit),
            _ => None,
        }
    }

    pub fn amount(&self) -> Option<&Money> {
        self.debit.as_ref().or(self.credit.as_ref())
    }
}

/// Per-entry totals, one per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub debits: Money,
    pub credits: Money,
}

fn checked_amount(index: usize, line: &JournalLine) -> Result<(Side, Money), JournalError> {
    let invalid = |reason: &str| JournalError::InvalidLine {
        index,
        reason: reason.to_string(),
    };

    let (side, amount) = match (&line.debit, &line.credit) {
        (Some(_), Some(_)) => return Err(invalid("both debit and credit set")),
        (None, None) => return Err(invalid("neither debit nor credit set")),
        (Some(d), None) => (Side::Debit, *d),
        (None, Some(c)) => (Side::Credit, *c),
    };

    if amount.is_negative() {
        return Err(invalid("amount must not be negative"));
    }
    if amount.is_zero() {
        return Err(invalid("amount must not be zero"));
    }

    Ok((side, amount))
}

/// Shape-only checks: line count and per-line debit/credit validity.
///
/// Drafts pass through this; the balance invariant is enforced separately at
/// post time by [`validate_lines`].
pub(crate) fn check_line_shapes(lines: &[JournalLine]) -> Result<(), JournalError> {
    if lines.len() < 2 {
        return Err(JournalError::EmptyEntry { lines: lines.len() });
    }
    for (index, line) in lines.iter().enumerate() {
        checked_amount(index, line)?;
    }
    Ok(())
}

/// Full validation: shape checks plus the balance invariant.
///
/// Sums both sides with fixed-point arithmetic (epsilon is zero by
/// construction) and fails with [`JournalError::Unbalanced`] on any skew.
/// Currency mixing inside the entry surfaces as a
/// [`tallybook_core::MoneyError::CurrencyMismatch`].
pub fn validate_lines(lines: &[JournalLine]) -> Result<LineTotals, JournalError> {
    if lines.len() < 2 {
        return Err(JournalError::EmptyEntry { lines: lines.len() });
    }

    let mut debits: Option<Money> = None;
    let mut credits: Option<Money> = None;

    for (index, line) in lines.iter().enumerate() {
        let (side, amount) = checked_amount(index, line)?;
        let total = match side {
            Side::Debit => &mut debits,
            Side::Credit => &mut credits,
        };
        *total = Some(match total.take() {
            None => amount,
            Some(sum) => sum.checked_add(&amount)?,
        });
    }

    // A one-sided entry nets against zero in its own currency.
    let totals = match (debits, credits) {
        (Some(debits), Some(credits)) => LineTotals { debits, credits },
        (Some(debits), None) => LineTotals {
            debits,
            credits: Money::zero(debits.currency()),
        },
        (None, Some(credits)) => LineTotals {
            debits: Money::zero(credits.currency()),
            credits,
        },
        // Unreachable: lines >= 2 and every line carries an amount.
        (None, None) => return Err(JournalError::EmptyEntry { lines: lines.len() }),
    };

    if totals.debits.compare(&totals.credits)? != Ordering::Equal {
        return Err(JournalError::Unbalanced {
            debits: totals.debits,
            credits: totals.credits,
        });
    }

    Ok(totals)
}
