//! Bank reconciliation: statement ingestion types and the pure calculator
//! that compares statement balances against book balances derived from
//! posted journal entries.

pub mod calculator;
pub mod statement;

pub use calculator::{
    classify, compute_difference, match_lines, summarize, MatchOutcome, MatchPolicy,
    ReconciliationRecord, ReconciliationStatus,
};
pub use statement::{BankAccount, BankAccountId, BankStatement, BookTransaction, StatementLine};
