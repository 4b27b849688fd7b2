//! Chart of accounts: ledger account records and the account hierarchy.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod account;
pub mod chart;

pub use account::{Account, AccountId, AccountType, Side};
pub use chart::{build_tree, AccountNode, Chart, ChartError, ChartWarning};
