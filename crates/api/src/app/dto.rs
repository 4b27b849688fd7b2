//! Request DTOs and JSON mapping helpers.
//!
//! Amounts cross this boundary as decimal strings and are parsed into
//! fixed-point [`Money`] exactly once, here. Responses render them back the
//! same way; no floating point anywhere on the wire path.

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use tallybook_accounts::{Account, AccountNode, AccountType, ChartWarning, Side};
use tallybook_core::{Currency, Money};
use tallybook_infra::projections::{AccountBalance, AuditRecord, JournalEntryReadModel};
use tallybook_journal::JournalLine;
use tallybook_reconciliation::ReconciliationRecord;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub normal_balance: Option<String>,
    pub parent_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct JournalLineRequest {
    pub account_id: String,
    pub description: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJournalEntryRequest {
    pub date: Option<String>, // RFC3339; defaults to now
    pub reference: Option<String>,
    pub description: Option<String>,
    pub currency: String,
    pub lines: Vec<JournalLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ReviseLinesRequest {
    pub currency: String,
    pub lines: Vec<JournalLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ReasonRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBankAccountRequest {
    pub name: String,
    pub ledger_account_code: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct StatementLineRequest {
    pub posted_on: String, // YYYY-MM-DD
    pub amount: String,
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterStatementRequest {
    pub statement_date: String, // YYYY-MM-DD
    pub closing_balance: String,
    pub lines: Vec<StatementLineRequest>,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_account_type(s: &str) -> Result<AccountType, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "asset" => Ok(AccountType::Asset),
        "liability" => Ok(AccountType::Liability),
        "equity" => Ok(AccountType::Equity),
        "income" => Ok(AccountType::Income),
        "expense" => Ok(AccountType::Expense),
        _ => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "account_type must be one of: asset, liability, equity, income, expense",
        )),
    }
}

pub fn parse_side(s: &str) -> Result<Side, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "debit" => Ok(Side::Debit),
        "credit" => Ok(Side::Credit),
        _ => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "normal_balance must be debit or credit",
        )),
    }
}

pub fn parse_currency(s: &str) -> Result<Currency, axum::response::Response> {
    Currency::new(s).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
    })
}

pub fn parse_money(amount: &str, currency: Currency) -> Result<Money, axum::response::Response> {
    Money::parse(amount, currency).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
    })
}

pub fn to_journal_lines(
    currency: Currency,
    req_lines: Vec<JournalLineRequest>,
) -> Result<Vec<JournalLine>, axum::response::Response> {
    let mut lines = Vec::with_capacity(req_lines.len());
    for l in req_lines {
        let account_id = match l.account_id.parse() {
            Ok(id) => tallybook_accounts::AccountId::new(id),
            Err(_) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    format!("invalid account_id: {}", l.account_id),
                ))
            }
        };
        let debit = l.debit.as_deref().map(|a| parse_money(a, currency)).transpose()?;
        let credit = l.credit.as_deref().map(|a| parse_money(a, currency)).transpose()?;
        lines.push(JournalLine {
            account_id,
            description: l.description,
            debit,
            credit,
        });
    }
    Ok(lines)
}

// -------------------------
// JSON mapping helpers
// -------------------------

fn decimal_string(minor: i128) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub fn money_to_json(m: &Money) -> serde_json::Value {
    json!({
        "amount": decimal_string(i128::from(m.minor())),
        "currency": m.currency().as_str(),
    })
}

pub fn account_to_json(a: &Account) -> serde_json::Value {
    json!({
        "id": a.id.to_string(),
        "code": a.code,
        "name": a.name,
        "account_type": format!("{:?}", a.account_type).to_lowercase(),
        "normal_balance": a.normal_balance.to_string(),
        "parent_id": a.parent_id.map(|p| p.to_string()),
        "is_active": a.is_active,
    })
}

pub fn account_node_to_json(node: &AccountNode) -> serde_json::Value {
    json!({
        "account": account_to_json(&node.account),
        "children": node.children.iter().map(account_node_to_json).collect::<Vec<_>>(),
    })
}

pub fn warning_to_json(w: &ChartWarning) -> serde_json::Value {
    json!({
        "detail": w.to_string(),
        "warning": w,
    })
}

pub fn line_to_json(l: &JournalLine) -> serde_json::Value {
    json!({
        "account_id": l.account_id.to_string(),
        "description": l.description,
        "debit": l.debit.as_ref().map(money_to_json),
        "credit": l.credit.as_ref().map(money_to_json),
    })
}

pub fn entry_to_json(rm: &JournalEntryReadModel) -> serde_json::Value {
    json!({
        "id": rm.entry_id.to_string(),
        "date": rm.date.to_rfc3339(),
        "reference": rm.reference,
        "description": rm.description,
        "status": rm.status.to_string(),
        "lines": rm.lines.iter().map(line_to_json).collect::<Vec<_>>(),
        "total_debit": decimal_string(i128::from(rm.total_debit_minor)),
        "total_credit": decimal_string(i128::from(rm.total_credit_minor)),
        "currency": rm.currency.map(|c| c.as_str().to_string()),
        "posted_at": rm.posted_at.map(|t| t.to_rfc3339()),
        "updated_at": rm.updated_at.to_rfc3339(),
    })
}

pub fn balance_to_json(account: Option<&Account>, b: &AccountBalance) -> serde_json::Value {
    json!({
        "account_id": b.account_id.to_string(),
        "code": account.map(|a| a.code.clone()),
        "name": account.map(|a| a.name.clone()),
        "balance": decimal_string(b.balance),
    })
}

pub fn audit_record_to_json(r: &AuditRecord) -> serde_json::Value {
    json!({
        "entry_id": r.entry_id.to_string(),
        "action": r.action,
        "reason": r.reason,
        "occurred_at": r.occurred_at.to_rfc3339(),
        "sequence_number": r.sequence_number,
    })
}

pub fn reconciliation_to_json(r: &ReconciliationRecord) -> serde_json::Value {
    json!({
        "bank_account_id": r.bank_account_id.to_string(),
        "statement_date": r.statement_date.to_string(),
        "statement_balance": money_to_json(&r.statement_balance),
        "book_balance": money_to_json(&r.book_balance),
        "difference": money_to_json(&r.difference),
        "status": r.status.to_string(),
        "reconciled_count": r.reconciled_count,
        "unreconciled_count": r.unreconciled_count,
    })
}
