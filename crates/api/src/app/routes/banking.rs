use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;

use tallybook_core::AggregateId;
use tallybook_reconciliation::{
    summarize, BankAccount, BankAccountId, BankStatement, MatchPolicy, StatementLine,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/accounts", get(list_bank_accounts).post(create_bank_account))
        .route("/accounts/:id/statements", post(register_statement))
        .route("/accounts/:id/reconciliation", get(get_reconciliation))
}

fn parse_id(raw: &str) -> Result<BankAccountId, axum::response::Response> {
    raw.parse::<AggregateId>().map(BankAccountId::new).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, axum::response::Response> {
    raw.parse::<NaiveDate>().map_err(|e| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("invalid date: {e}"),
        )
    })
}

pub async fn list_bank_accounts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let items = services
        .banks()
        .list_accounts()
        .iter()
        .map(|a| {
            serde_json::json!({
                "id": a.id.to_string(),
                "name": a.name,
                "ledger_account_code": a.ledger_account_code,
                "currency": a.currency.as_str(),
            })
        })
        .collect::<Vec<_>>();

    errors::json_ok(serde_json::json!({ "items": items }))
}

pub async fn create_bank_account(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateBankAccountRequest>,
) -> axum::response::Response {
    let currency = match dto::parse_currency(&body.currency) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let account = BankAccount {
        id: BankAccountId::new(AggregateId::new()),
        name: body.name,
        ledger_account_code: body.ledger_account_code,
        currency,
    };
    services.banks().insert_account(account.clone());

    errors::json_created(serde_json::json!({
        "id": account.id.to_string(),
        "name": account.name,
        "ledger_account_code": account.ledger_account_code,
        "currency": account.currency.as_str(),
    }))
}

pub async fn register_statement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RegisterStatementRequest>,
) -> axum::response::Response {
    let bank_account_id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(bank_account) = services.banks().get_account(&bank_account_id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "bank account not found");
    };

    let statement_date = match parse_date(&body.statement_date) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let closing_balance = match dto::parse_money(&body.closing_balance, bank_account.currency) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let mut lines = Vec::with_capacity(body.lines.len());
    for l in body.lines {
        let posted_on = match parse_date(&l.posted_on) {
            Ok(d) => d,
            Err(resp) => return resp,
        };
        let amount = match dto::parse_money(&l.amount, bank_account.currency) {
            Ok(m) => m,
            Err(resp) => return resp,
        };
        lines.push(StatementLine {
            posted_on,
            amount,
            reference: l.reference,
        });
    }

    services.banks().put_statement(BankStatement {
        bank_account_id,
        statement_date,
        closing_balance,
        lines,
    });

    errors::json_created(serde_json::json!({
        "bank_account_id": bank_account_id.to_string(),
        "statement_date": statement_date.to_string(),
    }))
}

/// Reconciliation summary for a bank account.
///
/// 404 when no statement has been registered yet — "no data" for the
/// client, not a failure banner.
pub async fn get_reconciliation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let bank_account_id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(bank_account) = services.banks().get_account(&bank_account_id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "bank account not found");
    };
    let Some(statement) = services.banks().latest_statement(&bank_account_id) else {
        return errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "no statement registered for this bank account",
        );
    };

    let Some(book_balance) =
        services.book_balance_for_code(&bank_account.ledger_account_code, bank_account.currency)
    else {
        tracing::warn!(
            code = %bank_account.ledger_account_code,
            "book balance exceeds the representable money range"
        );
        return errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal error",
        );
    };

    let book = match services.accounts().find_by_code(&bank_account.ledger_account_code) {
        Some(ledger_account) => {
            services.book_transactions_for_account(&ledger_account.id, bank_account.currency)
        }
        None => Vec::new(),
    };

    match summarize(&book, book_balance, &statement, &MatchPolicy::default()) {
        Ok(record) => errors::json_ok(dto::reconciliation_to_json(&record)),
        Err(e) => errors::json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invariant_violation",
            e.to_string(),
        ),
    }
}
