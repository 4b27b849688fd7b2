use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::get,
    Json, Router,
};

use tallybook_accounts::{build_tree, Account, AccountId};
use tallybook_core::AggregateId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", get(list_accounts).post(create_account))
}

/// Flat list plus the assembled tree and any data-integrity warnings.
pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let accounts = services.accounts().list();

    let chart = match build_tree(accounts.clone()) {
        Ok(chart) => chart,
        Err(e) => return errors::chart_error_to_response(e),
    };

    errors::json_ok(serde_json::json!({
        "accounts": accounts.iter().map(dto::account_to_json).collect::<Vec<_>>(),
        "tree": chart.roots.iter().map(dto::account_node_to_json).collect::<Vec<_>>(),
        "warnings": chart.warnings.iter().map(dto::warning_to_json).collect::<Vec<_>>(),
    }))
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateAccountRequest>,
) -> axum::response::Response {
    let account_type = match dto::parse_account_type(&body.account_type) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    let parent_id = match body.parent_id.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<AggregateId>() {
            Ok(id) => Some(AccountId::new(id)),
            Err(e) => {
                return errors::json_error(
                    axum::http::StatusCode::BAD_REQUEST,
                    "validation_error",
                    e.to_string(),
                )
            }
        },
    };

    let mut account = Account::new(
        AccountId::new(AggregateId::new()),
        body.code,
        body.name,
        account_type,
    );
    if let Some(raw) = body.normal_balance.as_deref() {
        match dto::parse_side(raw) {
            Ok(side) => account = account.with_normal_balance(side),
            Err(resp) => return resp,
        }
    }
    account.parent_id = parent_id;
    account.is_active = body.is_active.unwrap_or(true);

    if let Err(e) = services.accounts().insert(account.clone()) {
        return errors::chart_error_to_response(e);
    }

    errors::json_created(dto::account_to_json(&account))
}
