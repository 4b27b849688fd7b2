use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/balances", get(list_balances))
        .route("/balances/:code", get(get_balance))
}

/// Book balances per account, joined with the account directory for display.
pub async fn list_balances(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let mut balances = services.balances_list();
    let directory: Vec<_> = services.accounts().list();

    // Stable output: order by code where known, then by id.
    balances.sort_by_key(|b| {
        (
            directory
                .iter()
                .find(|a| a.id == b.account_id)
                .map(|a| a.code.clone()),
            *b.account_id.0.as_uuid(),
        )
    });

    let items = balances
        .iter()
        .map(|b| {
            let account = directory.iter().find(|a| a.id == b.account_id);
            dto::balance_to_json(account, b)
        })
        .collect::<Vec<_>>();

    errors::json_ok(serde_json::json!({ "items": items }))
}

pub async fn get_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    let Some(account) = services.accounts().find_by_code(&code) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "account not found");
    };

    let balance = tallybook_infra::projections::AccountBalance {
        account_id: account.id,
        balance: services.balance_for_account(&account.id),
    };

    errors::json_ok(dto::balance_to_json(Some(&account), &balance))
}
