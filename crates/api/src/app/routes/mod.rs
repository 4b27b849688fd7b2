use axum::Router;

pub mod accounts;
pub mod banking;
pub mod journal;
pub mod ledger;

/// Router for the whole engine surface.
pub fn router() -> Router {
    Router::new()
        .nest("/accounts", accounts::router())
        .nest("/journal-entries", journal::router())
        .nest("/ledger", ledger::router())
        .nest("/banking", banking::router())
}
