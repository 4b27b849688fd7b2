use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};

use tallybook_core::AggregateId;
use tallybook_journal::{
    ApproveEntry, DiscardEntry, DraftEntry, EntryId, JournalCommand, PostEntry, RejectEntry,
    ReviseLines, UnpostEntry,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_entries).post(create_entry))
        .route("/:id", get(get_entry).delete(discard_entry))
        .route("/:id/lines", put(revise_lines))
        .route("/:id/approve", post(approve_entry))
        .route("/:id/post", post(post_entry))
        .route("/:id/unpost", post(unpost_entry))
        .route("/:id/reject", post(reject_entry))
        .route("/:id/audit", get(entry_audit))
}

fn parse_id(raw: &str) -> Result<AggregateId, axum::response::Response> {
    raw.parse::<AggregateId>().map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
    })
}

pub async fn list_entries(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListEntriesQuery>,
) -> axum::response::Response {
    let items = services
        .entries_search(query.search.as_deref(), query.limit)
        .iter()
        .map(dto::entry_to_json)
        .collect::<Vec<_>>();

    errors::json_ok(serde_json::json!({ "items": items }))
}

pub async fn get_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let agg = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.entry_get(&EntryId::new(agg)) {
        Some(rm) => errors::json_ok(dto::entry_to_json(&rm)),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "journal entry not found"),
    }
}

pub async fn create_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateJournalEntryRequest>,
) -> axum::response::Response {
    let currency = match dto::parse_currency(&body.currency) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let lines = match dto::to_journal_lines(currency, body.lines) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let date = match body.date.as_deref() {
        None => Utc::now(),
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(d) => d.with_timezone(&Utc),
            Err(e) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    format!("invalid date: {e}"),
                )
            }
        },
    };

    let agg = AggregateId::new();
    let cmd = JournalCommand::DraftEntry(DraftEntry {
        entry_id: EntryId::new(agg),
        date,
        reference: body.reference,
        description: body.description,
        lines,
        occurred_at: Utc::now(),
    });

    let committed = match services.dispatch_journal(agg, cmd) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "data": {
                "id": agg.to_string(),
                "events_committed": committed.len(),
            },
        })),
    )
        .into_response()
}

/// Replace a draft's lines. Anything past draft refuses with an
/// immutability error.
pub async fn revise_lines(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReviseLinesRequest>,
) -> axum::response::Response {
    let currency = match dto::parse_currency(&body.currency) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let lines = match dto::to_journal_lines(currency, body.lines) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    transition(services, &id, |entry_id| {
        JournalCommand::ReviseLines(ReviseLines {
            entry_id,
            lines,
            occurred_at: Utc::now(),
        })
    })
}

pub async fn approve_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition(services, &id, |entry_id| {
        JournalCommand::ApproveEntry(ApproveEntry {
            entry_id,
            occurred_at: Utc::now(),
        })
    })
}

pub async fn post_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition(services, &id, |entry_id| {
        JournalCommand::PostEntry(PostEntry {
            entry_id,
            occurred_at: Utc::now(),
        })
    })
}

pub async fn unpost_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReasonRequest>,
) -> axum::response::Response {
    transition(services, &id, |entry_id| {
        JournalCommand::UnpostEntry(UnpostEntry {
            entry_id,
            reason: body.reason.clone(),
            occurred_at: Utc::now(),
        })
    })
}

pub async fn reject_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReasonRequest>,
) -> axum::response::Response {
    transition(services, &id, |entry_id| {
        JournalCommand::RejectEntry(RejectEntry {
            entry_id,
            reason: body.reason.clone(),
            occurred_at: Utc::now(),
        })
    })
}

pub async fn discard_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition(services, &id, |entry_id| {
        JournalCommand::DiscardEntry(DiscardEntry {
            entry_id,
            occurred_at: Utc::now(),
        })
    })
}

pub async fn entry_audit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let agg = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let trail = services.audit_for_entry(&EntryId::new(agg));
    if trail.is_empty() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "journal entry not found");
    }

    errors::json_ok(serde_json::json!({
        "items": trail.iter().map(dto::audit_record_to_json).collect::<Vec<_>>(),
    }))
}

fn transition(
    services: Arc<AppServices>,
    raw_id: &str,
    make_command: impl FnOnce(EntryId) -> JournalCommand,
) -> axum::response::Response {
    let agg = match parse_id(raw_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = make_command(EntryId::new(agg));
    match services.dispatch_journal(agg, cmd) {
        Ok(committed) => errors::json_ok(serde_json::json!({
            "id": agg.to_string(),
            "events_committed": committed.len(),
            "stream_version": committed.last().map(|e| e.sequence_number).unwrap_or(0),
        })),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
