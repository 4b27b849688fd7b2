//! One JSON envelope for the whole surface.
//!
//! Success: `{"success": true, "data": ...}`. Failure: `{"success": false,
//! "error": <stable code>, "message": <display string>}`. Status mapping:
//! validation 400, invariant 422, conflict 409 (client re-fetches and
//! retries), not-found 404, everything else 500 with a warn log.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use tallybook_accounts::ChartError;
use tallybook_infra::command_dispatcher::DispatchError;

pub fn json_ok(data: serde_json::Value) -> axum::response::Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

pub fn json_created(data: serde_json::Value) -> axum::response::Response {
    (StatusCode::CREATED, Json(json!({ "success": true, "data": data }))).into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::Concurrency(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DispatchError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DispatchError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DispatchError::Deserialize(msg) => {
            tracing::warn!("event deserialization failed: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
        DispatchError::Store(e) => {
            tracing::warn!("event store failure: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
        DispatchError::Publish(msg) => {
            tracing::warn!("event publication failed: {msg}");
            json_error(StatusCode::BAD_GATEWAY, "publish_error", msg)
        }
    }
}

pub fn chart_error_to_response(err: ChartError) -> axum::response::Response {
    match &err {
        ChartError::InvalidAccount { .. } => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
        }
        ChartError::DuplicateCode(_) | ChartError::DuplicateId(_) => {
            json_error(StatusCode::CONFLICT, "conflict", err.to_string())
        }
        ChartError::CyclicHierarchy { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", err.to_string())
        }
    }
}
