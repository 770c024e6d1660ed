//! Self-assessment results: append and history listing.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::handlers::rfc3339;
use crate::middleware::AuthUser;
use crate::models::{AssessmentKind, AssessmentResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssessmentRequest {
    pub kind: String,
    pub score: i32,
    pub answers: Option<Value>,
    pub label: Option<String>,
}

/// POST /assessments - Append an assessment result. The kind is normalized
/// before storage; unrecognized input becomes a lower-cased passthrough
/// category.
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Json(payload): Json<AssessmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.kind.trim().is_empty() {
        return Err(ApiError::bad_request("Assessment kind is required"));
    }

    let kind = AssessmentKind::classify(&payload.kind);
    info!("Assessment kind '{}' normalized to '{}'", payload.kind, kind.as_str());

    let answers = match payload.answers {
        Some(value) => bson::to_document(&value)
            .map_err(|_| ApiError::bad_request("Answers must be an object"))?,
        None => bson::Document::new(),
    };

    let result = AssessmentResult::new(kind, answers, payload.score, payload.label);
    state.users.add_assessment_result(auth.id, result).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": { "message": "Assessment saved" }
        })),
    ))
}

/// GET /assessments/history - The caller's results, newest first
pub async fn history(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .find_by_oid(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    // Entries are appended chronologically, so newest-first is a reverse walk
    let results: Vec<Value> = user
        .assessment_results
        .iter()
        .rev()
        .map(|r| {
            json!({
                "kind": r.kind.as_str(),
                "answers": serde_json::to_value(&r.answers).unwrap_or(Value::Null),
                "score": r.score,
                "label": r.label,
                "taken_at": rfc3339(r.taken_at),
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "total": results.len(),
            "assessments": results,
        }
    })))
}
