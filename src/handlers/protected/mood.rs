//! Mood logging and the weekly summary.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::handlers::rfc3339;
use crate::middleware::AuthUser;
use crate::models::MoodEntry;
use crate::reports::weekly_mood_summary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub level: i32,
    pub feeling: Option<String>,
    pub notes: Option<String>,
}

/// POST /mood - Append one mood entry to the caller's log
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Json(payload): Json<MoodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let feeling = payload
        .feeling
        .unwrap_or_else(|| "unspecified".to_string());

    // Out-of-range levels are rejected here, before anything is persisted
    let entry = MoodEntry::new(payload.level, feeling, payload.notes)
        .map_err(|e| ApiError::validation_error(e.to_string(), None))?;

    state.users.add_mood_entry(auth.id, entry).await?;
    info!("Mood entry recorded for user {}", auth.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": { "message": "Mood entry recorded" }
        })),
    ))
}

/// GET /mood/weekly-report - Summary of the caller's last 7 days
pub async fn weekly_report(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .find_by_oid(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let report = weekly_mood_summary(&user.mood_entries, chrono::Utc::now());

    let recent: Vec<Value> = report
        .recent
        .iter()
        .map(|e| {
            json!({
                "level": e.level,
                "feeling": e.feeling,
                "notes": e.notes,
                "recorded_at": rfc3339(e.recorded_at),
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "period": "7 days",
            "total_entries": report.total_entries,
            "average_level": report.average_level,
            "feeling_counts": report.feeling_counts,
            "entries": recent,
        }
    })))
}
