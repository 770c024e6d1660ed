//! Meditation-history appends.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::HistoryEntry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    pub meditation_id: String,
    pub actual_minutes: Option<i64>,
}

/// POST /meditations/history - Record one completed meditation. The stored
/// reference is weak: the catalog entry may be deleted later without this
/// record being touched.
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Json(payload): Json<HistoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let meditation_id = ObjectId::parse_str(&payload.meditation_id)
        .map_err(|_| ApiError::bad_request("Invalid meditation id"))?;

    let entry = HistoryEntry::new(meditation_id, payload.actual_minutes);
    state.users.add_history_entry(auth.id, entry).await?;

    info!("Meditation history entry recorded for user {}", auth.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": { "message": "Meditation recorded" }
        })),
    ))
}
