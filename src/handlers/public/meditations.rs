//! Public meditation catalog reads.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::config;
use crate::error::ApiError;
use crate::models::MeditationDoc;
use crate::state::AppState;

fn meditation_json(m: &MeditationDoc) -> Value {
    json!({
        "id": m.id.map(|id| id.to_hex()),
        "title": m.title,
        "description": m.description,
        "duration_minutes": m.duration_minutes,
        "audio_url": m.audio_url,
        "kind": m.kind,
        "category": m.category.as_str(),
        "cover_url": m.cover_url,
    })
}

/// GET /meditations - Full catalog, title order
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let limit = config::config().reports.list_limit;
    let meditations = state.meditations.list(limit).await?;

    let items: Vec<Value> = meditations.iter().map(meditation_json).collect();

    Ok(Json(json!({
        "success": true,
        "data": items,
    })))
}

/// GET /meditations/:id - Catalog detail
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let meditation = state
        .meditations
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Meditation not found"))?;

    Ok(Json(json!({
        "success": true,
        "data": meditation_json(&meditation),
    })))
}
