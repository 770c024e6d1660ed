use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - Service information
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Sereno API",
            "version": version,
            "description": "Mental-wellness tracking backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login, /auth/refresh (public)",
                "profile": "/profile (protected)",
                "users": "/users/:id (protected, owner only)",
                "meditations": "/meditations[/:id] (public catalog)",
                "mood": "/mood, /mood/weekly-report (protected)",
                "history": "/meditations/history (protected)",
                "assessments": "/assessments, /assessments/history (protected)",
                "stats": "/stats (public)",
            }
        }
    }))
}

/// GET /health - Liveness probe backed by a store ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.gateway.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "connected"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "disconnected"
                    }
                })),
            )
        }
    }
}

/// GET /stats - Aggregate usage statistics
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let total_users = state.users.count().await?;
    let total_meditations = state.meditations.count().await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "total_users": total_users,
            "total_meditations": total_meditations,
        }
    })))
}
