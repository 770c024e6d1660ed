//! Profile and account operations for the authenticated user.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::handlers::rfc3339;
use crate::middleware::AuthUser;
use crate::models::{UserDoc, UserPatch};
use crate::state::AppState;

fn profile_json(user: &UserDoc) -> Value {
    json!({
        "id": user.id.map(|id| id.to_hex()),
        "name": user.name,
        "email": user.email,
        "national_id": user.national_id,
        "birth_date": user.birth_date.map(rfc3339),
        "blood_type": user.blood_type,
        "allergies": user.allergies,
        "avatar_url": user.avatar_url,
        "registered_at": rfc3339(user.registered_at),
    })
}

/// GET /profile - The authenticated user's own profile
pub async fn profile_get(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .find_by_oid(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "data": profile_json(&user),
    })))
}

/// PUT /profile - Partial profile update from the known-field patch
pub async fn profile_update(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<Value>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::bad_request("No recognized fields to update"));
    }

    state.users.update(auth.id, patch).await?;
    info!("Profile updated for user {}", auth.id);

    Ok(Json(json!({
        "success": true,
        "data": { "message": "Profile updated" }
    })))
}

/// GET /users/:id - Owner-only account read
pub async fn user_get(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if auth.id.to_hex() != id {
        return Err(ApiError::forbidden("Access denied"));
    }

    let user = state
        .users
        .find_by_oid(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "id": id,
            "name": user.name,
            "email": user.email,
            "registered_at": rfc3339(user.registered_at),
        }
    })))
}

/// DELETE /users/:id - Owner-only account deletion; embedded sub-records go
/// with the document
pub async fn user_delete(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if auth.id.to_hex() != id {
        return Err(ApiError::forbidden("Access denied"));
    }

    let user = state.users.delete(auth.id).await?;
    info!("Account deleted: {}", user.email);

    Ok(Json(json!({
        "success": true,
        "data": { "message": "Account deleted" }
    })))
}
