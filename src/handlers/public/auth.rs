//! Registration, login and token refresh.

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{self, password};
use crate::error::ApiError;
use crate::models::UserDoc;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub national_id: Option<String>,
    pub birth_date: Option<chrono::DateTime<chrono::Utc>>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /auth/register - Create an account and hand back both tokens
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut field_errors = HashMap::new();
    if payload.name.trim().is_empty() {
        field_errors.insert("name".to_string(), "This field is required".to_string());
    }
    if payload.email.trim().is_empty() {
        field_errors.insert("email".to_string(), "This field is required".to_string());
    }
    if payload.password.is_empty() {
        field_errors.insert("password".to_string(), "This field is required".to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error(
            "Name, email and password are required",
            Some(field_errors),
        ));
    }

    let password_hash = password::hash_password(&payload.password)?;

    let mut user = UserDoc::new(payload.name.trim(), payload.email.trim(), password_hash);
    user.national_id = payload.national_id;
    user.birth_date = payload.birth_date.map(bson::DateTime::from_chrono);
    user.blood_type = payload.blood_type;
    user.allergies = payload.allergies;
    user.avatar_url = payload.avatar_url;

    let name = user.name.clone();
    let email = user.email.clone();

    let id = state.users.insert(user).await?;
    let id_hex = id.to_hex();

    let access_token = auth::issue_access_token(&id_hex)?;
    let refresh_token = auth::issue_refresh_token(&id_hex)?;

    info!("New user registered: {}", email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "access_token": access_token,
                "refresh_token": refresh_token,
                "user": {
                    "id": id_hex,
                    "name": name,
                    "email": email,
                }
            }
        })),
    ))
}

/// POST /auth/login - Verify credentials and issue tokens
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let user = match state.users.find_by_email(payload.email.trim()).await? {
        Some(user) => user,
        None => {
            warn!("Login attempt for unknown email: {}", payload.email);
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    if !password::verify_password(&payload.password, &user.password_hash)? {
        warn!("Login attempt with wrong password: {}", user.email);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let id_hex = user
        .id
        .map(|id| id.to_hex())
        .ok_or_else(|| ApiError::internal_server_error("Stored user is missing its id"))?;

    let access_token = auth::issue_access_token(&id_hex)?;
    let refresh_token = auth::issue_refresh_token(&id_hex)?;

    info!("Login succeeded: {}", user.email);

    Ok(Json(json!({
        "success": true,
        "data": {
            "access_token": access_token,
            "refresh_token": refresh_token,
            "user": {
                "id": id_hex,
                "name": user.name,
                "email": user.email,
            }
        }
    })))
}

/// POST /auth/refresh - Trade a refresh token for a fresh access token
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> Result<impl IntoResponse, ApiError> {
    let claims = auth::decode_refresh_token(&payload.refresh_token)?;
    let access_token = auth::issue_access_token(&claims.sub)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "access_token": access_token,
        }
    })))
}
