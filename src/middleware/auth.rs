use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use bson::oid::ObjectId;

use crate::auth;
use crate::error::ApiError;

/// Authenticated caller context extracted from a validated access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: ObjectId,
}

/// Bearer-token middleware: validates the access token and injects
/// [`AuthUser`] into request extensions for the protected handlers
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;

    let claims = auth::decode_access_token(&token).map_err(ApiError::from)?;

    let id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthorized("Invalid token subject"))?;

    request.extensions_mut().insert(AuthUser { id });

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| ApiError::unauthorized("Authentication token not provided"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err(ApiError::unauthorized("Empty bearer token"));
        }
        Ok(token.to_string())
    } else {
        Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_unauthorized() {
        let headers = HeaderMap::new();
        let err = extract_bearer_token(&headers).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer tok-123"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "tok-123");
    }
}
