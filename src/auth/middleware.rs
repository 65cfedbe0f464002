use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use super::{BearerToken, TokenIssuer};
use crate::server::AppState;
use crate::store::SqliteStore;
use crate::types::{Caller, Token, User};

/// Extractor that requires an active, authenticated account.
pub struct RequireUser {
    pub token: Token,
    pub user: User,
}

impl RequireUser {
    #[must_use]
    pub fn caller(&self) -> Caller {
        self.user.caller()
    }
}

/// Extractor that requires an active admin account.
pub struct RequireAdmin {
    pub token: Token,
    pub user: User,
}

impl RequireAdmin {
    #[must_use]
    pub fn caller(&self) -> Caller {
        self.user.caller()
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    AccountInactive,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::AccountInactive => (StatusCode::UNAUTHORIZED, "Account is deactivated"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin access required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let code = match status {
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            _ => "server_error",
        };
        let body = json!({ "data": null, "error": message, "code": code });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"rightsdesk\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (token, user) = authenticate(parts, state)?;
        Ok(RequireUser { token, user })
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (token, user) = authenticate(parts, state)?;

        if !user.caller().is_admin() {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin { token, user })
    }
}

fn authenticate(parts: &Parts, state: &Arc<AppState>) -> Result<(Token, User), AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let raw_token = extract_bearer(auth_header)?.ok_or(AuthError::MissingAuth)?;
    validate_token(&state.store, raw_token)
}

/// Returns the bearer token of an Authorization header, if one is present.
fn extract_bearer(auth_header: Option<&str>) -> Result<Option<&str>, AuthError> {
    match auth_header {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(|token| Some(token.trim()))
            .ok_or(AuthError::InvalidScheme),
        None => Ok(None),
    }
}

/// Validates a raw token against the store and loads its active owner.
pub fn validate_token(store: &SqliteStore, raw_token: &str) -> Result<(Token, User), AuthError> {
    let bearer = BearerToken::parse(raw_token).map_err(|_| AuthError::InvalidToken)?;

    let token = store
        .get_token_by_lookup(bearer.lookup())
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::InvalidToken)?;

    let issuer = TokenIssuer::new().map_err(|_| AuthError::InternalError)?;
    if !issuer
        .verify(&bearer, &token)
        .map_err(|_| AuthError::InternalError)?
    {
        return Err(AuthError::InvalidToken);
    }

    if let Some(expires_at) = &token.expires_at {
        if expires_at < &Utc::now() {
            return Err(AuthError::TokenExpired);
        }
    }

    let user = store
        .get_user(token.user_id)
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::InvalidToken)?;

    if !user.is_active {
        return Err(AuthError::AccountInactive);
    }

    if let Err(e) = store.update_token_last_used(&token.id) {
        tracing::warn!("Failed to update token last_used_at: {e}");
    }

    Ok((token, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{bootstrap_admin, issue_token};
    use chrono::Duration;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    #[test]
    fn test_extract_bearer() {
        assert!(matches!(extract_bearer(None), Ok(None)));
        assert!(matches!(extract_bearer(Some("Bearer abc")), Ok(Some("abc"))));
        assert!(matches!(
            extract_bearer(Some("Basic abc")),
            Err(AuthError::InvalidScheme)
        ));
    }

    #[test]
    fn test_validate_token() {
        let (_temp, store) = test_store();
        let admin = bootstrap_admin(&store, "root@label.test", "root-password", None)
            .unwrap()
            .unwrap();
        let (_token, raw) = issue_token(&store, admin.id, None).unwrap();

        let (_token, user) = validate_token(&store, &raw).unwrap();
        assert_eq!(user.id, admin.id);

        let tampered = format!("{}x", &raw[..raw.len() - 1]);
        assert!(matches!(
            validate_token(&store, &tampered),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let (_temp, store) = test_store();
        let admin = bootstrap_admin(&store, "root@label.test", "root-password", None)
            .unwrap()
            .unwrap();
        let (_token, raw) = issue_token(&store, admin.id, Some(Duration::minutes(-1))).unwrap();

        assert!(matches!(
            validate_token(&store, &raw),
            Err(AuthError::TokenExpired)
        ));
    }
}
