use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::auth::RequireUser;
use crate::identity;
use crate::server::AppState;
use crate::server::dto::{LoginRequest, MeResponse};
use crate::server::response::{ApiError, ApiResponse};

pub fn session_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let session = identity::login(&state.store, req.email.trim(), &req.password, state.token_ttl)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(session)))
}

async fn me(auth: RequireUser) -> impl IntoResponse {
    Json(ApiResponse::success(MeResponse {
        token_expires_at: auth.token.expires_at,
        user: auth.user,
    }))
}

/// POST /auth/logout - revokes the token used for this request
async fn logout(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.store.delete_token(&auth.token.id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
