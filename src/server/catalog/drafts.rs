use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::catalog::{self, Draftable};
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};

/// GET /drafts/{entity} - admin only
pub async fn list_drafts<T: Draftable>(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let drafts = catalog::list_drafts::<T>(&state.store, &auth.caller())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(drafts)))
}

pub async fn approve_draft<T: Draftable>(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let entity = catalog::approve::<T>(&state.store, id, &auth.caller())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(entity)))
}

/// POST /drafts/{entity}/{id}/reject - deletes the draft and its links
pub async fn reject_draft<T: Draftable>(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    catalog::reject::<T>(&state.store, id, &auth.caller())?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
