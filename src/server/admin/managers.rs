use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::identity;
use crate::server::AppState;
use crate::server::dto::CreateManagerRequest;
use crate::server::response::{ApiError, ApiResponse};

pub async fn create_manager(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateManagerRequest>,
) -> impl IntoResponse {
    let manager = identity::create_manager(
        &state.store,
        &admin.caller(),
        req.email.trim(),
        &req.password,
        req.nickname.as_deref(),
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(manager))))
}

pub async fn list_managers(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let managers = identity::list_managers(&state.store)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(managers)))
}

/// DELETE /admin/managers/{id} - deactivates; accounts are never removed
pub async fn deactivate_manager(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let manager = identity::deactivate_manager(&state.store, &admin.caller(), id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(manager)))
}
