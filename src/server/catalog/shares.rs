use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::catalog;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};
use crate::types::ShareValues;

pub async fn list_track_shares(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(track_id): Path<i64>,
) -> impl IntoResponse {
    let shares = catalog::list_shares(&state.store, track_id, &auth.caller())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(shares)))
}

/// PUT /tracks/{id}/shares/{person_id} - overwrites all four percentages
pub async fn put_track_share(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((track_id, person_id)): Path<(i64, i64)>,
    Json(values): Json<ShareValues>,
) -> impl IntoResponse {
    let share = catalog::upsert_share(&state.store, track_id, person_id, values, &auth.caller())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(share)))
}

pub async fn delete_track_share(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((track_id, person_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    catalog::remove_share(&state.store, track_id, person_id, &auth.caller())?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
