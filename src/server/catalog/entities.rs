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

/// POST /{entity} - 201 when stored approved, 202 when queued as a draft
pub async fn create_entity<T: Draftable>(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(new): Json<T::New>,
) -> impl IntoResponse {
    let entity = catalog::create::<T>(&state.store, new, &auth.caller())?;

    let status = if entity.approval().is_approved {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };

    Ok::<_, ApiError>((status, Json(ApiResponse::success(entity))))
}

/// GET /{entity} - approved records only
pub async fn list_entities<T: Draftable>(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let entities = catalog::list_approved::<T>(&state.store)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(entities)))
}

pub async fn get_entity<T: Draftable>(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let entity = catalog::get::<T>(&state.store, id, &auth.caller())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(entity)))
}

pub async fn update_entity<T: Draftable>(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<T::Patch>,
) -> impl IntoResponse {
    let entity = catalog::update::<T>(&state.store, id, patch, &auth.caller())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(entity)))
}

pub async fn delete_entity<T: Draftable>(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    catalog::delete::<T>(&state.store, id, &auth.caller())?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
