mod drafts;
mod entities;
mod shares;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::catalog::Draftable;
use crate::server::AppState;
use crate::types::{Album, Artist, Person, Track};

/// Routes every catalog entity is served under: CRUD at `/{path}` and the
/// review queue at `/drafts/{path}`.
fn entity_router<T: Draftable>() -> Router<Arc<AppState>> {
    let path = T::PATH;
    Router::new()
        .route(
            &format!("/{path}"),
            get(entities::list_entities::<T>).post(entities::create_entity::<T>),
        )
        .route(
            &format!("/{path}/{{id}}"),
            get(entities::get_entity::<T>)
                .patch(entities::update_entity::<T>)
                .delete(entities::delete_entity::<T>),
        )
        .route(&format!("/drafts/{path}"), get(drafts::list_drafts::<T>))
        .route(
            &format!("/drafts/{path}/{{id}}/approve"),
            post(drafts::approve_draft::<T>),
        )
        .route(
            &format!("/drafts/{path}/{{id}}/reject"),
            post(drafts::reject_draft::<T>),
        )
}

pub fn catalog_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(entity_router::<Person>())
        .merge(entity_router::<Artist>())
        .merge(entity_router::<Album>())
        .merge(entity_router::<Track>())
        // Track royalty shares
        .route("/tracks/{id}/shares", get(shares::list_track_shares))
        .route(
            "/tracks/{id}/shares/{person_id}",
            put(shares::put_track_share).delete(shares::delete_track_share),
        )
}
