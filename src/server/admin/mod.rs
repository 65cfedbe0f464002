mod managers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/managers",
            get(managers::list_managers).post(managers::create_manager),
        )
        .route("/managers/{id}", delete(managers::deactivate_manager))
}
