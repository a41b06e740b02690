use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::storage::Storage;

use super::handlers::{
    delete_url, health_check, link_analytics, shorten, user_links, AppState,
};

pub fn create_api_router(
    storage: Arc<dyn Storage>,
    auth: Arc<AuthService>,
    public_base_url: String,
) -> Router {
    let state = Arc::new(AppState {
        storage,
        auth,
        public_base_url,
    });

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/shorten", post(shorten))
        .route("/api/analytics/{code}", get(link_analytics))
        .route("/api/user/links/{owner_id}", get(user_links))
        .route("/api/urls/{code}", delete(delete_url))
        .with_state(state)
}
