use axum::{routing::get, Router};
use std::sync::Arc;

use crate::analytics::{Enricher, GeoIpService};
use crate::storage::Storage;

use super::handlers::{health_check, redirect_url, RedirectState};

pub fn create_redirect_router(
    storage: Arc<dyn Storage>,
    geoip: Option<Arc<GeoIpService>>,
    trust_forwarded: bool,
) -> Router {
    let state = Arc::new(RedirectState {
        storage,
        enricher: Enricher::new(geoip),
        trust_forwarded,
    });

    Router::new()
        .route("/", get(health_check))
        .route("/{code}", get(redirect_url))
        .with_state(state)
}
