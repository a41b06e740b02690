use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::analytics::{extract_client_ip, Enricher};
use crate::models::NewVisit;
use crate::storage::Storage;

/// Attempts for the best-effort visit append before the event is dropped.
const APPEND_ATTEMPTS: u32 = 3;
const APPEND_RETRY_DELAY: Duration = Duration::from_millis(50);

pub struct RedirectState {
    pub storage: Arc<dyn Storage>,
    pub enricher: Enricher,
    pub trust_forwarded: bool,
}

/// Redirect to the original URL, recording telemetry on the side.
///
/// The destination lookup is the only hard dependency: a missing code is
/// a plain 404 with no side effects, and every telemetry step (click
/// increment, enrichment, event append) is best-effort and must never
/// block or fail the redirect response.
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let link = match state.storage.get_link(&code).await {
        Ok(Some(link)) => link,
        Ok(None) => return (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(err) => {
            warn!(short_code = %code, error = %err, "link lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
        }
    };

    // Enrichment happens inline (it is cheap and infallible); both store
    // writes are detached from the response path.
    let ip = extract_client_ip(&headers, addr.ip(), state.trust_forwarded);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    let enriched = state.enricher.enrich(ip, user_agent.as_deref());

    let visit = NewVisit {
        short_code: code.clone(),
        ip: ip.to_string(),
        country: enriched.country,
        device: enriched.device.as_str().to_string(),
        created_at: Utc::now().timestamp(),
    };

    let storage = Arc::clone(&state.storage);
    let increment_code = code.clone();
    tokio::spawn(async move {
        if let Err(err) = storage.increment_clicks(&increment_code).await {
            warn!(short_code = %increment_code, error = %err, "failed to increment clicks");
        }
    });

    let storage = Arc::clone(&state.storage);
    tokio::spawn(async move {
        append_visit(storage.as_ref(), &visit).await;
    });

    // 302 Found, per the original service contract.
    (
        StatusCode::FOUND,
        [(header::LOCATION, link.original_url)],
    )
        .into_response()
}

/// Append a visit event with bounded retry. Gives up after
/// `APPEND_ATTEMPTS`; the click counter and the event log are allowed to
/// diverge under store failures.
async fn append_visit(storage: &dyn Storage, visit: &NewVisit) {
    for attempt in 1..=APPEND_ATTEMPTS {
        match storage.record_visit(visit).await {
            Ok(()) => return,
            Err(err) if attempt < APPEND_ATTEMPTS => {
                warn!(
                    short_code = %visit.short_code,
                    error = %err,
                    attempt,
                    "visit append failed, retrying"
                );
                tokio::time::sleep(APPEND_RETRY_DELAY).await;
            }
            Err(err) => {
                warn!(
                    short_code = %visit.short_code,
                    error = %err,
                    "visit append failed, dropping event"
                );
            }
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
