use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::analytics::{summarize, AnalyticsSummary};
use crate::auth::{bearer_token, AuthError, AuthService};
use crate::codegen;
use crate::models::{ShortLink, ShortenRequest, ShortenResponse};
use crate::storage::{Storage, StorageError};

use super::error::ApiError;

const ACCEPTED_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub auth: Arc<AuthService>,
    pub public_base_url: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

fn validate_url(raw: &str) -> Result<(), ApiError> {
    if raw.is_empty() {
        return Err(ApiError::InvalidInput("Original URL is required".to_string()));
    }
    if raw.chars().any(|c| c.is_whitespace()) {
        return Err(ApiError::InvalidInput("Invalid URL format".to_string()));
    }
    match Url::parse(raw) {
        Ok(url) if ACCEPTED_SCHEMES.contains(&url.scheme()) => Ok(()),
        _ => Err(ApiError::InvalidInput("Invalid URL format".to_string())),
    }
}

/// Create a new shortened URL
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, ApiError> {
    validate_url(&payload.original_url)?;

    let link = loop {
        let code = codegen::ensure_unique(state.storage.as_ref()).await?;
        match state
            .storage
            .create_link(&code, &payload.original_url, payload.created_by.as_deref())
            .await
        {
            Ok(link) => break link,
            // Lost the race for this code to a concurrent creation; the
            // UNIQUE constraint caught it, so roll a fresh one.
            Err(StorageError::Conflict) => continue,
            Err(StorageError::Other(err)) => return Err(err.into()),
        }
    };

    let short_url = format!(
        "{}/{}",
        state.public_base_url.trim_end_matches('/'),
        link.short_code
    );
    Ok(Json(ShortenResponse { short_url }))
}

/// Analytics for a shortened URL: the thin projection (original URL,
/// clicks, created-at) plus the full aggregation derived from the raw
/// visit log.
pub async fn link_analytics(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let link = state
        .storage
        .get_link(&code)
        .await?
        .ok_or(ApiError::NotFound)?;
    let visits = state.storage.visits(&code).await?;

    Ok(Json(summarize(&link, &visits, Utc::now())))
}

/// List all links created by a given owner
pub async fn user_links(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
) -> Result<Json<Vec<ShortLink>>, ApiError> {
    let links = state.storage.list_by_owner(&owner_id).await?;
    Ok(Json(links))
}

/// Delete a link and cascade-delete its visit events. Requires a bearer
/// credential resolving to the link's owner.
pub async fn delete_url(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let token = bearer_token(&headers).ok_or(AuthError::MissingCredential)?;
    let subject = state.auth.verify(token)?;

    let link = state
        .storage
        .get_link(&code)
        .await?
        .ok_or(ApiError::NotFound)?;

    if link.created_by.as_deref() != Some(subject.as_str()) {
        return Err(ApiError::Forbidden);
    }

    state.storage.delete_link(&code).await?;

    // Cascade cleanup is best-effort: the link is already gone, and a
    // failure here leaves orphaned events rather than a broken link.
    if let Err(err) = state.storage.delete_visits(&code).await {
        warn!(short_code = %code, error = %err, "failed to delete visit events");
    }

    Ok(Json(SuccessResponse {
        message: "URL deleted successfully".to_string(),
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_https_and_ftp() {
        assert!(validate_url("https://example.com/page").is_ok());
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("ftp://files.example.com/a.txt").is_ok());
    }

    #[test]
    fn rejects_missing_scheme_and_whitespace() {
        assert!(validate_url("example.com/page").is_err());
        assert!(validate_url("https://example.com/a b").is_err());
        assert!(validate_url("").is_err());
        assert!(validate_url("javascript:alert(1)").is_err());
    }
}
