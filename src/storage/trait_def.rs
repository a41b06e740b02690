use crate::models::{NewVisit, ShortLink, Visit};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence boundary for links and their visit log.
///
/// The `UNIQUE` constraint on the short code is the authoritative
/// uniqueness guard; the generator's existence-check loop is only a
/// pre-filter. Click counting must be an atomic store-side increment so
/// concurrent redirects never lose updates.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (run migrations, etc.)
    async fn init(&self) -> Result<()>;

    /// Create a new link with the given short code. Returns
    /// `StorageError::Conflict` if the code is already taken.
    async fn create_link(
        &self,
        short_code: &str,
        original_url: &str,
        created_by: Option<&str>,
    ) -> StorageResult<ShortLink>;

    /// Get a link by short code
    async fn get_link(&self, short_code: &str) -> Result<Option<ShortLink>>;

    /// Check whether a short code is already taken
    async fn code_exists(&self, short_code: &str) -> Result<bool>;

    /// Atomically increment the click counter by one
    async fn increment_clicks(&self, short_code: &str) -> Result<()>;

    /// List all links created by the given owner, newest first
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<ShortLink>>;

    /// Delete a link. Returns false if the code was unknown.
    async fn delete_link(&self, short_code: &str) -> Result<bool>;

    /// Append one visit event
    async fn record_visit(&self, visit: &NewVisit) -> Result<()>;

    /// Snapshot of all visit events for a short code, oldest first
    async fn visits(&self, short_code: &str) -> Result<Vec<Visit>>;

    /// Bulk-delete all visit events for a short code, returning the
    /// number of rows removed
    async fn delete_visits(&self, short_code: &str) -> Result<u64>;
}
