use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted short link. The short code is immutable once assigned and
/// unique across all live links; `clicks` only ever grows and is mutated
/// exclusively through the store's atomic increment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShortLink {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub created_at: i64,
    pub created_by: Option<String>,
    pub clicks: i64,
}

/// One redirect occurrence with enriched metadata. Never mutated after
/// insertion; removed only as a cascade of link deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Visit {
    pub id: i64,
    pub short_code: String,
    pub ip: String,
    pub country: String,
    pub device: String,
    pub created_at: i64,
}

/// Fields of a visit prior to insertion (the store assigns the row id).
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub short_code: String,
    pub ip: String,
    pub country: String,
    pub device: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    // Defaulted so a missing field surfaces as InvalidInput (400)
    // instead of a body-extraction rejection.
    #[serde(default)]
    pub original_url: String,
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_url: String,
}
