use crate::models::{NewVisit, ShortLink, Visit};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

fn unix_now() -> Result<i64, StorageError> {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| StorageError::Other(e.into()))?
        .as_secs() as i64;
    Ok(secs)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                short_code TEXT NOT NULL UNIQUE,
                original_url TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                created_by TEXT,
                clicks INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_created_by ON links(created_by)")
            .execute(self.pool.as_ref())
            .await?;

        // Visit log is not referentially enforced against links; it is
        // cascade-cleaned on link deletion instead.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                short_code TEXT NOT NULL,
                ip TEXT NOT NULL,
                country TEXT NOT NULL,
                device TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_short_code ON visits(short_code)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn create_link(
        &self,
        short_code: &str,
        original_url: &str,
        created_by: Option<&str>,
    ) -> StorageResult<ShortLink> {
        let created_at = unix_now()?;

        let result = sqlx::query(
            r#"
            INSERT INTO links (short_code, original_url, created_at, created_by)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(short_code) DO NOTHING
            "#,
        )
        .bind(short_code)
        .bind(original_url)
        .bind(created_at)
        .bind(created_by)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, short_code, original_url, created_at, created_by, clicks
            FROM links
            WHERE short_code = ?
            "#,
        )
        .bind(short_code)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(link)
    }

    async fn get_link(&self, short_code: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, short_code, original_url, created_at, created_by, clicks
            FROM links
            WHERE short_code = ?
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn code_exists(&self, short_code: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM links WHERE short_code = ?",
        )
        .bind(short_code)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count > 0)
    }

    async fn increment_clicks(&self, short_code: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE links
            SET clicks = clicks + 1
            WHERE short_code = ?
            "#,
        )
        .bind(short_code)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<ShortLink>> {
        let links = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, short_code, original_url, created_at, created_by, clicks
            FROM links
            WHERE created_by = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn delete_link(&self, short_code: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE short_code = ?")
            .bind(short_code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_visit(&self, visit: &NewVisit) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO visits (short_code, ip, country, device, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&visit.short_code)
        .bind(&visit.ip)
        .bind(&visit.country)
        .bind(&visit.device)
        .bind(visit.created_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn visits(&self, short_code: &str) -> Result<Vec<Visit>> {
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT id, short_code, ip, country, device, created_at
            FROM visits
            WHERE short_code = ?
            ORDER BY id ASC
            "#,
        )
        .bind(short_code)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(visits)
    }

    async fn delete_visits(&self, short_code: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM visits WHERE short_code = ?")
            .bind(short_code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}
