// SQLite SourceRepository Implementation
// Read side serves the orchestration core; the admin side is the
// configuration-storage edge used by the API surface.

use crate::job_queue::map_sqlx_error;
use async_trait::async_trait;
use dirsync_core::domain::{Source, SourceId};
use dirsync_core::error::{AppError, Result};
use dirsync_core::port::{SourceAdmin, SourceRepository};
use sqlx::SqlitePool;

pub struct SqliteSourceRepository {
    pool: SqlitePool,
}

impl SqliteSourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRepository for SqliteSourceRepository {
    async fn find_by_id(&self, id: &SourceId) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>("SELECT * FROM sources WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_source()))
    }

    async fn find_enabled(&self) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> =
            sqlx::query_as("SELECT * FROM sources WHERE enabled = 1 ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_source()).collect())
    }
}

#[async_trait]
impl SourceAdmin for SqliteSourceRepository {
    async fn list_all(&self) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> = sqlx::query_as("SELECT * FROM sources ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|r| r.into_source()).collect())
    }

    async fn insert(&self, source: &Source) -> Result<()> {
        let settings = serde_json::to_string(&source.settings)?;

        sqlx::query("INSERT INTO sources (id, name, enabled, settings) VALUES (?, ?, ?, ?)")
            .bind(&source.id)
            .bind(&source.name)
            .bind(if source.enabled { 1 } else { 0 })
            .bind(settings)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn set_enabled(&self, id: &SourceId, enabled: bool) -> Result<()> {
        let result = sqlx::query("UPDATE sources SET enabled = ? WHERE id = ?")
            .bind(if enabled { 1 } else { 0 })
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Source {} not found", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &SourceId) -> Result<()> {
        let result = sqlx::query("DELETE FROM sources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Source {} not found", id)));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SourceRow {
    id: String,
    name: String,
    enabled: i32, // SQLite boolean as integer
    settings: String,
}

impl SourceRow {
    fn into_source(self) -> Source {
        let settings: serde_json::Value =
            serde_json::from_str(&self.settings).unwrap_or(serde_json::Value::Null);

        Source {
            id: self.id,
            name: self.name,
            enabled: self.enabled != 0,
            settings,
        }
    }
}
