// SQLite IdentityStore Implementation
// Target tables for the synchronizers' local writes.

use crate::job_queue::map_sqlx_error;
use async_trait::async_trait;
use dirsync_core::domain::SourceId;
use dirsync_core::error::Result;
use dirsync_core::port::{DirectoryGroup, DirectoryUser, IdentityStore};
use sqlx::SqlitePool;

pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn upsert_user(&self, source_id: &SourceId, user: &DirectoryUser) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO directory_users (source_id, dn, username, display_name, email)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (source_id, dn) DO UPDATE SET
                username = excluded.username,
                display_name = excluded.display_name,
                email = excluded.email
            "#,
        )
        .bind(source_id)
        .bind(&user.dn)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.email)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn upsert_group(&self, source_id: &SourceId, group: &DirectoryGroup) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO directory_groups (source_id, dn, name)
            VALUES (?, ?, ?)
            ON CONFLICT (source_id, dn) DO UPDATE SET
                name = excluded.name
            "#,
        )
        .bind(source_id)
        .bind(&group.dn)
        .bind(&group.name)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn link_membership(
        &self,
        source_id: &SourceId,
        group_dn: &str,
        member_dn: &str,
    ) -> Result<bool> {
        // Both ends must already be reconciled; unresolved pairs are the
        // caller's signal to skip, not an error.
        let group_known: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM directory_groups WHERE source_id = ? AND dn = ?",
        )
        .bind(source_id)
        .bind(group_dn)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let member_known: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM directory_users WHERE source_id = ? AND dn = ?",
        )
        .bind(source_id)
        .bind(member_dn)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if group_known == 0 || member_known == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO directory_memberships (source_id, group_dn, member_dn)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(source_id)
        .bind(group_dn)
        .bind(member_dn)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(true)
    }

    async fn count_users(&self, source_id: &SourceId) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM directory_users WHERE source_id = ?")
                .bind(source_id)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        Ok(count)
    }

    async fn count_groups(&self, source_id: &SourceId) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM directory_groups WHERE source_id = ?")
                .bind(source_id)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        Ok(count)
    }
}
