use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Error as SqlxError, PgPool};

use crate::database::InstanceRepository;
use crate::database::models::instance::{HeartbeatOutcome, InstanceEntity};

/// 基于 PostgreSQL 的实例存储
pub struct InstanceOperation {
    db: Arc<PgPool>,
}

impl InstanceOperation {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InstanceRepository for InstanceOperation {
    async fn record_heartbeat(
        &self,
        uuid: &str,
        version: &str,
        last_seen: i64,
    ) -> Result<HeartbeatOutcome, SqlxError> {
        // xmax = 0 表示本次是插入而不是冲突后的更新
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO instances (uuid, version, last_seen)
            VALUES ($1, $2, $3)
            ON CONFLICT (uuid) DO UPDATE
                SET version = EXCLUDED.version,
                    last_seen = EXCLUDED.last_seen
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(uuid)
        .bind(version)
        .bind(last_seen)
        .fetch_one(&*self.db)
        .await?;

        Ok(if inserted {
            HeartbeatOutcome::Created
        } else {
            HeartbeatOutcome::Updated
        })
    }

    async fn list_all(&self) -> Result<Vec<InstanceEntity>, SqlxError> {
        sqlx::query_as::<_, InstanceEntity>(
            r#"
            SELECT uuid, version, last_seen
            FROM instances
            ORDER BY last_seen DESC
            "#,
        )
        .fetch_all(&*self.db)
        .await
    }

    async fn delete_older_than(&self, cutoff: i64) -> Result<u64, SqlxError> {
        let result = sqlx::query("DELETE FROM instances WHERE last_seen < $1")
            .bind(cutoff)
            .execute(&*self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
