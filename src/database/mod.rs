// 数据库模块
// 包含实例实体定义、存储接口以及 PostgreSQL 实现

pub mod cleanup;
pub mod models; // 数据库实体定义
pub mod operations; // 数据库操作实现

use async_trait::async_trait;
use sqlx::{Error as SqlxError, PgPool};

// 重新导出常用类型和函数，方便其他模块使用
pub use cleanup::spawn_instance_cleanup;
pub use models::instance::{HeartbeatOutcome, InstanceEntity};
pub use operations::instance::InstanceOperation;

/// 实例存储接口，HTTP 层只依赖此 trait
#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// 记录一次心跳：不存在则创建，存在则更新版本与最后在线时间
    async fn record_heartbeat(
        &self,
        uuid: &str,
        version: &str,
        last_seen: i64,
    ) -> Result<HeartbeatOutcome, SqlxError>;

    /// 按最后在线时间倒序列出所有实例
    async fn list_all(&self) -> Result<Vec<InstanceEntity>, SqlxError>;

    /// 删除 last_seen 早于 `cutoff`（毫秒）的实例，返回删除行数
    async fn delete_older_than(&self, cutoff: i64) -> Result<u64, SqlxError>;
}

/// 创建 instances 表（已存在则跳过）
pub async fn ensure_schema(pool: &PgPool) -> Result<(), SqlxError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS instances (
            id BIGSERIAL PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            version TEXT NOT NULL,
            last_seen BIGINT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
