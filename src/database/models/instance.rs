use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 上报心跳的客户端实例
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InstanceEntity {
    pub uuid: String,
    pub version: String,
    /// Unix 时间戳（毫秒）
    pub last_seen: i64,
}

/// 心跳写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    Created,
    Updated,
}
