use serde::{Deserialize, Serialize};

use crate::database::InstanceEntity;

/// 心跳请求体
#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub uuid: String,
    pub version: String,
}

impl HeartbeatRequest {
    pub fn is_valid(&self) -> bool {
        !self.uuid.trim().is_empty() && !self.version.trim().is_empty()
    }
}

/// 实例列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct InstanceList {
    pub status: u16,
    pub total: usize,
    pub instances: Vec<InstanceEntity>,
}
