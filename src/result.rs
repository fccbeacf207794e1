use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// 通用的状态消息响应 `{status, message}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    pub status: u16,
    pub message: String,
}

impl ApiMessage {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}
