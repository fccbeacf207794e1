use axum::{Json, http::StatusCode};

use crate::result::ApiMessage;

// GET 路由同时响应 HEAD 请求
pub async fn health() -> Json<ApiMessage> {
    Json(ApiMessage::new(StatusCode::OK, "OK"))
}
