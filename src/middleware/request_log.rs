use std::time::Instant;

use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};

// 错误响应体都很短，超过上限的不再记录
const MAX_LOGGED_BODY: usize = 1024;

/// 记录每个请求的方法、路径、状态码与耗时
///
/// 4xx 记为 warn，2xx/3xx 记为 info；5xx 记为 error 并附带响应体。
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    let status = response.status();
    let latency = started.elapsed();

    if status.is_client_error() {
        warn!(%method, %path, status = status.as_u16(), ?latency, "Client error");
        return response;
    }
    if !status.is_server_error() {
        info!(%method, %path, status = status.as_u16(), ?latency, "Request");
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(b) => b,
        Err(e) => {
            error!(%method, %path, status = status.as_u16(), ?latency, "Server error, body unreadable: {}", e);
            parts.headers.remove(axum::http::header::CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    error!(
        %method,
        %path,
        status = status.as_u16(),
        ?latency,
        "Server error: {}",
        String::from_utf8_lossy(&bytes)
    );

    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
