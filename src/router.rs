use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{
    AppState,
    middleware::{RateLimiter, log_requests, rate_limit},
    middleware::rate_limit::{
        RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING, RATE_LIMIT_RESET, RATE_LIMIT_USED,
    },
    routes,
};

// 实例相关的路由，只有心跳接口经过限流
fn instance_routes(limiter: Arc<RateLimiter>) -> Router<AppState> {
    let limited = Router::new()
        .route("/instances/heartbeat", post(routes::instance::heartbeat))
        .route_layer(axum::middleware::from_fn_with_state(limiter, rate_limit));

    Router::new()
        .route("/instances/all", get(routes::instance::list_instances))
        .merge(limited)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {:?}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            RATE_LIMIT_LIMIT,
            RATE_LIMIT_REMAINING,
            RATE_LIMIT_USED,
            RATE_LIMIT_RESET,
        ])
}

// 创建主路由
pub fn create_router(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    let api = Router::new()
        .route("/healthz", get(routes::health::health))
        .merge(instance_routes(limiter));

    Router::new()
        .nest("/v1", api)
        .layer(axum::middleware::from_fn(log_requests))
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .with_state(state)
}
