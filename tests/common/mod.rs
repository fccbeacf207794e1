#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Request, Response},
};
use heartbeat_analytics::{
    AppState,
    cache::ExpiringStore,
    config::Config,
    database::{HeartbeatOutcome, InstanceEntity, InstanceRepository},
    middleware::RateLimiter,
    router::create_router,
};
use sqlx::Error as SqlxError;
use tower::ServiceExt;

/// 内存实现，用于替代 PostgreSQL
#[derive(Default)]
pub struct MemoryInstances {
    rows: Mutex<HashMap<String, InstanceEntity>>,
}

impl MemoryInstances {
    pub fn insert(&self, uuid: &str, version: &str, last_seen: i64) {
        self.rows.lock().unwrap().insert(
            uuid.to_string(),
            InstanceEntity {
                uuid: uuid.to_string(),
                version: version.to_string(),
                last_seen,
            },
        );
    }

    pub fn get(&self, uuid: &str) -> Option<InstanceEntity> {
        self.rows.lock().unwrap().get(uuid).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl InstanceRepository for MemoryInstances {
    async fn record_heartbeat(
        &self,
        uuid: &str,
        version: &str,
        last_seen: i64,
    ) -> Result<HeartbeatOutcome, SqlxError> {
        let mut rows = self.rows.lock().unwrap();
        let outcome = if rows.contains_key(uuid) {
            HeartbeatOutcome::Updated
        } else {
            HeartbeatOutcome::Created
        };
        rows.insert(
            uuid.to_string(),
            InstanceEntity {
                uuid: uuid.to_string(),
                version: version.to_string(),
                last_seen,
            },
        );
        Ok(outcome)
    }

    async fn list_all(&self) -> Result<Vec<InstanceEntity>, SqlxError> {
        let mut all: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        Ok(all)
    }

    async fn delete_older_than(&self, cutoff: i64) -> Result<u64, SqlxError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|_, row| row.last_seen >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

/// 所有操作都失败的存储
pub struct BrokenInstances;

#[async_trait]
impl InstanceRepository for BrokenInstances {
    async fn record_heartbeat(&self, _: &str, _: &str, _: i64) -> Result<HeartbeatOutcome, SqlxError> {
        Err(SqlxError::PoolTimedOut)
    }

    async fn list_all(&self) -> Result<Vec<InstanceEntity>, SqlxError> {
        Err(SqlxError::PoolTimedOut)
    }

    async fn delete_older_than(&self, _: i64) -> Result<u64, SqlxError> {
        Err(SqlxError::PoolTimedOut)
    }
}

pub fn test_config(limit: u32, window_secs: u64, trusted_proxies: &[&str]) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        rate_limit_requests: limit,
        rate_limit_window_secs: window_secs,
        trusted_proxies: trusted_proxies.iter().map(|s| s.to_string()).collect(),
        cors_allowed_origins: vec!["*".to_string()],
        cache_sweep_interval_secs: 300,
        instance_retention_secs: 48 * 3600,
        instance_cleanup_interval_secs: 24 * 3600,
    }
}

pub fn app(config: Config, instances: Arc<dyn InstanceRepository>) -> Router {
    let store = Arc::new(ExpiringStore::new());
    let limiter = Arc::new(RateLimiter::from_config(store, &config));
    create_router(AppState { config, instances }, limiter)
}

pub fn heartbeat_request(peer: Option<&str>, body: &str) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/v1/instances/heartbeat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    if let Some(peer) = peer {
        let addr = SocketAddr::new(peer.parse().unwrap(), 40000);
        req.extensions_mut().insert(ConnectInfo(addr));
    }
    req
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn header(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .map(|v| v.to_str().unwrap().to_string())
}

pub const WINDOW_DAY: u64 = 86400;

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}
