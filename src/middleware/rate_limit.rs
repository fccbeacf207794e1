use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::cache::ExpiringStore;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware::client_ip::{parse_trusted_proxies, resolve_client_ip};

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RATE_LIMIT_USED: HeaderName = HeaderName::from_static("x-ratelimit-used");
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// 单次请求的配额判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    /// Unix 时间戳（秒）
    pub reset_at: i64,
}

impl QuotaDecision {
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(RATE_LIMIT_USED, HeaderValue::from(self.used));
        headers.insert(RATE_LIMIT_RESET, HeaderValue::from(self.reset_at));
    }
}

/// 心跳接口的按客户端限流器
///
/// 计数完全保存在注入的 [`ExpiringStore`] 中。每次放行都会以完整窗口长度重新写入，
/// 因此窗口从最近一次被接受的请求开始计算；被拒绝的请求不会回写。
pub struct RateLimiter {
    store: Arc<ExpiringStore<String, u32>>,
    limit: u32,
    window: Duration,
    trusted_proxies: HashSet<IpAddr>,
    // 串行化整个 读取-判定-写入 过程，避免并发超额放行
    decision_lock: Mutex<()>,
}

impl RateLimiter {
    pub fn new(
        store: Arc<ExpiringStore<String, u32>>,
        limit: u32,
        window: Duration,
        trusted_proxies: HashSet<IpAddr>,
    ) -> Self {
        Self {
            store,
            limit,
            window,
            trusted_proxies,
            decision_lock: Mutex::new(()),
        }
    }

    pub fn from_config(store: Arc<ExpiringStore<String, u32>>, config: &Config) -> Self {
        Self::new(
            store,
            config.rate_limit_requests,
            config.rate_limit_window(),
            parse_trusted_proxies(&config.trusted_proxies),
        )
    }

    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
        resolve_client_ip(headers, peer, &self.trusted_proxies)
    }

    /// 对标识 `key` 记一次请求并给出判定
    pub fn check(&self, key: &str) -> QuotaDecision {
        let _guard = self
            .decision_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let (allowed, used) = match self.store.get(key) {
            None => {
                self.store.set(key.to_string(), 1, self.window);
                (true, 1)
            }
            Some(current) => match current.checked_add(1) {
                Some(candidate) if candidate <= self.limit => {
                    self.store.set(key.to_string(), candidate, self.window);
                    (true, candidate)
                }
                // 超额时保留上一次被接受的计数，也不延长窗口
                _ => (false, current),
            },
        };

        QuotaDecision {
            allowed,
            limit: self.limit,
            used,
            remaining: self.limit.saturating_sub(used),
            reset_at: chrono::Utc::now()
                .timestamp()
                .saturating_add(i64::try_from(self.window.as_secs()).unwrap_or(i64::MAX)),
        }
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);

        let Some(key) = self.client_key(req.headers(), peer) else {
            tracing::error!(
                "Unable to determine client IP for {} {}",
                req.method(),
                req.uri().path()
            );
            return AppError::ClientIpUnavailable.into_response();
        };

        let decision = self.check(&key);

        let mut response = if decision.allowed {
            tracing::debug!(
                "Rate limit passed for {} ({}/{})",
                key,
                decision.used,
                decision.limit
            );
            next.run(req).await
        } else {
            tracing::warn!(
                "Rate limit exceeded for {} ({}/{})",
                key,
                decision.used,
                decision.limit
            );
            AppError::RateLimitExceeded.into_response()
        };

        decision.write_headers(response.headers_mut());
        response
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}
