use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use heartbeat_analytics::{
    AppState,
    cache::{ExpiringStore, spawn_sweeper},
    config::Config,
    database::{self, InstanceOperation, spawn_instance_cleanup},
    middleware::RateLimiter,
    router::create_router,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        "Rate limit: {} requests per {} seconds, trusted proxies: {:?}",
        config.rate_limit_requests,
        config.rate_limit_window_secs,
        config.trusted_proxies
    );

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");
    database::ensure_schema(&pool)
        .await
        .expect("Failed to prepare database schema");

    let instances = Arc::new(InstanceOperation::new(Arc::new(pool)));

    // 限流计数存储与后台清扫
    let store = Arc::new(ExpiringStore::new());
    spawn_sweeper(store.clone(), config.cache_sweep_interval());
    let rate_limiter = Arc::new(RateLimiter::from_config(store, &config));

    // 过期实例清理
    spawn_instance_cleanup(
        instances.clone(),
        config.instance_retention(),
        config.instance_cleanup_interval(),
    );

    let state = AppState {
        config: config.clone(),
        instances,
    };
    let app = create_router(state, rate_limiter);

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to 0.0.0.0");
            IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
