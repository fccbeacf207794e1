use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::database::InstanceRepository;

/// 定期删除长时间未上报心跳的实例，启动时立即执行一次
pub fn spawn_instance_cleanup(
    instances: Arc<dyn InstanceRepository>,
    retention: Duration,
    every: Duration,
) -> JoinHandle<()> {
    let every = every.max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            tracing::info!("Cleaning up stale instances");

            let cutoff = retention_cutoff(chrono::Utc::now().timestamp_millis(), retention);
            match instances.delete_older_than(cutoff).await {
                Ok(rows) => tracing::info!("Stale instances removed: {}", rows),
                Err(e) => tracing::error!("Failed to clean up stale instances: {}", e),
            }
        }
    })
}

/// 保留期的截止时间（毫秒），过大的保留期饱和到最早时刻而不是回绕
fn retention_cutoff(now_millis: i64, retention: Duration) -> i64 {
    now_millis.saturating_sub(i64::try_from(retention.as_millis()).unwrap_or(i64::MAX))
}
