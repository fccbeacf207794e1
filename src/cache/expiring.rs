use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

// 单条记录的最长存活时间，避免 Instant 溢出
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// 缓存条目：值 + 绝对过期时间
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    deadline: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.deadline
    }
}

/// 线程安全的过期键值存储
///
/// 读取时惰性淘汰过期条目，另有后台任务定期清扫（见 [`spawn_sweeper`]）。
/// 所有操作都不会失败，过期与不存在一律表现为 `None`。
pub struct ExpiringStore<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> Default for ExpiringStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ExpiringStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// 写入或覆盖条目，过期时间为 now + ttl
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let deadline = Instant::now() + ttl.min(MAX_TTL);
        self.write().insert(key, CacheEntry { value, deadline });
    }

    /// 读取条目；已过期的条目在本次调用中被删除
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        {
            let entries = self.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // 读锁已释放，在写锁内重新确认后再删除
        let mut entries = self.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        None
    }

    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.write().remove(key);
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// 删除所有已过期的条目，返回删除数量
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// 实际持有的条目数（包括尚未被清理的过期条目）
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 启动后台清扫任务，每隔 `every` 清理一次过期条目
pub fn spawn_sweeper<K, V>(store: Arc<ExpiringStore<K, V>>, every: Duration) -> JoinHandle<()>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let every = every.max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Cache sweeper started (interval: {:?})", every);

        loop {
            ticker.tick().await;
            let removed = store.sweep_expired();
            if removed > 0 {
                tracing::debug!("Cache sweep removed {} expired entries", removed);
            }
        }
    })
}
