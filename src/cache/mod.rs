// 缓存模块
// 进程内的过期键值存储，作为限流计数的后端

pub mod expiring;

// 重新导出常用类型
pub use expiring::{ExpiringStore, spawn_sweeper};
