/// 数据库操作实现
pub mod instance;

pub use instance::InstanceOperation;
