/// 数据库实体
pub mod instance;

pub use instance::*;
