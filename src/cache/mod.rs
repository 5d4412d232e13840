// 缓存模块
// 在线状态记录的 Redis 镜像

pub mod keys;
pub mod models;
pub mod operations;

// 重新导出常用类型
pub use models::CachedPresenceRecord;
pub use operations::PresenceCacheOperations;
