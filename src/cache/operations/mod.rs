/// 缓存操作

// 在线状态缓存操作
pub mod presence;

pub use presence::PresenceCacheOperations;
