/// 缓存数据模型

// 在线状态缓存模型
pub mod presence;

pub use presence::CachedPresenceRecord;
