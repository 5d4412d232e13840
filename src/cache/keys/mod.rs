/// 缓存键模块

// 在线状态缓存键
pub mod presence_keys;

pub use presence_keys::presence_record_key;
