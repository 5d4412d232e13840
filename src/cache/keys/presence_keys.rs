/// 在线状态记录缓存键前缀
const PRESENCE_RECORD_PREFIX: &str = "presence:record:";

/// 生成在线状态记录缓存键
pub fn presence_record_key(user_key: &str) -> String {
    format!("{}{}", PRESENCE_RECORD_PREFIX, user_key)
}
