use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::presence::PresenceRecord;

/// 在线状态缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedPresenceRecord {
    pub user_key: String,
    pub status_name: String,
    pub status_description: String,
    pub reported_online: bool,
    pub last_update: i64, // Unix timestamp (毫秒)
}

impl From<&PresenceRecord> for CachedPresenceRecord {
    fn from(record: &PresenceRecord) -> Self {
        Self {
            user_key: record.user_key.clone(),
            status_name: record.status_name.clone(),
            status_description: record.status_description.clone(),
            reported_online: record.reported_online,
            last_update: record.last_update.timestamp_millis(),
        }
    }
}

impl From<CachedPresenceRecord> for PresenceRecord {
    fn from(cached: CachedPresenceRecord) -> Self {
        Self {
            user_key: cached.user_key,
            status_name: cached.status_name,
            status_description: cached.status_description,
            reported_online: cached.reported_online,
            last_update: DateTime::from_timestamp_millis(cached.last_update)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}
