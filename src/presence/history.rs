use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::record::PresenceRecord;

/// 状态变化历史条目
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_key: String,
    pub status_name: String,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
}

/// 最近状态变化的有界环形缓冲，只保存在内存中
#[derive(Debug)]
pub struct TransitionHistory {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl TransitionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, record: &PresenceRecord) {
        if self.capacity == 0 {
            return;
        }

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            user_key: record.user_key.clone(),
            status_name: record.status_name.clone(),
            description: record.status_description.clone(),
            recorded_at: record.last_update,
        };

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// 按时间顺序返回最近 `limit` 条，可按用户过滤
    pub fn recent(&self, user_key: Option<&str>, limit: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut selected: Vec<HistoryEntry> = entries
            .iter()
            .rev()
            .filter(|e| user_key.is_none_or(|key| e.user_key == key))
            .take(limit)
            .cloned()
            .collect();
        selected.reverse();
        selected
    }
}
