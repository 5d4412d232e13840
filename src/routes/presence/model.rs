use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::{StatusLabel, StatusTag};
use crate::presence::{DisplayedPresence, HistoryEntry, PresenceUpdate};

// 状态更新请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePresenceRequest {
    pub auth_secret: String,
    pub user_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_online: Option<bool>,
}

impl UpdatePresenceRequest {
    pub fn new(auth_secret: &str, update: PresenceUpdate) -> Self {
        Self {
            auth_secret: auth_secret.to_string(),
            user_key: update.user_key,
            status_name: update.status_name,
            description: update.description,
            reported_online: update.reported_online,
        }
    }

    pub fn into_parts(self) -> (String, PresenceUpdate) {
        (
            self.auth_secret,
            PresenceUpdate {
                user_key: self.user_key,
                status_name: self.status_name,
                description: self.description,
                reported_online: self.reported_online,
            },
        )
    }
}

// 状态更新响应
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePresenceResponse {
    pub accepted: bool,
}

// 状态查询参数
#[derive(Debug, Deserialize)]
pub struct PresenceQuery {
    pub user: Option<String>,
}

// 全部用户状态
#[derive(Debug, Serialize)]
pub struct PresenceListResponse {
    pub users: BTreeMap<String, DisplayedPresence>,
    pub timestamp: DateTime<Utc>,
}

// 历史查询参数
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
    pub total: usize,
    pub filtered_user: String,
}

// 状态目录
#[derive(Debug, Serialize)]
pub struct StatusListResponse {
    pub status_list: BTreeMap<StatusTag, StatusLabel>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub users: usize,
}
