use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 已知用户的静态资料，同时决定初始记录和"失踪"时的展示内容
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub key: String,
    pub display_name: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    pub default_name: String,
    #[serde(default)]
    pub default_description: String,
    #[serde(default)]
    pub default_online: bool,
    pub missing_name: String,
    #[serde(default)]
    pub missing_description: String,
}

fn default_emoji() -> String {
    "👤".to_string()
}

impl UserProfile {
    /// 内置的两位用户
    pub fn defaults() -> Vec<UserProfile> {
        vec![
            UserProfile {
                key: "mutou".into(),
                display_name: "木头".into(),
                emoji: "🐰".into(),
                default_name: "安睡".into(),
                default_description: "呼呼大睡中...".into(),
                default_online: false,
                missing_name: "想你".into(),
                missing_description: "正在想念乾雨...".into(),
            },
            UserProfile {
                key: "qianyu".into(),
                display_name: "乾雨".into(),
                emoji: "🌧️".into(),
                default_name: "想你".into(),
                default_description: "正在想念木头...".into(),
                default_online: true,
                missing_name: "想你".into(),
                missing_description: "正在想念木头...".into(),
            },
        ]
    }

    pub fn initial_record(&self, created_at: DateTime<Utc>) -> PresenceRecord {
        PresenceRecord {
            user_key: self.key.clone(),
            status_name: self.default_name.clone(),
            status_description: self.default_description.clone(),
            reported_online: self.default_online,
            last_update: created_at,
        }
    }
}

/// 每个用户一条的在线状态记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresenceRecord {
    pub user_key: String,
    pub status_name: String,
    pub status_description: String,
    pub reported_online: bool,
    pub last_update: DateTime<Utc>,
}

/// 发布端提交的更新，字段为空表示保留原值
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PresenceUpdate {
    pub user_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_online: Option<bool>,
}

impl PresenceRecord {
    /// 合并一次更新，`last_update` 只前进不后退
    pub fn apply(&mut self, update: &PresenceUpdate, received_at: DateTime<Utc>) {
        if let Some(name) = non_empty(&update.status_name) {
            self.status_name = name.to_string();
        }
        if let Some(description) = non_empty(&update.description) {
            self.status_description = description.to_string();
        }
        if let Some(online) = update.reported_online {
            self.reported_online = online;
        }
        self.last_update = self.last_update.max(received_at);
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
