//! 读取时推导展示状态：记录超过阈值未更新时显示"失踪"状态。

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::{PresenceRecord, UserProfile};

/// 对外展示的在线状态
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DisplayedPresence {
    pub user: String,
    pub display_name: String,
    pub emoji: String,
    pub name: String,
    pub description: String,
    pub online: bool,
    /// 是否为超时推导出的"失踪"状态
    pub missing: bool,
    /// 原始的最后更新时间，不受超时推导影响
    pub last_update: Option<DateTime<Utc>>,
}

impl DisplayedPresence {
    /// 未知用户的占位状态
    pub fn unknown_user(user_key: &str) -> Self {
        Self {
            user: user_key.to_string(),
            display_name: user_key.to_string(),
            emoji: "👤".into(),
            name: "未知".into(),
            description: String::new(),
            online: false,
            missing: false,
            last_update: None,
        }
    }
}

/// 纯函数：相同的记录和 `now` 总是得到相同结果
pub fn resolve(
    profile: &UserProfile,
    record: Option<&PresenceRecord>,
    now: DateTime<Utc>,
    missing_threshold: Duration,
) -> DisplayedPresence {
    let Some(record) = record else {
        return DisplayedPresence::unknown_user(&profile.key);
    };

    // 时间回拨时 staleness 视为 0
    let staleness = (now - record.last_update).to_std().unwrap_or(Duration::ZERO);

    if staleness > missing_threshold {
        DisplayedPresence {
            user: profile.key.clone(),
            display_name: profile.display_name.clone(),
            emoji: profile.emoji.clone(),
            name: profile.missing_name.clone(),
            description: profile.missing_description.clone(),
            online: true,
            missing: true,
            last_update: Some(record.last_update),
        }
    } else {
        DisplayedPresence {
            user: profile.key.clone(),
            display_name: profile.display_name.clone(),
            emoji: profile.emoji.clone(),
            name: record.status_name.clone(),
            description: record.status_description.clone(),
            online: record.reported_online,
            missing: false,
            last_update: Some(record.last_update),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const THRESHOLD: Duration = Duration::from_secs(600);

    fn fixture(now: DateTime<Utc>, age_secs: i64) -> (UserProfile, PresenceRecord) {
        let profile = UserProfile::defaults().remove(0);
        let record = PresenceRecord {
            user_key: profile.key.clone(),
            status_name: "游戏".into(),
            status_description: "Steam启动！".into(),
            reported_online: false,
            last_update: now - ChronoDuration::seconds(age_secs),
        };
        (profile, record)
    }

    #[test]
    fn stale_record_resolves_to_missing() {
        let now = Utc::now();
        let (profile, record) = fixture(now, 601);

        let shown = resolve(&profile, Some(&record), now, THRESHOLD);

        assert!(shown.missing);
        assert!(shown.online);
        assert_eq!(shown.name, "想你");
        assert_eq!(shown.description, "正在想念乾雨...");
        assert_eq!(shown.last_update, Some(record.last_update));
    }

    #[test]
    fn fresh_record_is_returned_verbatim() {
        let now = Utc::now();
        let (profile, record) = fixture(now, 599);

        let shown = resolve(&profile, Some(&record), now, THRESHOLD);

        assert!(!shown.missing);
        assert!(!shown.online);
        assert_eq!(shown.name, "游戏");
        assert_eq!(shown.description, "Steam启动！");
    }

    #[test]
    fn exactly_at_threshold_is_not_missing() {
        let now = Utc::now();
        let (profile, record) = fixture(now, 600);

        assert!(!resolve(&profile, Some(&record), now, THRESHOLD).missing);
    }

    #[test]
    fn resolution_is_repeatable() {
        let now = Utc::now();
        let (profile, record) = fixture(now, 601);

        assert_eq!(
            resolve(&profile, Some(&record), now, THRESHOLD),
            resolve(&profile, Some(&record), now, THRESHOLD)
        );
    }

    #[test]
    fn record_from_the_future_counts_as_fresh() {
        let now = Utc::now();
        let (profile, record) = fixture(now, -30);

        assert!(!resolve(&profile, Some(&record), now, THRESHOLD).missing);
    }

    #[test]
    fn missing_record_yields_sentinel() {
        let profile = UserProfile::defaults().remove(0);
        let shown = resolve(&profile, None, Utc::now(), THRESHOLD);

        assert_eq!(shown.name, "未知");
        assert!(shown.last_update.is_none());
    }
}
