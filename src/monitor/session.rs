use chrono::{DateTime, Utc};

use super::signal::SignalSnapshot;
use super::table::StatusTag;

/// 判定"系统正忙"的阈值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusyThresholds {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    /// 两次采样之间网络收发字节增量超过该值视为活动，默认任何增长都算
    pub network_bytes: u64,
}

impl Default for BusyThresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 30.0,
            memory_percent: 70.0,
            network_bytes: 0,
        }
    }
}

/// 最后一次成功上报的内容，用于去抖
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedStatus {
    pub tag: StatusTag,
    pub title: Option<String>,
}

/// 客户端会话状态，只在进程生命周期内存在
#[derive(Debug, Clone)]
pub struct ActivitySession {
    pub last_active_window: Option<(String, String)>,
    pub last_pointer: Option<(i32, i32)>,
    pub last_network_bytes: Option<u64>,
    pub last_activity_time: DateTime<Utc>,
    pub last_published_status: Option<PublishedStatus>,
}

impl ActivitySession {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            last_active_window: None,
            last_pointer: None,
            last_network_bytes: None,
            last_activity_time: started_at,
            last_published_status: None,
        }
    }

    /// 综合多种启发式判断本轮是否有活动，有则刷新 `last_activity_time`
    pub fn observe(
        &mut self,
        snapshot: &SignalSnapshot,
        affirmative: bool,
        busy: &BusyThresholds,
        now: DateTime<Utc>,
    ) -> bool {
        let mut active = affirmative;

        if let Some(window) = &snapshot.foreground {
            let identity = (window.process_name.clone(), window.title.clone());
            if self.last_active_window.as_ref() != Some(&identity) {
                active = true;
                self.last_active_window = Some(identity);
            }
        }

        if let Some(pointer) = snapshot.pointer {
            if self.last_pointer != Some(pointer) {
                active = true;
                self.last_pointer = Some(pointer);
            }
        }

        if let Some(load) = snapshot.system_load {
            if load.cpu_percent > busy.cpu_percent || load.memory_percent > busy.memory_percent {
                active = true;
            }
        }

        if let Some(bytes) = snapshot.network_bytes {
            if let Some(previous) = self.last_network_bytes {
                if bytes.saturating_sub(previous) > busy.network_bytes {
                    active = true;
                }
            }
            self.last_network_bytes = Some(bytes);
        }

        if active {
            self.last_activity_time = now;
        } else if let Some(idle) = snapshot.idle_duration {
            // 系统空闲计时器给出最后一次输入的时间
            if let Some(last_input) = chrono::Duration::from_std(idle)
                .ok()
                .and_then(|idle| now.checked_sub_signed(idle))
            {
                self.last_activity_time = self.last_activity_time.max(last_input);
            }
        }

        active
    }

    /// 距离最后一次活动的时长
    pub fn inactive_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_activity_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::signal::{ForegroundWindow, SystemLoad};
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn quiet_snapshot() -> SignalSnapshot {
        SignalSnapshot {
            system_load: Some(SystemLoad {
                cpu_percent: 2.0,
                memory_percent: 40.0,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn window_change_counts_as_activity() {
        let start = Utc::now();
        let mut session = ActivitySession::new(start);
        let busy = BusyThresholds::default();
        let mut snapshot = quiet_snapshot();
        snapshot.foreground = Some(ForegroundWindow {
            process_name: "code".into(),
            title: "main.rs".into(),
        });

        let later = start + Duration::minutes(5);
        assert!(session.observe(&snapshot, false, &busy, later));
        assert_eq!(session.last_activity_time, later);

        // 同一窗口不再算作活动
        let much_later = later + Duration::minutes(5);
        assert!(!session.observe(&snapshot, false, &busy, much_later));
        assert_eq!(session.last_activity_time, later);
    }

    #[test]
    fn pointer_movement_and_busy_cpu_count_as_activity() {
        let start = Utc::now();
        let mut session = ActivitySession::new(start);
        let busy = BusyThresholds::default();

        let mut moved = quiet_snapshot();
        moved.pointer = Some((10, 20));
        assert!(session.observe(&moved, false, &busy, start + Duration::seconds(30)));

        let mut loaded = quiet_snapshot();
        loaded.system_load = Some(SystemLoad {
            cpu_percent: 85.0,
            memory_percent: 40.0,
        });
        assert!(session.observe(&loaded, false, &busy, start + Duration::seconds(60)));
    }

    #[test]
    fn any_network_counter_advance_counts_as_activity() {
        let start = Utc::now();
        let mut session = ActivitySession::new(start);
        let busy = BusyThresholds::default();
        let later = start + Duration::hours(2);

        let mut snapshot = quiet_snapshot();
        snapshot.network_bytes = Some(1_000);
        assert!(!session.observe(&snapshot, false, &busy, start));

        // 计数器未变化不算活动
        assert!(!session.observe(&snapshot, false, &busy, start));

        snapshot.network_bytes = Some(400_000);
        assert!(session.observe(&snapshot, false, &busy, later));
        assert_eq!(session.inactive_for(later), Duration::zero());
    }

    #[test]
    fn network_threshold_can_require_a_larger_delta() {
        let start = Utc::now();
        let mut session = ActivitySession::new(start);
        let busy = BusyThresholds {
            network_bytes: 512 * 1024,
            ..Default::default()
        };

        let mut snapshot = quiet_snapshot();
        snapshot.network_bytes = Some(1_000);
        assert!(!session.observe(&snapshot, false, &busy, start));

        snapshot.network_bytes = Some(400_000);
        assert!(!session.observe(&snapshot, false, &busy, start));

        snapshot.network_bytes = Some(10_000_000);
        assert!(session.observe(&snapshot, false, &busy, start));
    }

    #[test]
    fn idle_timer_moves_activity_forward_only() {
        let start = Utc::now();
        let mut session = ActivitySession::new(start);
        let busy = BusyThresholds::default();

        let now = start + Duration::minutes(30);
        let mut snapshot = quiet_snapshot();
        snapshot.idle_duration = Some(StdDuration::from_secs(60));
        session.observe(&snapshot, false, &busy, now);
        assert_eq!(session.last_activity_time, now - Duration::seconds(60));

        // 更长的空闲时长不会把时间往回拨
        snapshot.idle_duration = Some(StdDuration::from_secs(3 * 3600));
        session.observe(&snapshot, false, &busy, now + Duration::minutes(1));
        assert_eq!(session.last_activity_time, now - Duration::seconds(60));
    }

    #[test]
    fn absurd_idle_duration_is_ignored() {
        let start = Utc::now();
        let mut session = ActivitySession::new(start);
        let mut snapshot = quiet_snapshot();
        snapshot.idle_duration = Some(StdDuration::from_secs(i64::MAX as u64 / 1000));

        let now = start + Duration::minutes(1);
        assert!(!session.observe(&snapshot, false, &BusyThresholds::default(), now));
        assert_eq!(session.last_activity_time, start);
    }

    #[test]
    fn affirmative_tag_refreshes_activity() {
        let start = Utc::now();
        let mut session = ActivitySession::new(start);
        let now = start + Duration::hours(2);

        assert!(session.observe(&quiet_snapshot(), true, &BusyThresholds::default(), now));
        assert_eq!(session.inactive_for(now), Duration::zero());
    }
}
