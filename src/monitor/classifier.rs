//! 活动分类：分类表判定 + 空闲睡眠判定。
//!
//! 分类表先得出一个结果；只有当该结果不是明确的活动状态、空闲时间超过阈值、
//! 后台没有保活进程、也没有高 CPU 占用的浏览器时，才会改判为 `idle_sleep`。

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::session::{ActivitySession, BusyThresholds};
use super::signal::SignalSnapshot;
use super::table::{ClassificationTable, Resolution, StatusTag};

#[derive(Debug, Clone)]
pub struct Classifier {
    table: ClassificationTable,
    sleep_threshold: Duration,
    busy: BusyThresholds,
}

impl Classifier {
    pub fn new(table: ClassificationTable, sleep_threshold: Duration, busy: BusyThresholds) -> Self {
        Self {
            table,
            sleep_threshold,
            busy,
        }
    }

    pub fn table(&self) -> &ClassificationTable {
        &self.table
    }

    /// 更新会话中的活动时间并给出本轮状态
    pub fn classify(
        &self,
        snapshot: &SignalSnapshot,
        session: &mut ActivitySession,
        now: DateTime<Utc>,
    ) -> StatusTag {
        let resolution = self.table.resolve(snapshot.foreground.as_ref());
        session.observe(snapshot, resolution.is_affirmative(), &self.busy, now);
        self.decide(resolution, snapshot, session, now)
    }

    /// 纯判定，不修改会话
    pub fn decide(
        &self,
        resolution: Resolution,
        snapshot: &SignalSnapshot,
        session: &ActivitySession,
        now: DateTime<Utc>,
    ) -> StatusTag {
        if !resolution.is_affirmative() && self.sleep_eligible(snapshot, session, now) {
            return StatusTag::IdleSleep;
        }

        match resolution {
            Resolution::Matched(tag) => tag,
            Resolution::Unrecognized | Resolution::Unresolved => StatusTag::Unknown,
        }
    }

    fn sleep_eligible(
        &self,
        snapshot: &SignalSnapshot,
        session: &ActivitySession,
        now: DateTime<Utc>,
    ) -> bool {
        let inactive = session.inactive_for(now).to_std().unwrap_or(Duration::ZERO);
        if inactive <= self.sleep_threshold {
            return false;
        }

        !snapshot.background_processes.iter().any(|p| {
            self.table.is_keep_alive(&p.name)
                || (self.table.is_browser(&p.name)
                    && p.cpu_percent > self.table.browser_cpu_threshold)
        })
    }
}
