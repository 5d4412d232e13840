use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;

use super::classifier::Classifier;
use super::client::PublishError;
use super::session::{ActivitySession, PublishedStatus};
use super::signal::{SignalSnapshot, SignalSource};
use super::table::StatusTag;
use crate::presence::PresenceUpdate;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 上报目的地
#[allow(async_fn_in_trait)]
pub trait PresenceSink {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), PublishError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 与上次成功上报相同，未发请求
    Unchanged(StatusTag),
    Published(StatusTag),
    /// 上报失败，下一轮重试
    Failed(StatusTag),
}

/// 轮询循环：采样、分类、状态变化时上报
pub struct Publisher<S, P> {
    source: S,
    sink: P,
    classifier: Classifier,
    user_key: String,
}

impl<S: SignalSource, P: PresenceSink> Publisher<S, P> {
    pub fn new(source: S, sink: P, classifier: Classifier, user_key: &str) -> Self {
        Self {
            source,
            sink,
            classifier,
            user_key: user_key.to_string(),
        }
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub async fn tick(&mut self, session: &mut ActivitySession, now: DateTime<Utc>) -> TickOutcome {
        let snapshot = match self.source.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Signal query failed, treating as no signal: {}", e);
                SignalSnapshot::default()
            }
        };

        let tag = self.classifier.classify(&snapshot, session, now);
        let candidate = PublishedStatus {
            tag,
            title: match tag {
                StatusTag::IdleSleep => None,
                _ => snapshot.foreground.as_ref().map(|w| w.title.clone()),
            },
        };

        if session.last_published_status.as_ref() == Some(&candidate) {
            tracing::debug!("Status unchanged ({:?}), skipping publish", tag);
            return TickOutcome::Unchanged(tag);
        }

        let update =
            self.classifier
                .table()
                .presence_update(&self.user_key, tag, snapshot.foreground.as_ref());

        match self.sink.publish(&update).await {
            Ok(()) => {
                if tag == StatusTag::IdleSleep {
                    tracing::info!(
                        "Published sleep, inactive since {}",
                        session.last_activity_time.format("%H:%M:%S")
                    );
                } else {
                    tracing::info!(
                        "Published {:?}: {} - {}",
                        tag,
                        update.status_name.as_deref().unwrap_or_default(),
                        update.description.as_deref().unwrap_or_default()
                    );
                }
                session.last_published_status = Some(candidate);
                TickOutcome::Published(tag)
            }
            Err(e) => {
                tracing::warn!("Publish of {:?} failed, will retry next tick: {}", tag, e);
                TickOutcome::Failed(tag)
            }
        }
    }

    /// 按固定间隔轮询，`shutdown` 完成后在两轮之间退出
    pub async fn run(&mut self, interval: Duration, shutdown: impl Future<Output = ()>) {
        let mut session = ActivitySession::new(Utc::now());
        // tokio 的 interval 不接受零间隔
        let mut ticker = tokio::time::interval(interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Monitor stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick(&mut session, Utc::now()).await;
                }
            }
        }
    }
}
