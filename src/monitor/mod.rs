// 客户端：系统信号 -> 活动分类 -> 去抖上报

pub mod classifier;
pub mod client;
pub mod probe;
pub mod publisher;
pub mod session;
pub mod signal;
pub mod table;

pub use classifier::Classifier;
pub use client::{HttpPresenceSink, PublishError};
pub use probe::SystemSignals;
pub use publisher::{PresenceSink, Publisher, TickOutcome};
pub use session::{ActivitySession, BusyThresholds, PublishedStatus};
pub use signal::{ForegroundWindow, SignalError, SignalSnapshot, SignalSource};
pub use table::{
    AppRule, ClassificationTable, KeywordRule, Resolution, StatusLabel, StatusTag, status_catalog,
};
