use std::time::Duration;

/// 前台窗口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundWindow {
    /// 归一化后的进程名（小写，无 `.exe`）
    pub process_name: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub name: String,
    pub cpu_percent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemLoad {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

/// 一次采样得到的系统信号，任何字段都可能缺失
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSnapshot {
    pub foreground: Option<ForegroundWindow>,
    /// 距离最后一次键盘/鼠标输入的时长
    pub idle_duration: Option<Duration>,
    pub pointer: Option<(i32, i32)>,
    pub background_processes: Vec<ProcessSample>,
    pub system_load: Option<SystemLoad>,
    /// 网络收发字节累计值
    pub network_bytes: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("no signal could be collected")]
    Unavailable,
    #[error("signal query timed out after {0:?}")]
    Timeout(Duration),
    #[error("signal query failed: {0}")]
    Io(#[from] std::io::Error),
}

/// 每个轮询周期被查询一次的信号来源
#[allow(async_fn_in_trait)]
pub trait SignalSource {
    async fn snapshot(&mut self) -> Result<SignalSnapshot, SignalError>;
}
