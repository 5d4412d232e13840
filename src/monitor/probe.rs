//! 基于 sysinfo 和 X11 命令行工具的系统信号采集。
//!
//! 进程、CPU、内存、网络来自 sysinfo；前台窗口、鼠标位置和输入空闲时间
//! 通过 `xdotool` / `xprintidle` 获取。任一子项失败只会让对应字段为空。

use std::time::Duration;

use sysinfo::{Networks, Pid, System};
use tokio::process::Command;

use super::signal::{
    ForegroundWindow, ProcessSample, SignalError, SignalSnapshot, SignalSource, SystemLoad,
};
use crate::utils::normalize_process_name;

pub struct SystemSignals {
    system: System,
    networks: Networks,
    timeout: Duration,
}

impl SystemSignals {
    pub fn new(timeout: Duration) -> Self {
        Self {
            system: System::new(),
            networks: Networks::new_with_refreshed_list(),
            timeout,
        }
    }

    /// 运行外部命令并返回 stdout，超时或失败返回错误
    async fn run(&self, program: &str, args: &[&str]) -> Result<String, SignalError> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(program).args(args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| SignalError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(SignalError::Unavailable);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn foreground(&self) -> Result<ForegroundWindow, SignalError> {
        let out = self
            .run("xdotool", &["getactivewindow", "getwindowpid", "getwindowname"])
            .await?;
        let (pid, title) = parse_window_output(&out).ok_or(SignalError::Unavailable)?;

        let process = self
            .system
            .process(Pid::from_u32(pid))
            .ok_or(SignalError::Unavailable)?;

        Ok(ForegroundWindow {
            process_name: normalize_process_name(process.name()),
            title,
        })
    }

    async fn pointer(&self) -> Result<(i32, i32), SignalError> {
        let out = self.run("xdotool", &["getmouselocation", "--shell"]).await?;
        parse_pointer_output(&out).ok_or(SignalError::Unavailable)
    }

    async fn idle_duration(&self) -> Result<Duration, SignalError> {
        let out = self.run("xprintidle", &[]).await?;
        out.trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| SignalError::Unavailable)
    }

    fn refresh_system(&mut self) -> (Vec<ProcessSample>, SystemLoad, u64) {
        self.system.refresh_processes();
        self.system.refresh_cpu();
        self.system.refresh_memory();
        self.networks.refresh();

        let processes = self
            .system
            .processes()
            .values()
            .map(|p| ProcessSample {
                name: normalize_process_name(p.name()),
                cpu_percent: p.cpu_usage(),
            })
            .collect();

        let total_memory = self.system.total_memory();
        let memory_percent = if total_memory == 0 {
            0.0
        } else {
            (self.system.used_memory() as f64 / total_memory as f64 * 100.0) as f32
        };
        let load = SystemLoad {
            cpu_percent: self.system.global_cpu_info().cpu_usage(),
            memory_percent,
        };

        let network_bytes = self
            .networks
            .iter()
            .map(|(_, data)| data.total_received() + data.total_transmitted())
            .sum();

        (processes, load, network_bytes)
    }
}

impl SignalSource for SystemSignals {
    async fn snapshot(&mut self) -> Result<SignalSnapshot, SignalError> {
        let (background_processes, load, network_bytes) = self.refresh_system();

        let foreground = self
            .foreground()
            .await
            .inspect_err(|e| tracing::debug!("Foreground window unavailable: {}", e))
            .ok();
        let pointer = self.pointer().await.ok();
        let idle_duration = self.idle_duration().await.ok();

        if foreground.is_none() && idle_duration.is_none() && background_processes.is_empty() {
            return Err(SignalError::Unavailable);
        }

        Ok(SignalSnapshot {
            foreground,
            idle_duration,
            pointer,
            background_processes,
            system_load: Some(load),
            network_bytes: Some(network_bytes),
        })
    }
}

/// `xdotool getwindowpid getwindowname` 输出两行：pid 与标题
fn parse_window_output(out: &str) -> Option<(u32, String)> {
    let mut lines = out.lines();
    let pid = lines.next()?.trim().parse().ok()?;
    let title = lines.next().unwrap_or_default().trim().to_string();
    Some((pid, title))
}

/// `xdotool getmouselocation --shell` 输出 `X=..` / `Y=..` 等行
fn parse_pointer_output(out: &str) -> Option<(i32, i32)> {
    let mut x = None;
    let mut y = None;
    for line in out.lines() {
        match line.split_once('=') {
            Some(("X", v)) => x = v.trim().parse().ok(),
            Some(("Y", v)) => y = v.trim().parse().ok(),
            _ => {}
        }
    }
    Some((x?, y?))
}
