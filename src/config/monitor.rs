use std::path::PathBuf;
use std::time::Duration;

use super::{ConfigError, duration_var, optional_var, parsed_var, required_var};
use crate::monitor::{BusyThresholds, ClassificationTable};

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub server_url: String,
    pub shared_secret: String,
    pub user_key: String,
    pub poll_interval: Duration,
    pub sleep_threshold: Duration,
    pub publish_timeout: Duration,
    pub signal_timeout: Duration,
    pub app_rules_file: Option<PathBuf>,
    pub busy: BusyThresholds,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(None, None)
    }

    /// 命令行给出的用户键和服务地址优先于环境变量
    pub fn from_env_with(
        user_key: Option<String>,
        server_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let server_url = match server_url {
            Some(url) => url,
            None => required_var("SERVER_URL")?,
        };
        let user_key = match user_key {
            Some(key) => key,
            None => required_var("USER_KEY")?,
        };

        let defaults = BusyThresholds::default();
        Ok(MonitorConfig {
            server_url,
            shared_secret: required_var("SHARED_SECRET")?,
            user_key,
            poll_interval: duration_var("POLL_INTERVAL")?.unwrap_or(Duration::from_secs(30)),
            sleep_threshold: duration_var("SLEEP_THRESHOLD")?
                .unwrap_or(Duration::from_secs(60 * 60)),
            publish_timeout: duration_var("PUBLISH_TIMEOUT")?.unwrap_or(Duration::from_secs(5)),
            signal_timeout: duration_var("SIGNAL_TIMEOUT")?.unwrap_or(Duration::from_secs(2)),
            app_rules_file: optional_var("APP_RULES_FILE").map(PathBuf::from),
            busy: BusyThresholds {
                cpu_percent: parsed_var("BUSY_CPU_PERCENT")?.unwrap_or(defaults.cpu_percent),
                memory_percent: parsed_var("BUSY_MEMORY_PERCENT")?
                    .unwrap_or(defaults.memory_percent),
                network_bytes: parsed_var("NETWORK_ACTIVITY_BYTES")?
                    .unwrap_or(defaults.network_bytes),
            },
        })
    }

    /// 加载分类表，未配置文件时使用内置表
    pub fn classification_table(&self) -> Result<ClassificationTable, ConfigError> {
        match &self.app_rules_file {
            Some(path) => ClassificationTable::from_file(path),
            None => Ok(ClassificationTable::default()),
        }
    }
}
