use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::presence::UserProfile;
use crate::utils::parse_duration;

pub mod monitor;

pub use monitor::MonitorConfig;

/// 默认的失踪判定阈值（10分钟）
pub const DEFAULT_MISSING_THRESHOLD: Duration = Duration::from_secs(600);

/// Redis 镜像单次读写的默认超时
pub const DEFAULT_REDIS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub shared_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub missing_threshold_secs: u64,
    pub history_limit: usize,
    pub redis_url: Option<String>,
    pub redis_timeout: Duration,
    pub users: Vec<UserProfile>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let missing_threshold =
            duration_var("MISSING_THRESHOLD")?.unwrap_or(DEFAULT_MISSING_THRESHOLD);

        let users = match optional_var("PRESENCE_USERS_FILE") {
            Some(path) => load_users(Path::new(&path))?,
            None => UserProfile::defaults(),
        };

        Ok(Config {
            shared_secret: required_var("SHARED_SECRET")?,
            server_host: optional_var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parsed_var("SERVER_PORT")?.unwrap_or(5000),
            api_base_uri: optional_var("API_BASE_URI").unwrap_or_else(|| "/api".into()),
            missing_threshold_secs: missing_threshold.as_secs(),
            history_limit: parsed_var("HISTORY_LIMIT")?.unwrap_or(100),
            redis_url: optional_var("REDIS_URL"),
            redis_timeout: duration_var("REDIS_TIMEOUT")?.unwrap_or(DEFAULT_REDIS_TIMEOUT),
            users,
        })
    }

    /// 测试和嵌入场景使用的最小配置
    pub fn with_secret(secret: &str) -> Self {
        Config {
            shared_secret: secret.to_string(),
            server_host: "127.0.0.1".into(),
            server_port: 5000,
            api_base_uri: "/api".into(),
            missing_threshold_secs: DEFAULT_MISSING_THRESHOLD.as_secs(),
            history_limit: 100,
            redis_url: None,
            redis_timeout: DEFAULT_REDIS_TIMEOUT,
            users: UserProfile::defaults(),
        }
    }

    pub fn missing_threshold(&self) -> Duration {
        Duration::from_secs(self.missing_threshold_secs)
    }
}

/// 从 JSON 文件加载用户列表
pub fn load_users(path: &Path) -> Result<Vec<UserProfile>, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    let users: Vec<UserProfile> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: display,
            source,
        })?;
    validate_users(users)
}

/// 用户键必须非空且互不相同
pub fn validate_users(users: Vec<UserProfile>) -> Result<Vec<UserProfile>, ConfigError> {
    let mut seen = HashSet::new();
    for user in &users {
        let key = user.key.trim();
        if key.is_empty() || !seen.insert(key.to_string()) {
            return Err(ConfigError::Invalid {
                name: "PRESENCE_USERS_FILE",
                value: user.key.clone(),
            });
        }
    }
    Ok(users)
}

pub(crate) fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn required_var(name: &'static str) -> Result<String, ConfigError> {
    optional_var(name).ok_or(ConfigError::Missing(name))
}

pub(crate) fn parsed_var<T: std::str::FromStr>(
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match optional_var(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}

pub(crate) fn duration_var(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    match optional_var(name) {
        Some(value) => duration_value(name, value).map(Some),
        None => Ok(None),
    }
}

/// 时长配置必须可解析且大于零
pub(crate) fn duration_value(name: &'static str, value: String) -> Result<Duration, ConfigError> {
    match parse_duration(&value) {
        Some(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_user_profiles_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{
                "key": "mutou",
                "display_name": "木头",
                "emoji": "🐰",
                "default_name": "安睡",
                "default_description": "呼呼大睡中...",
                "default_online": false,
                "missing_name": "想你",
                "missing_description": "正在想念乾雨..."
            }}]"#
        )
        .unwrap();

        let users = load_users(file.path()).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].key, "mutou");
        assert_eq!(users[0].missing_name, "想你");
    }

    #[test]
    fn rejects_malformed_user_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            load_users(file.path()),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_or_blank_user_keys() {
        let mut users = UserProfile::defaults();
        users.push(users[0].clone());
        assert!(matches!(
            validate_users(users),
            Err(ConfigError::Invalid { value, .. }) if value == "mutou"
        ));

        let mut users = UserProfile::defaults();
        users[1].key = "  ".into();
        assert!(validate_users(users).is_err());

        assert_eq!(validate_users(UserProfile::defaults()).unwrap().len(), 2);
    }

    #[test]
    fn duplicate_keys_in_user_file_are_rejected() {
        let profile = serde_json::to_string(&UserProfile::defaults()[0]).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{profile},{profile}]").unwrap();

        assert!(matches!(
            load_users(file.path()),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn zero_or_overflowing_duration_is_invalid() {
        assert!(matches!(
            duration_value("POLL_INTERVAL", "0s".into()),
            Err(ConfigError::Invalid { name: "POLL_INTERVAL", .. })
        ));
        assert!(duration_value("POLL_INTERVAL", "0".into()).is_err());
        assert!(duration_value("MISSING_THRESHOLD", "18446744073709551615h".into()).is_err());
        assert_eq!(
            duration_value("POLL_INTERVAL", "30s".into()).unwrap(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn embedded_config_uses_defaults() {
        let config = Config::with_secret("s3cret");
        assert_eq!(config.missing_threshold(), Duration::from_secs(600));
        assert_eq!(config.users.len(), 2);
        assert!(config.redis_url.is_none());
    }
}
