use sha2::{Digest, Sha256};
use std::time::Duration;

/// 解析时长配置，支持 `30s` / `10m` / `1h` 以及纯数字（秒）
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (number, multiplier) = if let Some(n) = raw.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = raw.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = raw.strip_suffix('s') {
        (n, 1)
    } else {
        (raw, 1)
    };

    number
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .map(Duration::from_secs)
}

/// 比较共享密钥，先做摘要再比较，避免按字节提前返回
pub fn secret_matches(expected: &str, provided: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let provided = Sha256::digest(provided.as_bytes());

    expected
        .iter()
        .zip(provided.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// 进程名归一化：小写并去掉 `.exe` 后缀
pub fn normalize_process_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

pub mod error_codes {
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const UNKNOWN_USER: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_suffixes() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("10m"), Some(Duration::from_secs(600)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration(" 45 "), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("ten minutes"), None);
        assert_eq!(parse_duration("0s"), Some(Duration::ZERO));
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn oversized_duration_is_rejected() {
        assert_eq!(parse_duration("18446744073709551615h"), None);
        assert_eq!(parse_duration("18446744073709551615m"), None);
        assert_eq!(
            parse_duration("18446744073709551615"),
            Some(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn secret_comparison() {
        assert!(secret_matches("my_love_secret_2024", "my_love_secret_2024"));
        assert!(!secret_matches("my_love_secret_2024", "my_love_secret_2025"));
        assert!(!secret_matches("my_love_secret_2024", ""));
    }

    #[test]
    fn process_names_are_normalized() {
        assert_eq!(normalize_process_name("Code.exe"), "code");
        assert_eq!(normalize_process_name("firefox"), "firefox");
        assert_eq!(normalize_process_name(" VLC.EXE "), "vlc");
    }
}
