//! 应用分类表与状态展示文案。
//!
//! 表项要么是固定状态，要么是带有序关键词列表的标题规则（浏览器）。
//! 整张表是纯数据，可从 JSON 文件加载。

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::signal::ForegroundWindow;
use crate::config::ConfigError;
use crate::presence::PresenceUpdate;
use crate::utils::normalize_process_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTag {
    Working,
    BrowsingMedia,
    Listening,
    Watching,
    Gaming,
    Chatting,
    Studying,
    IdleSleep,
    Unknown,
}

impl StatusTag {
    /// 明确表示用户正在做某事的状态，会抑制睡眠判定
    pub fn is_affirmative(self) -> bool {
        !matches!(self, StatusTag::IdleSleep | StatusTag::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub tag: StatusTag,
    pub keywords: Vec<String>,
}

/// 按标题关键词判定，类别按顺序匹配，先命中者优先
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub categories: Vec<KeywordCategory>,
    #[serde(default = "default_fallback")]
    pub fallback: StatusTag,
}

fn default_fallback() -> StatusTag {
    StatusTag::Working
}

impl KeywordRule {
    pub fn evaluate(&self, title: &str) -> StatusTag {
        let title = title.to_lowercase();
        self.categories
            .iter()
            .find(|c| {
                c.keywords
                    .iter()
                    .any(|k| !k.is_empty() && title.contains(&k.to_lowercase()))
            })
            .map(|c| c.tag)
            .unwrap_or(self.fallback)
    }

    /// 媒体 > 学习 > 工作 > 音乐
    pub fn browser_default() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|w| w.to_string()).collect()
        }

        Self {
            categories: vec![
                KeywordCategory {
                    tag: StatusTag::BrowsingMedia,
                    keywords: words(&[
                        "bilibili", "b站", "bili", "哔哩哔哩", "youtube", "up主", "弹幕",
                    ]),
                },
                KeywordCategory {
                    tag: StatusTag::Studying,
                    keywords: words(&["coursera", "udemy", "慕课", "学堂在线", "edx"]),
                },
                KeywordCategory {
                    tag: StatusTag::Working,
                    keywords: words(&["github", "stackoverflow", "developer", "documentation"]),
                },
                KeywordCategory {
                    tag: StatusTag::Listening,
                    keywords: words(&["music", "音乐", "spotify"]),
                },
            ],
            fallback: StatusTag::Working,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppRule {
    Fixed(StatusTag),
    Keywords(KeywordRule),
}

/// 分类表对前台窗口的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Matched(StatusTag),
    /// 有前台进程但不在表中
    Unrecognized,
    /// 没有前台进程，或表项是睡眠别名
    Unresolved,
}

impl Resolution {
    pub fn is_affirmative(self) -> bool {
        matches!(self, Resolution::Matched(tag) if tag.is_affirmative())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLabel {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationTable {
    pub apps: HashMap<String, AppRule>,
    /// 在后台运行即阻止睡眠判定的进程
    #[serde(default)]
    pub keep_alive: Vec<String>,
    /// 浏览器 CPU 占用超过该值视为后台在播放媒体
    #[serde(default = "default_browser_cpu_threshold")]
    pub browser_cpu_threshold: f32,
    #[serde(default = "default_labels")]
    pub labels: HashMap<StatusTag, StatusLabel>,
}

fn default_browser_cpu_threshold() -> f32 {
    10.0
}

/// 内置的状态目录，按状态排序
pub fn status_catalog() -> BTreeMap<StatusTag, StatusLabel> {
    default_labels().into_iter().collect()
}

fn default_labels() -> HashMap<StatusTag, StatusLabel> {
    [
        (StatusTag::Working, "工作中", "正在努力工作"),
        (StatusTag::BrowsingMedia, "看B站", "正在刷B站"),
        (StatusTag::Listening, "听音乐", "正在享受音乐"),
        (StatusTag::Watching, "看视频", "正在看视频"),
        (StatusTag::Gaming, "玩游戏", "在游戏世界里"),
        (StatusTag::Chatting, "聊天中", "在和朋友聊天"),
        (StatusTag::Studying, "学习中", "在认真学习"),
        (StatusTag::IdleSleep, "睡觉中", "正在做美梦zzz..."),
        (StatusTag::Unknown, "未知状态", "正在使用未知应用"),
    ]
    .into_iter()
    .map(|(tag, name, description)| {
        (
            tag,
            StatusLabel {
                name: name.to_string(),
                description: description.to_string(),
            },
        )
    })
    .collect()
}

impl Default for ClassificationTable {
    fn default() -> Self {
        use StatusTag::*;

        let fixed: &[(&str, StatusTag)] = &[
            // 工作
            ("code", Working),
            ("devenv", Working),
            ("pycharm64", Working),
            ("idea64", Working),
            ("webstorm64", Working),
            ("notepad++", Working),
            ("cursor", Working),
            ("feishu", Working),
            // 通信
            ("wechat", Chatting),
            ("wechatappex", Chatting),
            ("qq", Chatting),
            ("dingtalk", Chatting),
            ("zoom", Chatting),
            ("teams", Chatting),
            ("slack", Chatting),
            ("discord", Chatting),
            // 游戏
            ("steam", Gaming),
            ("genshinimpact", Gaming),
            ("leagueoflegends", Gaming),
            ("wow", Gaming),
            ("minecraft", Gaming),
            // 音乐
            ("cloudmusic", Listening),
            ("spotify", Listening),
            ("qqmusic", Listening),
            // 视频
            ("bilibilidesktop", Watching),
            ("potplayer", Watching),
            ("potplayermini64", Watching),
            ("vlc", Watching),
            // 学习
            ("anki", Studying),
            ("obsidian", Studying),
            ("notion", Studying),
            ("typora", Studying),
            // 锁屏
            ("lockapp", IdleSleep),
        ];

        let mut apps: HashMap<String, AppRule> = fixed
            .iter()
            .map(|(name, tag)| (name.to_string(), AppRule::Fixed(*tag)))
            .collect();
        for browser in ["chrome", "firefox", "msedge", "edge", "brave"] {
            apps.insert(
                browser.to_string(),
                AppRule::Keywords(KeywordRule::browser_default()),
            );
        }

        Self {
            apps,
            keep_alive: [
                "vlc",
                "potplayer",
                "wmplayer",
                "spotify",
                "cloudmusic",
                "qqmusic",
                "wechat",
                "wechatappex",
                "qq",
                "dingtalk",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            browser_cpu_threshold: default_browser_cpu_threshold(),
            labels: default_labels(),
        }
    }
}

impl ClassificationTable {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let table: ClassificationTable =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: display,
                source,
            })?;
        Ok(table.normalized())
    }

    /// 归一化进程名，缺失的展示文案用默认值补齐
    pub fn normalized(self) -> Self {
        let mut labels = default_labels();
        labels.extend(self.labels);

        Self {
            apps: self
                .apps
                .into_iter()
                .map(|(name, rule)| (normalize_process_name(&name), rule))
                .collect(),
            keep_alive: self
                .keep_alive
                .iter()
                .map(|name| normalize_process_name(name))
                .collect(),
            browser_cpu_threshold: self.browser_cpu_threshold,
            labels,
        }
    }

    pub fn lookup(&self, process_name: &str) -> Option<&AppRule> {
        self.apps.get(&normalize_process_name(process_name))
    }

    /// 带标题规则的表项即浏览器
    pub fn is_browser(&self, process_name: &str) -> bool {
        matches!(self.lookup(process_name), Some(AppRule::Keywords(_)))
    }

    pub fn is_keep_alive(&self, process_name: &str) -> bool {
        let name = normalize_process_name(process_name);
        self.keep_alive.iter().any(|k| *k == name)
    }

    pub fn resolve(&self, foreground: Option<&ForegroundWindow>) -> Resolution {
        let Some(window) = foreground.filter(|w| !w.process_name.trim().is_empty()) else {
            return Resolution::Unresolved;
        };

        match self.lookup(&window.process_name) {
            Some(AppRule::Keywords(rule)) => Resolution::Matched(rule.evaluate(&window.title)),
            // 睡眠只能由空闲判定得出
            Some(AppRule::Fixed(StatusTag::IdleSleep)) => Resolution::Unresolved,
            Some(AppRule::Fixed(tag)) => Resolution::Matched(*tag),
            None => Resolution::Unrecognized,
        }
    }

    /// 生成上报内容；未知状态附带应用信息
    pub fn presence_update(
        &self,
        user_key: &str,
        tag: StatusTag,
        foreground: Option<&ForegroundWindow>,
    ) -> PresenceUpdate {
        let label = self.labels.get(&tag).cloned().unwrap_or_else(|| StatusLabel {
            name: format!("{:?}", tag),
            description: String::new(),
        });

        let description = if tag == StatusTag::Unknown {
            let app = match foreground {
                Some(w) if !w.title.is_empty() => format!("{} - {}", w.process_name, w.title),
                Some(w) => w.process_name.clone(),
                None => "未知应用".to_string(),
            };
            format!("{} ({})", label.description, app)
        } else {
            label.description
        };

        PresenceUpdate {
            user_key: user_key.to_string(),
            status_name: Some(label.name),
            description: Some(description),
            reported_online: Some(tag != StatusTag::IdleSleep),
        }
    }
}
