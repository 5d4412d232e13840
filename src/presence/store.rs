use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use redis::Client as RedisClient;
use tokio::sync::RwLock;

use super::history::TransitionHistory;
use super::record::{PresenceRecord, PresenceUpdate, UserProfile};
use super::resolver::{DisplayedPresence, resolve};
use crate::cache::PresenceCacheOperations;
use crate::config::Config;
use crate::utils::secret_matches;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("shared secret rejected")]
    BadAuth,
    #[error("unknown user key: {0}")]
    UnknownKey(String),
    #[error("presence persistence failed: {0}")]
    Persistence(#[from] redis::RedisError),
}

/// 在线状态存储。
///
/// 用户集合在打开时确定，之后只修改记录内容，不增删键。每个键一把读写锁：
/// 不同键的写入互不阻塞，同一键的写入按到达顺序串行，读者只会看到完整写入后的记录。
pub struct PresenceStore {
    secret: String,
    missing_threshold: Duration,
    profiles: Vec<UserProfile>,
    slots: HashMap<String, RwLock<PresenceRecord>>,
    history: TransitionHistory,
    mirror: Option<PresenceCacheOperations>,
}

impl PresenceStore {
    /// 仅内存的存储，记录以默认值初始化
    pub fn open_in_memory(config: &Config, now: DateTime<Utc>) -> Self {
        let slots = config
            .users
            .iter()
            .map(|p| (p.key.clone(), RwLock::new(p.initial_record(now))))
            .collect();

        Self {
            secret: config.shared_secret.clone(),
            missing_threshold: config.missing_threshold(),
            profiles: config.users.clone(),
            slots,
            history: TransitionHistory::new(config.history_limit),
            mirror: None,
        }
    }

    /// 挂上 Redis 镜像，不做恢复
    pub fn with_mirror(mut self, mirror: PresenceCacheOperations) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// 按配置打开存储；设置了 `REDIS_URL` 时从 Redis 恢复记录并镜像后续写入
    pub async fn open(config: &Config, now: DateTime<Utc>) -> Result<Self, StoreError> {
        let mut store = Self::open_in_memory(config, now);

        let Some(url) = &config.redis_url else {
            tracing::info!("Presence store opened in memory only");
            return Ok(store);
        };

        let mirror = PresenceCacheOperations::new(
            Arc::new(RedisClient::open(url.as_str())?),
            config.redis_timeout,
        );
        for profile in &store.profiles {
            match mirror.load_record(&profile.key).await? {
                Some(record) if record.user_key == profile.key => {
                    tracing::info!(
                        "Restored presence for {} (last update {})",
                        profile.key,
                        record.last_update
                    );
                    if let Some(slot) = store.slots.get_mut(&profile.key) {
                        *slot.get_mut() = record;
                    }
                }
                Some(record) => {
                    tracing::warn!(
                        "Ignoring mirrored record for {} stored under {}",
                        record.user_key,
                        profile.key
                    );
                }
                None => {}
            }
        }

        store.mirror = Some(mirror);
        tracing::info!("Presence store opened with Redis mirror");
        Ok(store)
    }

    /// 关闭前把所有记录再写一次镜像
    pub async fn close(&self) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        for profile in &self.profiles {
            if let Some(slot) = self.slots.get(&profile.key) {
                let record = slot.read().await;
                if let Err(e) = mirror.save_record(&record).await {
                    tracing::error!("Failed to flush presence for {}: {}", profile.key, e);
                }
            }
        }
        tracing::info!("Presence store closed");
    }

    /// 原子地读-改-写一条记录，`received_at` 为服务端接收时间
    pub async fn upsert(
        &self,
        secret: &str,
        update: &PresenceUpdate,
        received_at: DateTime<Utc>,
    ) -> Result<PresenceRecord, StoreError> {
        if !secret_matches(&self.secret, secret) {
            return Err(StoreError::BadAuth);
        }

        let slot = self
            .slots
            .get(&update.user_key)
            .ok_or_else(|| StoreError::UnknownKey(update.user_key.clone()))?;

        let mut record = slot.write().await;
        let previous_name = record.status_name.clone();
        record.apply(update, received_at);

        if record.status_name != previous_name {
            self.history.record(&record);
        }

        // 持锁写镜像，保证镜像顺序与接收顺序一致；单次写入受超时限制
        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.save_record(&record).await {
                tracing::error!("Failed to mirror presence for {}: {}", record.user_key, e);
            }
        }

        Ok(record.clone())
    }

    pub async fn get(&self, user_key: &str) -> Option<PresenceRecord> {
        match self.slots.get(user_key) {
            Some(slot) => Some(slot.read().await.clone()),
            None => None,
        }
    }

    pub fn profile(&self, user_key: &str) -> Option<&UserProfile> {
        self.profiles.iter().find(|p| p.key == user_key)
    }

    pub fn profiles(&self) -> &[UserProfile] {
        &self.profiles
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    pub fn missing_threshold(&self) -> Duration {
        self.missing_threshold
    }

    pub async fn resolve(&self, user_key: &str, now: DateTime<Utc>) -> DisplayedPresence {
        match self.profile(user_key) {
            Some(profile) => {
                let record = self.get(user_key).await;
                resolve(profile, record.as_ref(), now, self.missing_threshold)
            }
            None => DisplayedPresence::unknown_user(user_key),
        }
    }

    /// 按配置顺序解析全部用户
    pub async fn resolve_all(&self, now: DateTime<Utc>) -> Vec<DisplayedPresence> {
        join_all(self.profiles.iter().map(|p| self.resolve(&p.key, now))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const SECRET: &str = "my_love_secret_2024";

    fn store() -> PresenceStore {
        PresenceStore::open_in_memory(&Config::with_secret(SECRET), Utc::now())
    }

    fn update(user: &str, name: &str, description: &str) -> PresenceUpdate {
        PresenceUpdate {
            user_key: user.into(),
            status_name: Some(name.into()),
            description: Some(description.into()),
            reported_online: Some(true),
        }
    }

    #[tokio::test]
    async fn creates_default_record_per_known_user() {
        let store = store();

        let mutou = store.get("mutou").await.unwrap();
        assert_eq!(mutou.status_name, "安睡");
        assert!(!mutou.reported_online);
        assert!(store.get("qianyu").await.is_some());
        assert!(store.get("ghost_user").await.is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_key_without_creating_it() {
        let store = store();

        let result = store
            .upsert(SECRET, &update("ghost_user", "游戏", ""), Utc::now())
            .await;

        assert!(matches!(result, Err(StoreError::UnknownKey(key)) if key == "ghost_user"));
        assert!(store.get("ghost_user").await.is_none());
    }

    #[tokio::test]
    async fn rejects_bad_secret_before_touching_record() {
        let store = store();
        let before = store.get("mutou").await.unwrap();

        let result = store
            .upsert("wrong", &update("mutou", "游戏", "Steam启动！"), Utc::now())
            .await;

        assert!(matches!(result, Err(StoreError::BadAuth)));
        assert_eq!(store.get("mutou").await.unwrap(), before);
    }

    #[tokio::test]
    async fn bad_secret_wins_over_unknown_key() {
        let store = store();

        let result = store
            .upsert("wrong", &update("ghost_user", "游戏", ""), Utc::now())
            .await;

        assert!(matches!(result, Err(StoreError::BadAuth)));
    }

    #[tokio::test]
    async fn partial_update_preserves_name_and_description() {
        let store = store();
        let now = Utc::now();
        store
            .upsert(SECRET, &update("mutou", "勤勉", "正在写代码改变世界..."), now)
            .await
            .unwrap();

        let offline = PresenceUpdate {
            user_key: "mutou".into(),
            reported_online: Some(false),
            ..Default::default()
        };
        let record = store
            .upsert(SECRET, &offline, now + ChronoDuration::seconds(1))
            .await
            .unwrap();

        assert_eq!(record.status_name, "勤勉");
        assert_eq!(record.status_description, "正在写代码改变世界...");
        assert!(!record.reported_online);
    }

    #[tokio::test]
    async fn history_records_only_name_changes() {
        let store = store();
        let now = Utc::now();
        store
            .upsert(SECRET, &update("mutou", "游戏", "a"), now)
            .await
            .unwrap();
        store
            .upsert(SECRET, &update("mutou", "游戏", "b"), now)
            .await
            .unwrap();
        store
            .upsert(SECRET, &update("mutou", "听歌", "c"), now)
            .await
            .unwrap();

        let names: Vec<_> = store
            .history()
            .recent(Some("mutou"), 10)
            .into_iter()
            .map(|e| e.status_name)
            .collect();
        assert_eq!(names, vec!["游戏", "听歌"]);
    }

    #[tokio::test]
    async fn resolve_applies_missing_threshold() {
        let store = store();
        let written = Utc::now();
        store
            .upsert(SECRET, &update("qianyu", "游戏", "原神，启动！"), written)
            .await
            .unwrap();

        let fresh = store
            .resolve("qianyu", written + ChronoDuration::seconds(599))
            .await;
        let stale = store
            .resolve("qianyu", written + ChronoDuration::seconds(601))
            .await;

        assert_eq!(fresh.name, "游戏");
        assert!(stale.missing);
        assert_eq!(stale.description, "正在想念木头...");
        assert_eq!(store.resolve_all(written).await.len(), 2);
    }

    #[tokio::test]
    async fn unresponsive_mirror_does_not_block_readers() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let client = RedisClient::open(format!("redis://{addr}").as_str()).unwrap();
        let store = Arc::new(store().with_mirror(PresenceCacheOperations::new(
            Arc::new(client),
            std::time::Duration::from_millis(200),
        )));
        let now = Utc::now();

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .upsert(SECRET, &update("mutou", "游戏", "Steam启动！"), now)
                    .await
            })
        };
        tokio::task::yield_now().await;

        let shown = tokio::time::timeout(
            std::time::Duration::from_secs(3),
            store.resolve("mutou", now),
        )
        .await
        .expect("read should not wait on the mirror");
        assert_eq!(shown.user, "mutou");

        let written = tokio::time::timeout(std::time::Duration::from_secs(3), writer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(written.unwrap().status_name, "游戏");
        assert_eq!(store.get("mutou").await.unwrap().status_name, "游戏");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_never_mix_fields() {
        let store = Arc::new(store());
        let now = Utc::now();

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let payload = PresenceUpdate {
                        user_key: "mutou".into(),
                        status_name: Some(format!("name-{i}")),
                        description: Some(format!("desc-{i}")),
                        reported_online: Some(i % 2 == 0),
                    };
                    store.upsert(SECRET, &payload, now).await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let record = store.get("mutou").await.unwrap();
        let index: usize = record
            .status_name
            .strip_prefix("name-")
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(index < 100);
        assert_eq!(record.status_description, format!("desc-{index}"));
        assert_eq!(record.reported_online, index % 2 == 0);
    }
}
