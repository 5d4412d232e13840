use crate::cache::keys::presence_record_key;
use crate::cache::models::CachedPresenceRecord;
use crate::presence::PresenceRecord;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client as RedisClient, RedisError, RedisResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// 在线状态缓存操作
pub struct PresenceCacheOperations {
    redis_client: Arc<RedisClient>,
    // 复用的多路复用连接，出错后丢弃并在下次重建
    connection: Mutex<Option<MultiplexedConnection>>,
    timeout: Duration,
}

impl PresenceCacheOperations {
    /// 创建新的在线状态缓存操作实例，`timeout` 限制每次读写（含建连）的总时长
    pub fn new(redis_client: Arc<RedisClient>, timeout: Duration) -> Self {
        Self {
            redis_client,
            connection: Mutex::new(None),
            timeout,
        }
    }

    async fn connection(&self) -> RedisResult<MultiplexedConnection> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.redis_client.get_multiplexed_async_connection().await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// 带超时执行一次操作，失败或超时后丢弃连接
    async fn bounded<T>(&self, op: impl Future<Output = RedisResult<T>>) -> RedisResult<T> {
        let result = match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(RedisError::from((
                redis::ErrorKind::IoError,
                "Redis operation timed out",
                format!("{:?}", self.timeout),
            ))),
        };
        if result.is_err() {
            if let Ok(mut slot) = self.connection.try_lock() {
                *slot = None;
            }
        }
        result
    }

    /// 保存一条记录（不过期）
    pub async fn save_record(&self, record: &PresenceRecord) -> RedisResult<()> {
        let cached = CachedPresenceRecord::from(record);
        let json = serde_json::to_string(&cached).map_err(|e| {
            RedisError::from((
                redis::ErrorKind::IoError,
                "Serialization error",
                e.to_string(),
            ))
        })?;
        let key = presence_record_key(&record.user_key);

        self.bounded(async {
            let mut conn = self.connection().await?;
            let _: () = conn.set(key, json).await?;
            Ok(())
        })
        .await
    }

    /// 读取一条记录，无法解析的内容视为不存在
    pub async fn load_record(&self, user_key: &str) -> RedisResult<Option<PresenceRecord>> {
        let result: Option<String> = self
            .bounded(async {
                let mut conn = self.connection().await?;
                conn.get(presence_record_key(user_key)).await
            })
            .await?;

        Ok(result.and_then(|json| {
            match serde_json::from_str::<CachedPresenceRecord>(&json) {
                Ok(cached) => Some(PresenceRecord::from(cached)),
                Err(e) => {
                    tracing::warn!("Discarding unreadable presence record for {}: {}", user_key, e);
                    None
                }
            }
        }))
    }
}
