use std::{future::Future, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisResult, Script};

/// Key/value operations shared by the dish cache and the rate limiter.
/// Each call must be atomic on its own; nothing here spans two commands.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()>;
    /// Increments the counter at `key` and arms `window` as its expiry when
    /// the increment created it. Returns the new count.
    async fn incr_window(&self, key: &str, window: Duration) -> anyhow::Result<u64>;
    /// Remaining lifetime in whole seconds, `None` if the key is gone or never expires.
    async fn ttl(&self, key: &str) -> anyhow::Result<Option<u64>>;
}

const INCR_WINDOW_LUA: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

pub struct RedisStore {
    conn: ConnectionManager,
    op_timeout: Duration,
    incr_window: Script,
}

impl RedisStore {
    pub async fn connect(url: &str, op_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::open(url).context("parse redis url")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("connect to redis")?;
        Ok(Self {
            conn,
            op_timeout,
            incr_window: Script::new(INCR_WINDOW_LUA),
        })
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> anyhow::Result<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .with_context(|| format!("redis {op} timed out after {:?}", self.op_timeout))?
            .with_context(|| format!("redis {op}"))
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut conn = self.conn.clone();
        self.bounded("GET", conn.get(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => {
                self.bounded("SETEX", conn.set_ex(key, value, ttl.as_secs().max(1)))
                    .await
            }
            None => self.bounded("SET", conn.set(key, value)).await,
        }
    }

    async fn incr_window(&self, key: &str, window: Duration) -> anyhow::Result<u64> {
        let mut conn = self.conn.clone();
        let mut invocation = self.incr_window.key(key);
        invocation.arg(window.as_secs().max(1));
        let count: i64 = self
            .bounded("INCR", invocation.invoke_async(&mut conn))
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn ttl(&self, key: &str) -> anyhow::Result<Option<u64>> {
        let mut conn = self.conn.clone();
        let secs: i64 = self.bounded("TTL", conn.ttl(key)).await?;
        // -2: no such key, -1: no expiry
        Ok((secs >= 0).then_some(secs as u64))
    }
}
