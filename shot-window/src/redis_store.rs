use std::fmt;

use async_trait::async_trait;
use redis::aio::ConnectionLike;
use redis::aio::MultiplexedConnection;
use tracing::debug;
use tracing::info;

use crate::StoreError;
use crate::store::WindowStore;

/// Connection settings for a [`RedisStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisStoreConfig {
    /// `redis[s]://[[username][:password]@][host][:port][/db-number]`
    pub url: String,
}

impl RedisStoreConfig {
    /// Environment variable consulted by [`RedisStoreConfig::from_env`].
    pub const URL_ENV: &'static str = "SHOT_WINDOW_REDIS_URL";

    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Read the url from `SHOT_WINDOW_REDIS_URL`, falling back to a local server.
    pub fn from_env() -> Self {
        std::env::var(Self::URL_ENV)
            .map(Self::new)
            .unwrap_or_default()
    }
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self::new("redis://127.0.0.1:6379")
    }
}

/// A [`WindowStore`] backed by Redis.
///
/// Each increment runs as a single `MULTI`/`EXEC` transaction of
/// `SET key 0 PX window NX`, `INCRBY key weight` and `PTTL key`, so every
/// process sharing the server sees one consistent counter per key.
///
/// The connection is cloned for each request. Reconnection and retry policy
/// belong to the connection type chosen by the caller (e.g.
/// [`redis::aio::ConnectionManager`]).
#[derive(Clone)]
pub struct RedisStore<C = MultiplexedConnection> {
    conn: C,
}

impl<C> fmt::Debug for RedisStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore<MultiplexedConnection> {
    /// Open a multiplexed connection to the configured server.
    pub async fn connect(config: &RedisStoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!(url = %config.url, "connected to redis");
        Ok(Self::new(conn))
    }
}

impl<C> RedisStore<C>
where
    C: ConnectionLike + Clone + Send + Sync,
{
    /// Use an existing connection.
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> WindowStore for RedisStore<C>
where
    C: ConnectionLike + Clone + Send + Sync,
{
    async fn incr_window(
        &self,
        key: &str,
        weight: i64,
        window_ms: i64,
    ) -> Result<(i64, i64), StoreError> {
        let mut conn = self.conn.clone();
        let (value, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("PX")
            .arg(window_ms)
            .arg("NX")
            .ignore()
            .cmd("INCRBY")
            .arg(key)
            .arg(weight)
            .cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        debug!(key, value, ttl, "incr_window replies");
        Ok((value, ttl))
    }

    async fn rearm(&self, key: &str, window_ms: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let applied: bool = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(window_ms)
            .query_async(&mut conn)
            .await?;
        debug!(key, window_ms, applied, "rearm reply");
        Ok(())
    }

    async fn snapshot(&self, key: &str) -> Result<(Option<String>, i64), StoreError> {
        let mut conn = self.conn.clone();
        let (value, ttl): (Option<String>, i64) = redis::pipe()
            .atomic()
            .cmd("GET")
            .arg(key)
            .cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        debug!(key, ?value, ttl, "snapshot replies");
        Ok((value, ttl))
    }
}
