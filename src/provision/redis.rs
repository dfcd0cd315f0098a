//! # Cache Connectivity
//!
//! PING-based connectivity verification for RedisConnection resources.

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Open a connection and issue a PING; any failure is a connectivity error.
pub async fn check_connection(config: &CacheConfig) -> Result<()> {
    let info = ConnectionInfo {
        addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
        redis: RedisConnectionInfo {
            username: config.username.clone(),
            password: config.password.clone(),
            ..Default::default()
        },
    };
    let client =
        redis::Client::open(info).map_err(|e| Error::Connectivity(format!("redis client: {e}")))?;
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| Error::Connectivity(format!("redis connect: {e}")))?;
    let reply: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| Error::Connectivity(format!("redis ping: {e}")))?;
    if reply != "PONG" {
        return Err(Error::Connectivity(format!(
            "unexpected ping reply: {reply}"
        )));
    }
    Ok(())
}
