// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config as RedisPoolConfig, Pool, PoolConfig as DeadpoolConfig, Runtime};
use tracing::debug;

use crate::config::{PoolConfig, ServiceConfig};
use crate::error::ConfigError;
use crate::transport::{PrimaryTransport, TransportError};

/// Pushes payloads onto a Redis list with `RPUSH`.
///
/// Connections come from a pool and go back to it when the command finishes,
/// whatever its result. Broken connections are weeded out by the pool when it
/// recycles them on the next checkout.
#[derive(Clone)]
pub struct RedisTransport {
    pool: Pool,
}

impl RedisTransport {
    /// Builds the pool. No connection is opened until the first push.
    pub fn new(service: &ServiceConfig, pool: &PoolConfig) -> Result<Self, ConfigError> {
        let mut pool_config = DeadpoolConfig::new(pool.max_size);
        pool_config.timeouts.wait = Some(pool.wait_timeout);
        pool_config.timeouts.create = Some(pool.connect_timeout);
        pool_config.timeouts.recycle = Some(pool.connect_timeout);

        let mut config = RedisPoolConfig::from_url(format!("redis://{}", service.domain()));
        config.pool = Some(pool_config);

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ConfigError::Invalid(format!("failed to create redis pool: {e}")))?;
        Ok(RedisTransport { pool })
    }
}

impl std::fmt::Debug for RedisTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisTransport")
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

#[async_trait]
impl PrimaryTransport for RedisTransport {
    async fn push_right(&self, list_name: &str, payload: Bytes) -> Result<(), TransportError> {
        let mut connection = self
            .pool
            .get()
            .await
            .map_err(|e| TransportError::PrimaryUnavailable(e.to_string()))?;

        connection
            .rpush::<_, _, ()>(list_name, payload.as_ref())
            .await
            .map_err(|e| TransportError::PrimaryUnavailable(e.to_string()))?;

        debug!("Pushed {} bytes to list {list_name}", payload.len());
        Ok(())
    }
}
