// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Remote delivery tiers.
//!
//! Both transports are thin: they make exactly one attempt per call and fold
//! every failure into a single [`TransportError`] variant per tier. Falling
//! through to the next tier is the logger's job.

pub mod http;
pub mod redis;

use async_trait::async_trait;
use bytes::Bytes;

pub use self::http::HttpTransport;
pub use self::redis::RedisTransport;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("primary store unavailable: {0}")]
    PrimaryUnavailable(String),

    #[error("log service unavailable: {0}")]
    SecondaryUnavailable(String),
}

/// Appends payloads to a named list in the primary store.
#[async_trait]
pub trait PrimaryTransport: Send + Sync {
    async fn push_right(&self, list_name: &str, payload: Bytes) -> Result<(), TransportError>;
}

/// Posts payloads to the log service.
#[async_trait]
pub trait SecondaryTransport: Send + Sync {
    async fn post(&self, payload: Bytes) -> Result<(), TransportError>;
}
