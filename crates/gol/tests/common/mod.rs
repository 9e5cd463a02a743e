// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for the cascade integration tests.

use gol::{
    Diagnostic, FallbackSink, LoggerConfig, Message, MessageType, PoolConfig, RedisTransport,
    ServiceConfig, Target,
};
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

/// Sink that keeps every diagnostic it receives.
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    #[allow(clippy::unwrap_used)]
    pub fn reports(&self) -> Vec<Diagnostic> {
        self.reports.lock().unwrap().clone()
    }
}

impl FallbackSink for RecordingSink {
    #[allow(clippy::unwrap_used)]
    fn report(&self, diagnostic: &Diagnostic) {
        self.reports.lock().unwrap().push(diagnostic.clone());
    }
}

/// A Redis address nothing listens on.
pub fn unreachable_redis() -> ServiceConfig {
    ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        path: String::new(),
    }
}

pub fn config() -> LoggerConfig {
    LoggerConfig {
        list_name: "chat-logs".to_string(),
        redis: unreachable_redis(),
        pool: PoolConfig {
            max_size: 4,
            wait_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(500),
        },
        ..LoggerConfig::default()
    }
}

#[allow(clippy::unwrap_used)]
pub fn unreachable_primary(config: &LoggerConfig) -> RedisTransport {
    RedisTransport::new(&config.redis, &config.pool).unwrap()
}

pub fn system_message() -> Message {
    Message::new(
        MessageType::System,
        vec![Target::Dashbot],
        json!({"event": "deploy", "version": "1.4.2"}),
    )
}
