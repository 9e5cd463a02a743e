// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::ConfigError;
use crate::tls;
use crate::transport::{SecondaryTransport, TransportError};

/// Posts payloads to the HTTPS log service. Only `200 OK` counts as delivered.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    uri: String,
}

impl HttpTransport {
    pub fn new(service: &ServiceConfig, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self::with_client(tls::build_client(timeout)?, service.uri()))
    }

    /// Uses an existing client against an explicit URI.
    #[must_use]
    pub fn with_client(client: reqwest::Client, uri: impl Into<String>) -> Self {
        HttpTransport {
            client,
            uri: uri.into(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[async_trait]
impl SecondaryTransport for HttpTransport {
    async fn post(&self, payload: Bytes) -> Result<(), TransportError> {
        let size = payload.len();
        let response = self
            .client
            .post(&self.uri)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| TransportError::SecondaryUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                debug!("Posted {size} bytes to {}", self.uri);
                Ok(())
            }
            status => Err(TransportError::SecondaryUnavailable(format!(
                "{status}: the logger could not communicate with log service"
            ))),
        }
    }
}
