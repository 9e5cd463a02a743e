// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The delivery pipeline.
//!
//! ```text
//!   Validate ──> Serialize ──> Primary (Redis RPUSH)
//!      │             │             │ failed
//!      │             │             v
//!      │             │         Secondary (HTTPS POST, if configured)
//!      │             │             │ failed / not configured
//!      v             v             v
//!   ┌──────────────────────────────────┐
//!   │ Fallback sinks, in registration  │
//!   │ order, one Diagnostic each       │
//!   └──────────────────────────────────┘
//! ```
//!
//! Tiers run one after the other inside the caller's task; the secondary is
//! only tried once the primary has failed. How failures reach the caller is
//! decided once per logger by [`DeliveryMode`].

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::config::{DeliveryMode, LoggerConfig};
use crate::error::{ConfigError, LogError};
use crate::fallback::{Diagnostic, FallbackSink, Payload, Stage};
use crate::message::Message;
use crate::transport::{
    HttpTransport, PrimaryTransport, RedisTransport, SecondaryTransport, TransportError,
};
use crate::validation;

/// Remote tier that accepted a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Secondary,
}

/// Result of a successful [`Logger::log`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Delivered(Tier),
    /// Not delivered; the fallback sinks received a diagnostic for `stage`.
    Diverted { stage: Stage },
}

#[derive(Clone)]
pub struct Logger {
    config: Arc<LoggerConfig>,
    primary: Arc<dyn PrimaryTransport>,
    secondary: Option<Arc<dyn SecondaryTransport>>,
    sinks: Vec<Arc<dyn FallbackSink>>,
}

impl Logger {
    /// Validates `config` and connects the Redis pool and, when configured, the log service.
    pub fn new(
        config: LoggerConfig,
        sinks: Vec<Arc<dyn FallbackSink>>,
    ) -> Result<Logger, ConfigError> {
        config.validate()?;

        let primary = RedisTransport::new(&config.redis, &config.pool)?;
        let secondary = match &config.log_service {
            Some(service) => Some(Arc::new(HttpTransport::new(service, config.http_timeout)?)
                as Arc<dyn SecondaryTransport>),
            None => None,
        };

        Ok(Logger {
            config: Arc::new(config),
            primary: Arc::new(primary),
            secondary,
            sinks,
        })
    }

    /// Builds a logger around caller-provided transports.
    ///
    /// `config.redis` and `config.log_service` are still validated but not used.
    pub fn with_transports(
        config: LoggerConfig,
        primary: Arc<dyn PrimaryTransport>,
        secondary: Option<Arc<dyn SecondaryTransport>>,
        sinks: Vec<Arc<dyn FallbackSink>>,
    ) -> Result<Logger, ConfigError> {
        config.validate()?;
        Ok(Logger {
            config: Arc::new(config),
            primary,
            secondary,
            sinks,
        })
    }

    #[must_use]
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Validates `message` and delivers it through the first tier that accepts it.
    pub async fn log(&self, message: &Message) -> Result<Outcome, LogError> {
        if let Err(err) = validation::validate_with(message, &self.config.targets) {
            debug!("Rejected {} message: {err}", message.kind);
            if !self.absorbs() {
                return Err(err.into());
            }
            return self.divert(
                Stage::Validate,
                err.into(),
                Some(Payload::Message(Box::new(message.clone()))),
            );
        }

        let payload = match message.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                return self.divert(
                    Stage::Serialize,
                    err.into(),
                    Some(Payload::Message(Box::new(message.clone()))),
                )
            }
        };

        let (stage, err) = match self.deliver(payload.clone()).await {
            Ok(tier) => return Ok(Outcome::Delivered(tier)),
            Err(failure) => failure,
        };
        self.divert(
            stage,
            LogError::Undelivered(err),
            Some(Payload::Serialized(payload)),
        )
    }

    async fn deliver(&self, payload: Bytes) -> Result<Tier, (Stage, TransportError)> {
        let primary_err = match self
            .primary
            .push_right(&self.config.list_name, payload.clone())
            .await
        {
            Ok(()) => {
                debug!("Delivered message to list {}", self.config.list_name);
                return Ok(Tier::Primary);
            }
            Err(err) => err,
        };

        let Some(secondary) = &self.secondary else {
            return Err((Stage::Primary, primary_err));
        };
        warn!("{primary_err}, falling back to the log service");

        match secondary.post(payload).await {
            Ok(()) => {
                debug!("Delivered message to the log service");
                Ok(Tier::Secondary)
            }
            Err(err) => Err((Stage::Secondary, err)),
        }
    }

    /// Hands the failure to every sink, then reports it according to the delivery mode.
    fn divert(
        &self,
        stage: Stage,
        error: LogError,
        payload: Option<Payload>,
    ) -> Result<Outcome, LogError> {
        if self.sinks.is_empty() {
            error!("Log message dropped at {stage}: {error}");
            return Err(error);
        }

        let diagnostic = Diagnostic {
            stage,
            error,
            payload,
        };
        for sink in &self.sinks {
            sink.report(&diagnostic);
        }

        if self.absorbs() {
            Ok(Outcome::Diverted { stage })
        } else {
            Err(diagnostic.error)
        }
    }

    fn absorbs(&self) -> bool {
        self.config.mode == DeliveryMode::Absorb && !self.sinks.is_empty()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .field("secondary", &self.secondary.is_some())
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}
