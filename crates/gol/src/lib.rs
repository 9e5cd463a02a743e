// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # gol
//!
//! Client for shipping structured log messages.
//!
//! A [`Message`] is validated against the rules of its type, encoded to JSON
//! and pushed to a Redis list. When Redis cannot be reached the payload is
//! posted to an HTTPS log service instead, and when that fails too every
//! registered [`FallbackSink`] receives a [`Diagnostic`].
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gol::{Logger, LoggerConfig, Message, MessageType, Target, TracingSink};
//!
//! let config = LoggerConfig::load(None)?;
//! let logger = Logger::new(config, vec![Arc::new(TracingSink)])?;
//! let message = Message::new(MessageType::System, vec![Target::Dashbot], "started".into());
//! logger.log(&message).await?;
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod error;
pub mod fallback;
pub mod logger;
pub mod message;
pub mod tls;
pub mod transport;
pub mod validation;

pub use config::{DeliveryMode, LoggerConfig, PoolConfig, ServiceConfig};
pub use error::{ConfigError, LogError, SerializationError, ValidationError};
pub use fallback::{Diagnostic, FallbackSink, JsonLinesSink, Payload, Stage, TracingSink};
pub use logger::{Logger, Outcome, Tier};
pub use message::{Input, Intent, Message, MessageType, Platform, RawMessage, Source, Target};
pub use transport::{
    HttpTransport, PrimaryTransport, RedisTransport, SecondaryTransport, TransportError,
};
pub use validation::{validate, validate_with};
