// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Local fallback sinks.
//!
//! Sinks are the last tier of the cascade: they receive a [`Diagnostic`] when a
//! message could not be delivered anywhere else. Reporting is fire-and-forget,
//! a sink that fails to record a diagnostic only logs about it.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::error::LogError;
use crate::message::Message;

/// Pipeline stage a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validate,
    Serialize,
    Primary,
    Secondary,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Serialize => "serialize",
            Stage::Primary => "send_primary",
            Stage::Secondary => "send_secondary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the sink gets to inspect offline.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The encoded message, as it would have been sent.
    Serialized(Bytes),
    /// The message itself, when it never made it to the wire format.
    Message(Box<Message>),
}

impl Payload {
    /// JSON view of the payload. Bytes that are not JSON are kept as a lossy string.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Payload::Serialized(bytes) => serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
            Payload::Message(message) => serde_json::to_value(message).unwrap_or(Value::Null),
        }
    }
}

/// Record handed to every fallback sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Last stage that failed.
    pub stage: Stage,
    pub error: LogError,
    pub payload: Option<Payload>,
}

impl Diagnostic {
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "stage": self.stage.as_str(),
            "error": self.error.to_string(),
            "payload": self.payload.as_ref().map_or(Value::Null, Payload::to_value),
        })
    }
}

pub trait FallbackSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

impl<F> FallbackSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: &Diagnostic) {
        self(diagnostic);
    }
}

/// Emits diagnostics as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl FallbackSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        let payload = diagnostic
            .payload
            .as_ref()
            .map(|p| p.to_value().to_string())
            .unwrap_or_default();
        error!(
            stage = %diagnostic.stage,
            error = %diagnostic.error,
            payload_bytes = payload.len(),
            %payload,
            "Log message was not delivered"
        );
    }
}

/// Appends each diagnostic as one JSON line to a writer.
///
/// Writes are synchronous and block the task calling [`crate::Logger::log`].
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl JsonLinesSink<File> {
    /// Opens `path` for appending, creating it if needed.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the writer, or `None` if a previous write panicked while holding it.
    pub fn into_inner(self) -> Option<W> {
        self.writer.into_inner().ok()
    }
}

impl<W: Write + Send> FallbackSink for JsonLinesSink<W> {
    fn report(&self, diagnostic: &Diagnostic) {
        let mut line = match serde_json::to_vec(&diagnostic.to_json()) {
            Ok(line) => line,
            Err(e) => {
                debug!("Failed to encode diagnostic: {e}");
                return;
            }
        };
        line.push(b'\n');

        let Ok(mut writer) = self.writer.lock() else {
            debug!("Dropping diagnostic: sink writer is poisoned");
            return;
        };
        if let Err(e) = writer.write_all(&line).and_then(|()| writer.flush()) {
            debug!("Failed to write diagnostic: {e}");
        }
    }
}
