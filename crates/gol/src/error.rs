// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy shared by the validator, the transports and the logger.

use crate::message::MessageType;
use crate::transport::TransportError;

/// Reasons a message is rejected before any delivery is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("invalid value for {field}: {value}")]
    InvalidEnumValue { field: &'static str, value: String },

    #[error("the target is not valid for: {kind} type")]
    RoutingRuleViolation { kind: MessageType },

    #[error("missing field required by communication type: {0}")]
    ConditionalFieldMissing(&'static str),
}

/// The validated message could not be encoded to its JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to serialize message: {0}")]
pub struct SerializationError(pub String);

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError(err.to_string())
    }
}

/// Raised while loading or validating a [`crate::config::LoggerConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Error returned to the caller of [`crate::logger::Logger::log`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("message was not delivered: {0}")]
    Undelivered(#[source] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ValidationError::RoutingRuleViolation {
            kind: MessageType::Audit,
        };
        assert_eq!(error.to_string(), "the target is not valid for: audit type");

        let error = ValidationError::ConditionalFieldMissing("recipient_id");
        assert_eq!(
            error.to_string(),
            "missing field required by communication type: recipient_id"
        );

        let error = ConfigError::MissingField("list_name");
        assert_eq!(
            error.to_string(),
            "missing required configuration field: list_name"
        );
    }

    #[test]
    fn test_undelivered_keeps_source() {
        let error = LogError::Undelivered(TransportError::PrimaryUnavailable(
            "connection refused".to_string(),
        ));
        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("primary store unavailable: connection refused")
        );
    }
}
