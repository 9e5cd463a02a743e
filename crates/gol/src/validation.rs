// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Message validation.
//!
//! Checks run in a fixed order and the first failure is returned:
//!
//! 1. Required fields: `targets`, `data`, `sent_time`.
//! 2. Every target belongs to the declared target set.
//! 3. The routing rule of the message type.
//! 4. Communication messages: recipient, sender, access token, session,
//!    message id, platform, source.
//! 5. The intent, when present.
//!
//! Routing rules per type:
//!
//! | Type          | Forbidden targets            |
//! |---------------|------------------------------|
//! | system        | file, sentry, logstash       |
//! | communication | dashbot, chatbase, logstash  |
//! | audit         | anything but logstash/elastic|

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::message::{Intent, Message, MessageType, Target};

const SYSTEM_FORBIDDEN: &[Target] = &[Target::File, Target::Sentry, Target::Logstash];
const COMMUNICATION_FORBIDDEN: &[Target] = &[Target::Dashbot, Target::Chatbase, Target::Logstash];
const AUDIT_SINKS: &[Target] = &[Target::Logstash, Target::Elastic];

/// Validates `message` against every known target.
pub fn validate(message: &Message) -> Result<(), ValidationError> {
    validate_with(message, Target::ALL)
}

/// Validates `message`, accepting only targets listed in `declared`.
pub fn validate_with(message: &Message, declared: &[Target]) -> Result<(), ValidationError> {
    check_required(message)?;

    if let Some(target) = message.targets.iter().find(|t| !declared.contains(t)) {
        return Err(ValidationError::InvalidEnumValue {
            field: "targets",
            value: target.to_string(),
        });
    }

    match message.kind {
        MessageType::System => check_forbidden(message, SYSTEM_FORBIDDEN)?,
        MessageType::Communication => {
            check_forbidden(message, COMMUNICATION_FORBIDDEN)?;
            check_communication_fields(message)?;
        }
        MessageType::Audit => check_audit(message)?,
    }

    if let Some(intent) = &message.intent {
        check_intent(intent)?;
    }
    Ok(())
}

fn check_required(message: &Message) -> Result<(), ValidationError> {
    if message.targets.is_empty() {
        return Err(missing("targets"));
    }
    if message.data.is_null() {
        return Err(missing("data"));
    }
    if message.sent_time == DateTime::<Utc>::default() {
        return Err(missing("sent_time"));
    }
    Ok(())
}

fn check_forbidden(message: &Message, forbidden: &[Target]) -> Result<(), ValidationError> {
    if message.targets.iter().any(|t| forbidden.contains(t)) {
        return Err(ValidationError::RoutingRuleViolation { kind: message.kind });
    }
    Ok(())
}

fn check_audit(message: &Message) -> Result<(), ValidationError> {
    if message.targets.iter().all(|t| AUDIT_SINKS.contains(t)) {
        Ok(())
    } else {
        Err(ValidationError::RoutingRuleViolation { kind: message.kind })
    }
}

fn check_communication_fields(message: &Message) -> Result<(), ValidationError> {
    let identifiers = [
        ("recipient_id", &message.recipient_id),
        ("sender_id", &message.sender_id),
        ("access_token", &message.access_token),
        ("session_id", &message.session_id),
        ("message_id", &message.message_id),
    ];
    for (field, value) in identifiers {
        if value.as_deref().map_or(true, str::is_empty) {
            return Err(ValidationError::ConditionalFieldMissing(field));
        }
    }
    if message.platform.is_none() {
        return Err(ValidationError::ConditionalFieldMissing("platform"));
    }
    if message.source.is_none() {
        return Err(ValidationError::ConditionalFieldMissing("source"));
    }
    Ok(())
}

fn check_intent(intent: &Intent) -> Result<(), ValidationError> {
    if intent.name.is_empty() {
        return Err(missing("intent.name"));
    }
    for (i, input) in intent.inputs.iter().enumerate() {
        if input.name.is_empty() {
            return Err(missing(&format!("intent.inputs[{i}].name")));
        }
        if input.value.is_empty() {
            return Err(missing(&format!("intent.inputs[{i}].value")));
        }
    }
    Ok(())
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingRequiredField(field.to_string())
}
