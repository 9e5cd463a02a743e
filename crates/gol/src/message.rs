// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The log message entity and its closed enumerations.
//!
//! A [`Message`] is what callers hand to the logger. Its JSON form is the
//! payload pushed to the primary store and posted to the log service, so the
//! field names below are a wire contract:
//!
//! ```text
//! type, source, platform, targets, recipient_id, sender_id, access_token,
//! session_id, message_id, sent_time, data, intent, not_handled, version
//! ```
//!
//! Absent optional fields are omitted from the payload. Fields are emitted in
//! declaration order and `data` objects keep sorted keys, so encoding the same
//! message twice yields identical bytes.
//!
//! [`RawMessage`] is the loosely typed twin used when messages arrive as JSON
//! text: every enumerated field is a plain string and every required field is
//! optional, so that conversion can report exactly which field is absent or
//! holds an unknown value.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SerializationError, ValidationError};

/// Declares a closed string enumeration with its wire names, a constant table of
/// all members and a `FromStr` that reports unknown values against `$field`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $value)] $variant,)+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(ValidationError::InvalidEnumValue {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// The delivery contract a message belongs to.
    MessageType, "type" {
        /// Infrastructure events.
        System => "system",
        /// Conversation traffic between a user and a chat platform.
        Communication => "communication",
        /// Security relevant events, only ever routed to the audit sink.
        Audit => "audit",
    }
}

string_enum! {
    /// Downstream sink a message is meant for.
    Target, "targets" {
        Dashbot => "dashbot",
        Chatbase => "chatbase",
        Logstash => "logstash",
        /// Older name of the audit sink, still accepted wherever `logstash` is.
        Elastic => "elastic",
        Sentry => "sentry",
        File => "file",
    }
}

string_enum! {
    /// Direction of a communication message.
    Source, "source" {
        Incoming => "incoming",
        Outgoing => "outgoing",
    }
}

string_enum! {
    /// Messaging platform a communication message travelled through.
    Platform, "platform" {
        Web => "web",
        Messenger => "messenger",
        Telegram => "telegram",
        Slack => "slack",
        Line => "line",
        Viber => "viber",
        Skype => "skype",
        Kik => "kik",
        Alexa => "alexa",
        GoogleAssistant => "google_assistant",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Intent {
    pub name: String,
    pub inputs: Vec<Input>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    pub name: String,
    pub value: String,
}

/// A single log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    pub targets: Vec<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub sent_time: DateTime<Utc>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub not_handled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Message {
    /// Creates a message stamped with the current time and no optional fields set.
    #[must_use]
    pub fn new(kind: MessageType, targets: Vec<Target>, data: Value) -> Self {
        Message {
            kind,
            source: None,
            platform: None,
            targets,
            recipient_id: None,
            sender_id: None,
            access_token: None,
            session_id: None,
            message_id: None,
            sent_time: Utc::now(),
            data,
            intent: None,
            not_handled: false,
            version: None,
        }
    }

    /// Encodes the message to the payload sent over the wire.
    pub fn to_payload(&self) -> Result<Bytes, SerializationError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

/// Loosely typed message as it may arrive from JSON input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawMessage {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub source: Option<String>,
    pub platform: Option<String>,
    pub targets: Vec<String>,
    pub recipient_id: Option<String>,
    pub sender_id: Option<String>,
    pub access_token: Option<String>,
    pub session_id: Option<String>,
    pub message_id: Option<String>,
    pub sent_time: Option<DateTime<Utc>>,
    pub data: Value,
    pub intent: Option<Intent>,
    pub not_handled: bool,
    pub version: Option<String>,
}

impl TryFrom<RawMessage> for Message {
    type Error = ValidationError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let kind = match raw.kind.as_deref() {
            None | Some("") => {
                return Err(ValidationError::MissingRequiredField("type".to_string()))
            }
            Some(kind) => kind.parse::<MessageType>()?,
        };
        let source = parse_optional::<Source>(raw.source.as_deref())?;
        let platform = parse_optional::<Platform>(raw.platform.as_deref())?;
        let targets = raw
            .targets
            .iter()
            .map(|target| target.parse::<Target>())
            .collect::<Result<Vec<_>, _>>()?;
        let sent_time = raw
            .sent_time
            .ok_or_else(|| ValidationError::MissingRequiredField("sent_time".to_string()))?;

        Ok(Message {
            kind,
            source,
            platform,
            targets,
            recipient_id: raw.recipient_id,
            sender_id: raw.sender_id,
            access_token: raw.access_token,
            session_id: raw.session_id,
            message_id: raw.message_id,
            sent_time,
            data: raw.data,
            intent: raw.intent,
            not_handled: raw.not_handled,
            version: raw.version,
        })
    }
}

// An empty string is the same as an absent value.
fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    match value {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}
