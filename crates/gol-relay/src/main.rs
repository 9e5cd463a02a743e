// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod formatter;

use std::{env, path::PathBuf, sync::Arc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use gol::{
    FallbackSink, JsonLinesSink, LogError, Logger, LoggerConfig, Message, Outcome, RawMessage,
    TracingSink, ValidationError,
};

use crate::formatter::Formatter;

#[derive(Debug, thiserror::Error)]
enum LineError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Message(#[from] ValidationError),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    delivered: usize,
    diverted: usize,
    failed: usize,
    skipped: usize,
}

#[tokio::main]
pub async fn main() {
    let log_level = env::var("GOL_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .event_format(Formatter)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config_path = env::var("GOL_CONFIG_FILE").ok().map(PathBuf::from);
    let config = match LoggerConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading relay configuration: {e}");
            return;
        }
    };

    let mut sinks: Vec<Arc<dyn FallbackSink>> = vec![Arc::new(TracingSink)];
    if let Ok(path) = env::var("GOL_FALLBACK_FILE") {
        match JsonLinesSink::create(&path) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => warn!("Unable to open fallback file {path}: {e}"),
        }
    }

    let logger = match Logger::new(config, sinks) {
        Ok(logger) => logger,
        Err(e) => {
            error!("Error creating logger: {e}");
            return;
        }
    };

    let summary = match env::args().nth(1) {
        Some(path) => match tokio::fs::File::open(&path).await {
            Ok(file) => relay(&logger, BufReader::new(file)).await,
            Err(e) => {
                error!("Unable to open input {path}: {e}");
                return;
            }
        },
        None => relay(&logger, BufReader::new(tokio::io::stdin())).await,
    };

    info!(
        delivered = summary.delivered,
        diverted = summary.diverted,
        failed = summary.failed,
        skipped = summary.skipped,
        "Relay finished"
    );
}

/// Logs every line of `reader` as one message.
async fn relay<R>(logger: &Logger, reader: R) -> Summary
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = Summary::default();
    let mut lines = reader.lines();
    let mut number = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {e}");
                break;
            }
        };
        number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let message = match parse_line(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Skipping line {number}: {e}");
                summary.skipped += 1;
                continue;
            }
        };

        let result = logger
            .log(&message)
            .instrument(info_span!("relay", line = number))
            .await;
        match result {
            Ok(Outcome::Delivered(tier)) => {
                debug!("Line {number} delivered to {tier:?}");
                summary.delivered += 1;
            }
            Ok(Outcome::Diverted { stage }) => {
                debug!("Line {number} diverted at {stage}");
                summary.diverted += 1;
            }
            Err(LogError::Validation(e)) => {
                warn!("Line {number} rejected: {e}");
                summary.failed += 1;
            }
            Err(e) => {
                error!("Line {number} not delivered: {e}");
                summary.failed += 1;
            }
        }
    }
    summary
}

fn parse_line(line: &str) -> Result<Message, LineError> {
    let raw: RawMessage = serde_json::from_str(line)?;
    Ok(Message::try_from(raw)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use gol::{
        DeliveryMode, MessageType, PrimaryTransport, ServiceConfig, Target, TransportError,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct ListStore {
        fail: bool,
        lists: Mutex<Vec<(String, Bytes)>>,
    }

    #[async_trait]
    impl PrimaryTransport for ListStore {
        async fn push_right(&self, list_name: &str, payload: Bytes) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::PrimaryUnavailable("down".to_string()));
            }
            self.lists
                .lock()
                .unwrap()
                .push((list_name.to_string(), payload));
            Ok(())
        }
    }

    fn logger(store: Arc<ListStore>, mode: DeliveryMode, sinks: Vec<Arc<dyn FallbackSink>>) -> Logger {
        let config = LoggerConfig {
            list_name: "relay".to_string(),
            redis: ServiceConfig {
                host: "127.0.0.1".to_string(),
                port: 6379,
                path: String::new(),
            },
            mode,
            ..LoggerConfig::default()
        };
        Logger::with_transports(config, store, None, sinks).unwrap()
    }

    const INPUT: &str = r#"{"type":"system","targets":["dashbot"],"sent_time":"2024-05-01T10:00:00Z","data":"started"}

not json
{"type":"audit","targets":["file"],"sent_time":"2024-05-01T10:00:01Z","data":"login"}
{"type":"unknown","targets":["dashbot"],"sent_time":"2024-05-01T10:00:02Z","data":"x"}
{"type":"audit","targets":["logstash"],"sent_time":"2024-05-01T10:00:03Z","data":{"user":"u1"}}
"#;

    #[tokio::test]
    async fn test_relay_summary() {
        let store = Arc::new(ListStore::default());
        let logger = logger(store.clone(), DeliveryMode::Strict, Vec::new());

        let summary = relay(&logger, INPUT.as_bytes()).await;

        assert_eq!(
            summary,
            Summary {
                delivered: 2,
                diverted: 0,
                failed: 1,
                skipped: 2,
            }
        );
        let lists = store.lists.lock().unwrap();
        assert!(lists.iter().all(|(name, _)| name == "relay"));
    }

    #[tokio::test]
    async fn test_relay_absorb_mode_diverts() {
        let store = Arc::new(ListStore {
            fail: true,
            ..ListStore::default()
        });
        let logger = logger(store, DeliveryMode::Absorb, vec![Arc::new(TracingSink)]);

        let summary = relay(&logger, INPUT.as_bytes()).await;

        assert_eq!(
            summary,
            Summary {
                delivered: 0,
                diverted: 3,
                failed: 0,
                skipped: 2,
            }
        );
    }

    #[test]
    fn test_parse_line() {
        let message = parse_line(
            r#"{"type":"system","targets":["chatbase"],"sent_time":"2024-05-01T10:00:00Z","data":1}"#,
        )
        .unwrap();
        assert_eq!(message.kind, MessageType::System);
        assert_eq!(message.targets, vec![Target::Chatbase]);

        assert!(matches!(parse_line("{"), Err(LineError::Json(_))));
        assert!(matches!(
            parse_line(r#"{"targets":["dashbot"]}"#),
            Err(LineError::Message(ValidationError::MissingRequiredField(_)))
        ));
    }
}
