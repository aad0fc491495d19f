use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Failed to read messages: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid message envelope on line {line}: {source}")]
    InvalidEnvelope {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to consume message: {0}")]
    Consume(#[source] rdkafka::error::KafkaError),
}

/// How messages are laid out in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InputFormat {
    /// One message body per line
    #[default]
    Lines,
    /// One JSON envelope per line with topic, partition, offset, timestamp, headers and value
    Jsonl,
}

/// Header keys, accepted either as a list of names or as an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Headers {
    Keys(Vec<String>),
    Map(BTreeMap<String, serde_json::Value>),
}

impl From<Headers> for Vec<String> {
    fn from(headers: Headers) -> Self {
        match headers {
            Headers::Keys(keys) => keys,
            Headers::Map(map) => map.into_keys().collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    topic: Option<String>,
    partition: i32,
    offset: Option<i64>,
    timestamp: Option<DateTime<Utc>>,
    /// Absent and `null` both mean no headers
    headers: Option<Headers>,
    value: Option<String>,
}

/// A consumed record with the metadata shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub timestamp: Option<DateTime<Utc>>,
    /// Header keys in arrival order
    pub headers: Vec<String>,
    /// The payload; `None` for a null (tombstone) record
    pub value: Option<String>,
}

impl ConsumedMessage {
    pub fn new(topic: impl Into<String>, offset: i64, value: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition: 0,
            offset,
            timestamp: None,
            headers: Vec::new(),
            value: Some(value.into()),
        }
    }

    /// The text the filter is applied to; empty for a null payload
    pub fn body(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// Reads messages one per non-empty line
pub struct MessageReader<R> {
    reader: R,
    format: InputFormat,
    default_topic: String,
    line_number: usize,
    record_index: i64,
    buffer: String,
}

impl<R: BufRead> MessageReader<R> {
    pub fn new(reader: R, format: InputFormat, default_topic: impl Into<String>) -> Self {
        Self {
            reader,
            format,
            default_topic: default_topic.into(),
            line_number: 0,
            record_index: 0,
            buffer: String::new(),
        }
    }

    fn decode(&self, line: &str) -> Result<ConsumedMessage, MessageError> {
        match self.format {
            InputFormat::Lines => Ok(ConsumedMessage::new(
                self.default_topic.clone(),
                self.record_index,
                line,
            )),
            InputFormat::Jsonl => {
                let envelope: Envelope =
                    serde_json::from_str(line).map_err(|source| MessageError::InvalidEnvelope {
                        line: self.line_number,
                        source,
                    })?;
                Ok(ConsumedMessage {
                    topic: envelope
                        .topic
                        .unwrap_or_else(|| self.default_topic.clone()),
                    partition: envelope.partition,
                    offset: envelope.offset.unwrap_or(self.record_index),
                    timestamp: envelope.timestamp,
                    headers: envelope.headers.map(Vec::from).unwrap_or_default(),
                    value: envelope.value,
                })
            }
        }
    }
}

impl<R: BufRead> Iterator for MessageReader<R> {
    type Item = Result<ConsumedMessage, MessageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line_number += 1;

            let line = self.buffer.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }

            let decoded = self.decode(line);
            self.record_index += 1;
            return Some(decoded);
        }
    }
}

/// Open a message source: a file path, or stdin for `-`
pub fn open_messages(
    path: &Path,
    format: InputFormat,
    default_topic: &str,
) -> Result<MessageReader<Box<dyn BufRead>>, MessageError> {
    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(path).map_err(|source| MessageError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Box::new(BufReader::new(file))
    };
    Ok(MessageReader::new(reader, format, default_topic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &str, format: InputFormat) -> Vec<Result<ConsumedMessage, MessageError>> {
        MessageReader::new(Cursor::new(input.to_string()), format, "orders").collect()
    }

    #[test]
    fn test_lines_format_skips_blank_lines() {
        let messages: Vec<_> = read_all("a=1\n\n  \nb=2\r\n", InputFormat::Lines)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ConsumedMessage::new("orders", 0, "a=1"));
        assert_eq!(messages[1], ConsumedMessage::new("orders", 1, "b=2"));
    }

    #[test]
    fn test_jsonl_envelope_fields() {
        let input = r#"{"topic":"payments","partition":3,"offset":42,"timestamp":"2026-01-01T00:00:00Z","headers":{"trace":"x","source":"y"},"value":"{\"status\":\"ok\"}"}"#;
        let msg = read_all(input, InputFormat::Jsonl).remove(0).unwrap();
        assert_eq!(msg.topic, "payments");
        assert_eq!(msg.partition, 3);
        assert_eq!(msg.offset, 42);
        assert_eq!(
            msg.timestamp.map(|t| t.to_rfc3339()),
            Some("2026-01-01T00:00:00+00:00".to_string())
        );
        assert_eq!(msg.headers, vec!["source".to_string(), "trace".to_string()]);
        assert_eq!(msg.body(), r#"{"status":"ok"}"#);
    }

    #[test]
    fn test_jsonl_defaults_and_null_value() {
        let input = "{\"headers\":[\"b\",\"a\"]}\n{\"value\":null}\n";
        let messages: Vec<_> = read_all(input, InputFormat::Jsonl)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(messages[0].topic, "orders");
        assert_eq!(messages[0].offset, 0);
        assert_eq!(messages[0].headers, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(messages[1].offset, 1);
        assert_eq!(messages[1].value, None);
        assert_eq!(messages[1].body(), "");
    }

    #[test]
    fn test_jsonl_null_headers_mean_none() {
        let input = "{\"headers\":null,\"value\":\"a=1\"}\n";
        let msg = read_all(input, InputFormat::Jsonl).remove(0).unwrap();
        assert!(msg.headers.is_empty());
        assert_eq!(msg.body(), "a=1");
    }

    #[test]
    fn test_invalid_envelope_reports_line_and_continues() {
        let input = "{\"value\":\"a\"}\n\nnot json\n{\"value\":\"b\"}\n";
        let results = read_all(input, InputFormat::Jsonl);
        assert_eq!(results.len(), 3);
        match &results[1] {
            Err(MessageError::InvalidEnvelope { line, .. }) => assert_eq!(*line, 3),
            other => panic!("expected invalid envelope, got {other:?}"),
        }
        assert_eq!(results[2].as_ref().unwrap().body(), "b");
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_messages(
            Path::new("/definitely/not/here.log"),
            InputFormat::Lines,
            "-",
        );
        assert!(matches!(result, Err(MessageError::Open { .. })));
    }
}
