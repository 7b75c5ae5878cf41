//! Decoding of log lines into publishable records
//!
//! A line is a JSON object carrying a `topic` routing key and an optional
//! `message` body. Any other fields travel along untouched:
//!
//! ```json
//! {"topic": "orders", "message": "order 42 created", "level": "info"}
//! ```

use log_repush_kafka_producer::{ProducerMessage, PublishError};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// One decoded log entry.
///
/// Only ever built by [`parse_line`] from a line that decoded successfully.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Routing key, used as the destination topic
    pub topic: String,
    /// Message body
    pub message: Value,
    /// Remaining fields of the line
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Why a line could not be turned into a [`Record`].
#[derive(Error, Debug)]
pub enum ParseErrorKind {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line is not a JSON object")]
    NotAnObject,

    #[error("missing routing key `topic`")]
    MissingTopic,

    #[error("routing key `topic` is not a string")]
    InvalidTopic,
}

/// A line that failed to decode, kept verbatim for the failure sink.
#[derive(Error, Debug)]
#[error("{kind}")]
pub struct ParseError {
    /// The original line (lossily decoded if it was not UTF-8)
    pub line: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    fn new(line: &[u8], kind: impl Into<ParseErrorKind>) -> Self {
        Self {
            line: String::from_utf8_lossy(line).into_owned(),
            kind: kind.into(),
        }
    }
}

/// Decode one raw log line.
///
/// Pure: never touches the filesystem or the bus.
pub fn parse_line(line: &[u8]) -> Result<Record, ParseError> {
    let value: Value = serde_json::from_slice(line).map_err(|e| ParseError::new(line, e))?;

    let Value::Object(mut fields) = value else {
        return Err(ParseError::new(line, ParseErrorKind::NotAnObject));
    };

    let topic = match fields.remove("topic") {
        Some(Value::String(topic)) if !topic.trim().is_empty() => topic,
        Some(Value::String(_)) | Some(Value::Null) | None => {
            return Err(ParseError::new(line, ParseErrorKind::MissingTopic))
        }
        Some(_) => return Err(ParseError::new(line, ParseErrorKind::InvalidTopic)),
    };
    let message = fields.remove("message").unwrap_or(Value::Null);

    Ok(Record {
        topic,
        message,
        fields,
    })
}

impl ProducerMessage for Record {
    /// The message body doubles as the partitioning key.
    fn key(&self) -> Option<String> {
        match &self.message {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn payload(&self) -> Result<Vec<u8>, PublishError> {
        serde_json::to_vec(self).map_err(|e| PublishError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Tests a line in the shape written by the logging side: topic plus message.
    #[test]
    fn test_parse_topic_and_message() {
        let record = parse_line(br#"{"topic":"orders","message":"order 42 created"}"#).unwrap();

        assert_eq!(record.topic, "orders");
        assert_eq!(record.message, json!("order 42 created"));
        assert!(record.fields.is_empty());
    }

    /// Tests that fields other than topic and message are carried along.
    #[test]
    fn test_parse_keeps_extra_fields() {
        let record =
            parse_line(br#"{"topic":"audit","message":{"id":7},"level":"warn","ts":1}"#).unwrap();

        assert_eq!(record.message, json!({"id": 7}));
        assert_eq!(record.fields.get("level"), Some(&json!("warn")));
        assert_eq!(record.fields.get("ts"), Some(&json!(1)));
    }

    #[test]
    fn test_parse_without_message() {
        let record = parse_line(br#"{"topic":"heartbeat"}"#).unwrap();
        assert_eq!(record.message, Value::Null);
        assert_eq!(record.key(), None);
    }

    fn kind_name(kind: &ParseErrorKind) -> &'static str {
        match kind {
            ParseErrorKind::Json(_) => "json",
            ParseErrorKind::NotAnObject => "not-object",
            ParseErrorKind::MissingTopic => "missing-topic",
            ParseErrorKind::InvalidTopic => "invalid-topic",
        }
    }

    /// Tests every shape of input that must be rejected, and that the
    /// original text is preserved on the error.
    #[test]
    fn test_parse_rejects_malformed_lines() {
        let cases = [
            ("{not json", "json"),
            ("", "json"),
            ("[1,2,3]", "not-object"),
            ("\"topic\"", "not-object"),
            (r#"{"message":"no topic"}"#, "missing-topic"),
            (r#"{"topic":"","message":"x"}"#, "missing-topic"),
            (r#"{"topic":"  "}"#, "missing-topic"),
            (r#"{"topic":null}"#, "missing-topic"),
            (r#"{"topic":5}"#, "invalid-topic"),
        ];

        for (line, expected) in cases {
            let err = parse_line(line.as_bytes()).unwrap_err();
            assert_eq!(kind_name(&err.kind), expected, "for {line:?}");
            assert_eq!(err.line, line);
        }
    }

    #[test]
    fn test_parse_invalid_utf8_keeps_lossy_line() {
        let err = parse_line(b"{\"topic\":\"\xff\"}").unwrap_err();
        assert!(err.line.contains('\u{FFFD}'));
    }

    #[test]
    fn test_key_from_message() {
        let record = parse_line(br#"{"topic":"t","message":"abc"}"#).unwrap();
        assert_eq!(record.key().as_deref(), Some("abc"));

        let record = parse_line(br#"{"topic":"t","message":{"a":1}}"#).unwrap();
        assert_eq!(record.key().as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_payload_is_json_record() {
        let record = parse_line(br#"{"topic":"t","message":"m","level":"info"}"#).unwrap();
        let payload: Value = serde_json::from_slice(&record.payload().unwrap()).unwrap();

        assert_eq!(
            payload,
            json!({"topic": "t", "message": "m", "level": "info"})
        );
    }
}
