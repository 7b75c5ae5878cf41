//! Error types for the publisher gateway.

use thiserror::Error;

/// Errors that can occur while publishing a single message.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Payload encoding error: {0}")]
    Encode(String),

    #[error("Publish rejected: {0}")]
    Rejected(String),
}
