//! Publisher gateway for log-repush
//!
//! This library puts the message bus behind a small capability interface so
//! that the tail-and-republish engine never talks to a concrete client.
//!
//! ## Features
//!
//! - **[`Publisher`]**: `publish(topic, message)`, awaited until the bus
//!   acknowledges or rejects the message
//! - **[`KafkaPublisher`]**: rdkafka-backed implementation
//! - **[`testing::RecordingPublisher`]**: in-memory fake for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use log_repush_kafka_producer::{KafkaPublisher, ProducerOpts, Publisher};
//!
//! # async fn run(opts: ProducerOpts, msg: &dyn log_repush_kafka_producer::ProducerMessage)
//! #     -> Result<(), log_repush_kafka_producer::PublishError> {
//! let publisher = KafkaPublisher::new(&opts)?;
//! publisher.publish("app-events", msg).await?;
//! publisher.close().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use std::time::Duration;

mod args;
mod error;
pub mod testing;

pub use args::{Acks, ProducerOpts};
pub use error::PublishError;

/// A message that can be handed to a [`Publisher`].
pub trait ProducerMessage: Send + Sync {
    /// Partitioning key, if any.
    fn key(&self) -> Option<String>;

    /// Serialized message body.
    fn payload(&self) -> Result<Vec<u8>, PublishError>;
}

/// Capability interface around the message bus client.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one message and wait for the outcome.
    async fn publish(&self, topic: &str, message: &dyn ProducerMessage)
        -> Result<(), PublishError>;

    /// Flush anything still in flight. Called once on shutdown.
    async fn close(&self) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Kafka publisher backed by an rdkafka `FutureProducer`.
pub struct KafkaPublisher {
    producer: FutureProducer,
    delivery_timeout: Duration,
}

impl KafkaPublisher {
    /// Create a new Kafka publisher.
    ///
    /// Creating the producer does not contact the brokers; connection
    /// problems surface as publish failures.
    pub fn new(opts: &ProducerOpts) -> Result<Self, PublishError> {
        let producer: FutureProducer = opts.client_config().create()?;

        tracing::info!(
            "Created Kafka producer for brokers {}",
            opts.bootstrap_servers()
        );

        Ok(Self {
            producer,
            delivery_timeout: Duration::from_millis(opts.message_timeout_ms),
        })
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish(
        &self,
        topic: &str,
        message: &dyn ProducerMessage,
    ) -> Result<(), PublishError> {
        let payload = message.payload()?;
        let key = message.key();

        let mut record = FutureRecord::<str, Vec<u8>>::to(topic).payload(&payload);
        if let Some(key) = key.as_deref() {
            record = record.key(key);
        }

        let (partition, offset) = self
            .producer
            .send(record, self.delivery_timeout)
            .await
            .map_err(|(err, _)| err)?;

        tracing::trace!("Delivered to {topic} partition {partition} offset {offset}");
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        // flush polls librdkafka synchronously until the queue drains
        let producer = self.producer.clone();
        let timeout = self.delivery_timeout;
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| PublishError::Rejected(format!("flush task failed: {e}")))??;

        tracing::info!("Kafka producer flushed");
        Ok(())
    }
}
