//! Recording publisher for tests.
//!
//! Stands in for the message bus so passes can be exercised without a live
//! broker.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::{ProducerMessage, PublishError, Publisher};

/// A message accepted by [`RecordingPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    /// Payload decoded as UTF-8 (lossy).
    pub fn payload_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// In-memory [`Publisher`] that records every successful publish.
///
/// Attempts are numbered from 1 across the lifetime of the publisher;
/// attempts registered with [`RecordingPublisher::fail_attempt`] are
/// rejected and not recorded.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<PublishedMessage>>,
    failing: Mutex<HashSet<usize>>,
    attempts: AtomicUsize,
    closed: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `attempt`-th publish call (1-based).
    pub fn fail_attempt(self, attempt: usize) -> Self {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(attempt);
        self
    }

    /// Messages accepted so far, in publish order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of publish calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(
        &self,
        topic: &str,
        message: &dyn ProducerMessage,
    ) -> Result<(), PublishError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let rejected = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&attempt);
        if rejected {
            return Err(PublishError::Rejected(format!(
                "attempt {attempt} to {topic} rejected"
            )));
        }

        let published = PublishedMessage {
            topic: topic.to_string(),
            key: message.key(),
            payload: message.payload()?,
        };
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(published);
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
