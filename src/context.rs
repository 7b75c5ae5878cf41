use anyhow::Context;
use checkpoint::{FilesystemStore, OffsetStore};
use log_repush_jsonl_source::{run_pass, Config, PassError, PassReport};
use log_repush_kafka_producer::{KafkaPublisher, ProducerOpts, Publisher};
use std::future::Future;
use std::sync::Arc;

use crate::schedule::{self, Trigger};
use crate::RepushOpts;

/// Everything a pass needs, built once per process and shared by every pass.
#[derive(Clone)]
pub struct RepushContext {
    config: Config,
    offsets: Arc<dyn OffsetStore>,
    publisher: Arc<dyn Publisher>,
}

impl RepushContext {
    pub fn new(
        config: Config,
        offsets: Arc<dyn OffsetStore>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            offsets,
            publisher,
        }
    }

    /// Build the production context: a filesystem offset store and a Kafka publisher.
    pub fn from_opts(opts: &RepushOpts, producer: &ProducerOpts) -> anyhow::Result<Self> {
        let publisher = KafkaPublisher::new(producer).context("Failed to create Kafka producer")?;
        let offsets = FilesystemStore::new(&opts.offset_file);
        let config = Config::new(&opts.input, &opts.error_file);

        tracing::info!(
            "Republishing {} (offset file {}, failure file {})",
            opts.input.display(),
            opts.offset_file.display(),
            opts.error_file.display()
        );

        Ok(Self::new(config, Arc::new(offsets), Arc::new(publisher)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run_pass(&self) -> Result<PassReport, PassError> {
        run_pass(&self.config, self.offsets.as_ref(), self.publisher.as_ref()).await
    }

    /// Run passes on `trigger` until `shutdown` resolves.
    ///
    /// A failed pass is logged and the next one runs on schedule, starting
    /// again from the last stored offset. Returns the number of passes run.
    pub async fn run_scheduled<S>(&self, trigger: &Trigger, shutdown: S) -> u64
    where
        S: Future<Output = ()>,
    {
        schedule::run_scheduled(trigger, shutdown, move || async move {
            if let Err(e) = self.run_pass().await {
                tracing::error!("Pass failed: {e}");
            }
        })
        .await
    }

    /// Flush and close the publisher.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.publisher
            .close()
            .await
            .context("Failed to flush pending publishes")
    }
}
