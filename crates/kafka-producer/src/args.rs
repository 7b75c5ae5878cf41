//! CLI argument definitions for the Kafka publisher.

use clap::{Args, ValueEnum};
use rdkafka::ClientConfig;

/// Acknowledgement level required from the brokers before a publish succeeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Acks {
    /// Wait for all in-sync replicas
    All,
    /// Wait for the partition leader only
    Leader,
    /// Do not wait for any acknowledgement
    None,
}

impl Acks {
    pub fn as_str(&self) -> &'static str {
        match self {
            Acks::All => "all",
            Acks::Leader => "1",
            Acks::None => "0",
        }
    }
}

/// Kafka producer arguments.
#[derive(Args, Clone, Debug)]
pub struct ProducerOpts {
    /// Kafka brokers (comma-separated, e.g., "localhost:9092,localhost:9093")
    #[arg(long, env = "KAFKA_BROKERS", value_delimiter = ',', required = true)]
    pub brokers: Vec<String>,

    /// Broker acknowledgement level
    #[arg(long, value_enum, default_value = "all")]
    pub acks: Acks,

    /// librdkafka partitioner (random, consistent, consistent_random, murmur2, ...)
    #[arg(long, default_value = "random")]
    pub partitioner: String,

    /// Time to wait for a delivery report before failing a publish
    #[arg(long, default_value_t = 5000)]
    pub message_timeout_ms: u64,

    /// Client id reported to the brokers
    #[arg(long, default_value = "log-repush")]
    pub client_id: String,
}

impl ProducerOpts {
    /// Comma-joined broker list as librdkafka expects it.
    pub fn bootstrap_servers(&self) -> String {
        self.brokers
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Build the rdkafka client configuration for a producer.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.bootstrap_servers())
            .set("client.id", &self.client_id)
            .set("acks", self.acks.as_str())
            .set("partitioner", &self.partitioner)
            .set("message.timeout.ms", self.message_timeout_ms.to_string());
        config
    }
}
