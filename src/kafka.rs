//! Kafka consumer feeding the message filter.
//!
//! The consumer is synchronous: [`KafkaSource`] polls a `BaseConsumer` and
//! yields [`ConsumedMessage`]s until Ctrl-C is pressed, so it plugs into the
//! same scan loop as file input.

use crate::config::{ConfigError, ConsumerOptions, Secret};
use crate::message::{ConsumedMessage, MessageError};
use chrono::{DateTime, Utc};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{Headers, Message};
use rdkafka::{Offset, TopicPartitionList};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const DEFAULT_GROUP_ID: &str = "topic-filter";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum KafkaSourceError {
    #[error("Missing consumer option '{0}' in config")]
    MissingOption(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Kafka client error: {0}")]
    Client(#[from] KafkaError),
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Build the librdkafka client settings for the consumer
///
/// Reads from the earliest offset when the group has none committed. SASL
/// (SASL_SSL with PLAIN) is enabled when a username is configured.
pub fn client_config(opts: &ConsumerOptions) -> Result<ClientConfig, KafkaSourceError> {
    let servers = non_empty(&opts.bootstrap_servers)
        .ok_or(KafkaSourceError::MissingOption("bootstrap_servers"))?;

    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", servers)
        .set(
            "group.id",
            non_empty(&opts.group_id).unwrap_or(DEFAULT_GROUP_ID),
        )
        .set("auto.offset.reset", "earliest")
        .set("enable.partition.eof", "false");

    if let Some(username) = non_empty(&opts.sasl_username) {
        let password = opts
            .sasl_password
            .as_ref()
            .map(Secret::expose)
            .unwrap_or_default();
        config
            .set("security.protocol", "SASL_SSL")
            .set("sasl.mechanism", "PLAIN")
            .set("sasl.username", username)
            .set("sasl.password", password);
    }

    Ok(config)
}

/// Convert a Kafka record into the form shown to the user
pub fn to_consumed<M: Message>(msg: &M) -> ConsumedMessage {
    ConsumedMessage {
        topic: msg.topic().to_string(),
        partition: msg.partition(),
        offset: msg.offset(),
        timestamp: msg
            .timestamp()
            .to_millis()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        headers: msg
            .headers()
            .map(|headers| headers.iter().map(|h| h.key.to_string()).collect())
            .unwrap_or_default(),
        value: msg
            .payload()
            .map(|payload| String::from_utf8_lossy(payload).into_owned()),
    }
}

/// Resolve, for every partition of `topic`, the first offset at or after `ts`
fn offsets_for_time(
    consumer: &BaseConsumer,
    topic: &str,
    ts: DateTime<Utc>,
) -> Result<TopicPartitionList, KafkaError> {
    let metadata = consumer.fetch_metadata(Some(topic), METADATA_TIMEOUT)?;

    let mut requested = TopicPartitionList::new();
    for partition in metadata
        .topics()
        .iter()
        .filter(|t| t.name() == topic)
        .flat_map(|t| t.partitions())
    {
        requested.add_partition_offset(
            topic,
            partition.id(),
            Offset::Offset(ts.timestamp_millis()),
        )?;
    }

    consumer.offsets_for_times(requested, METADATA_TIMEOUT)
}

/// Consumed messages from one topic, until shutdown is requested
pub struct KafkaSource {
    consumer: BaseConsumer,
    shutdown: Arc<AtomicBool>,
}

impl KafkaSource {
    /// Create the consumer and join the topic
    ///
    /// With `consumer_group_offset_utc_timestamp` set, the topic's partitions
    /// are assigned at the offsets matching that instant instead of
    /// subscribing through the group.
    pub fn connect(
        opts: &ConsumerOptions,
        topic: &str,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, KafkaSourceError> {
        let consumer: BaseConsumer = client_config(opts)?.create()?;

        match opts.offset_timestamp()? {
            Some(ts) => {
                let assignment = offsets_for_time(&consumer, topic, ts)?;
                debug!(topic, %ts, partitions = assignment.count(), "assigning from timestamp");
                consumer.assign(&assignment)?;
            }
            None => consumer.subscribe(&[topic])?,
        }

        info!(topic, "Starting consumer loop. Press Ctrl-C to exit.");
        Ok(Self { consumer, shutdown })
    }
}

impl Iterator for KafkaSource {
    type Item = Result<ConsumedMessage, MessageError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.consumer.poll(POLL_INTERVAL) {
                None => continue,
                Some(Ok(msg)) => return Some(Ok(to_consumed(&msg))),
                Some(Err(e)) => return Some(Err(MessageError::Consume(e))),
            }
        }
        None
    }
}

impl Drop for KafkaSource {
    fn drop(&mut self) {
        info!("Closing consumer.");
        self.consumer.unsubscribe();
    }
}

/// Install a Ctrl-C handler and return the flag it raises
///
/// The first Ctrl-C asks the consumer loop to stop after the current poll;
/// a second one exits immediately.
pub fn shutdown_on_ctrl_c() -> io::Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                flag.store(true, Ordering::SeqCst);
                warn!("Shutdown requested; press Ctrl-C again to exit immediately");

                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            });
        })?;

    Ok(shutdown)
}
