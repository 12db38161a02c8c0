//! Durable work-queue plumbing over NATS JetStream.
//!
//! One [`Broker`] session per process multiplexes every stream. The session
//! owns its bound streams and consumers as a flat structure: binding is
//! idempotent (create-or-update), publishing waits for the server's
//! persistence acknowledgement, and [`Broker::consume`] drives one task per
//! bound consumer until cancelled. Broker errors inside the consume loops are
//! reported through an error callback and never tear the consumer down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::{
    self,
    consumer::PullConsumer,
    stream::{RetentionPolicy, StorageType},
};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::task::JoinSet;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::subject::{express_subjects, normal_subjects, SmsSubject, EXPRESS_STREAM, NORMAL_STREAM};

/// Pause before re-requesting a message stream after a consumer error.
const REBIND_DELAY: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("failed to connect to broker at {address}")]
    Connect {
        address: String,
        #[source]
        source: async_nats::ConnectError,
    },

    #[error("failed to bind stream {name}")]
    BindStream {
        name: String,
        #[source]
        source: jetstream::context::CreateStreamError,
    },

    #[error("failed to bind consumer {name} on stream {stream}")]
    BindConsumer {
        name: String,
        stream: String,
        #[source]
        source: jetstream::stream::ConsumerError,
    },

    #[error("stream {name} is not bound to this session")]
    UnboundStream { name: String },

    #[error("publish to {subject} was not acknowledged")]
    Publish {
        subject: String,
        #[source]
        source: jetstream::context::PublishError,
    },

    #[error("failed to request messages on stream {stream}")]
    Messages {
        stream: String,
        #[source]
        source: jetstream::consumer::StreamError,
    },

    #[error("message delivery failed on stream {stream}")]
    Delivery {
        stream: String,
        #[source]
        source: jetstream::consumer::pull::MessagesError,
    },
}

/// Publishing seam used by the ingress API. The broker session implements it;
/// tests substitute a recording fake.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish with server-acknowledged persistence. Returns the stream
    /// sequence assigned to the message.
    async fn publish(&self, subject: SmsSubject, payload: Bytes) -> Result<u64, BrokerError>;
}

/// Per-message processing seam used by [`Broker::consume`]. Implementations
/// must settle every message themselves (ack, nak, or term); the consume loop
/// only delivers.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, message: jetstream::Message);
}

/// Callback invoked for broker errors inside the consume loops.
pub type ErrorHandler = Arc<dyn Fn(BrokerError) + Send + Sync>;

/// Declarative description of a durable work-queue stream.
#[derive(Debug, Clone)]
pub struct StreamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub subjects: Vec<String>,
}

impl StreamSpec {
    /// File-backed work-queue stream: an acknowledged message is removed, an
    /// unacknowledged one is redelivered after the visibility timeout.
    fn into_config(self) -> jetstream::stream::Config {
        jetstream::stream::Config {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            subjects: self.subjects,
            retention: RetentionPolicy::WorkQueue,
            storage: StorageType::File,
            allow_direct: true,
            ..Default::default()
        }
    }
}

/// The normal-priority work queue.
pub fn normal_stream_spec() -> StreamSpec {
    StreamSpec {
        name: NORMAL_STREAM,
        description: "work queue for handling sms with normal priority",
        subjects: normal_subjects(),
    }
}

/// The express-priority work queue.
pub fn express_stream_spec() -> StreamSpec {
    StreamSpec {
        name: EXPRESS_STREAM,
        description: "work queue for handling sms with high priority",
        subjects: express_subjects(),
    }
}

struct BoundConsumer {
    stream: String,
    consumer: PullConsumer,
}

/// A JetStream session owning its bound streams and consumers.
pub struct Broker {
    jetstream: jetstream::Context,
    streams: HashMap<String, jetstream::stream::Stream>,
    consumers: Vec<BoundConsumer>,
}

impl Broker {
    /// Connect to the broker at `address` (host:port).
    pub async fn connect(address: &str) -> Result<Self, BrokerError> {
        let client = async_nats::connect(address)
            .await
            .map_err(|source| BrokerError::Connect {
                address: address.to_string(),
                source,
            })?;

        info!(address, "connected to broker");

        Ok(Self {
            jetstream: jetstream::new(client),
            streams: HashMap::new(),
            consumers: Vec::new(),
        })
    }

    /// Create-or-update each stream and remember it in the session.
    pub async fn bind_streams(
        &mut self,
        specs: impl IntoIterator<Item = StreamSpec>,
    ) -> Result<(), BrokerError> {
        for spec in specs {
            let name = spec.name;
            let stream = self
                .jetstream
                .get_or_create_stream(spec.into_config())
                .await
                .map_err(|source| BrokerError::BindStream {
                    name: name.to_string(),
                    source,
                })?;
            debug!(stream = name, "bound stream");
            self.streams.insert(name.to_string(), stream);
        }
        Ok(())
    }

    /// Create-or-update a durable pull consumer under a previously bound
    /// stream. Restarted workers rejoin the same delivery cursor through the
    /// durable name.
    pub async fn bind_consumer(
        &mut self,
        stream_name: &str,
        config: jetstream::consumer::pull::Config,
    ) -> Result<(), BrokerError> {
        let stream = self
            .streams
            .get(stream_name)
            .ok_or_else(|| BrokerError::UnboundStream {
                name: stream_name.to_string(),
            })?;

        let name = config.durable_name.clone().unwrap_or_default();
        let consumer = stream
            .get_or_create_consumer(&name, config)
            .await
            .map_err(|source| BrokerError::BindConsumer {
                name: name.clone(),
                stream: stream_name.to_string(),
                source,
            })?;

        debug!(consumer = %name, stream = stream_name, "bound consumer");

        self.consumers.push(BoundConsumer {
            stream: stream_name.to_string(),
            consumer,
        });
        Ok(())
    }

    /// Start pulling messages for every bound consumer, delivering each to
    /// `handler` on the consumer's task. Returns a handle that joins the
    /// loops; cancelling `shutdown` stops them.
    pub fn consume(
        self,
        handler: Arc<dyn MessageHandler>,
        on_error: ErrorHandler,
        shutdown: CancellationToken,
    ) -> ConsumeHandle {
        let mut tasks = JoinSet::new();
        for bound in self.consumers {
            let handler = handler.clone();
            let on_error = on_error.clone();
            let token = shutdown.clone();
            tasks.spawn(consume_loop(bound, handler, on_error, token));
        }
        ConsumeHandle { tasks, shutdown }
    }
}

#[async_trait]
impl Publisher for Broker {
    async fn publish(&self, subject: SmsSubject, payload: Bytes) -> Result<u64, BrokerError> {
        let ack = self
            .jetstream
            .publish(subject.as_str(), payload)
            .await
            .map_err(|source| BrokerError::Publish {
                subject: subject.to_string(),
                source,
            })?
            .await
            .map_err(|source| BrokerError::Publish {
                subject: subject.to_string(),
                source,
            })?;

        Ok(ack.sequence)
    }
}

async fn consume_loop(
    bound: BoundConsumer,
    handler: Arc<dyn MessageHandler>,
    on_error: ErrorHandler,
    shutdown: CancellationToken,
) {
    let BoundConsumer { stream, consumer } = bound;
    info!(stream = %stream, "consume loop started");

    'rebind: while !shutdown.is_cancelled() {
        let mut messages = match consumer.messages().await {
            Ok(messages) => messages,
            Err(source) => {
                on_error(BrokerError::Messages {
                    stream: stream.clone(),
                    source,
                });
                tokio::select! {
                    _ = shutdown.cancelled() => break 'rebind,
                    _ = tokio::time::sleep(REBIND_DELAY) => continue 'rebind,
                }
            }
        };

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break 'rebind,
                next = messages.next() => match next {
                    Some(Ok(message)) => handler.handle(message).await,
                    Some(Err(source)) => on_error(BrokerError::Delivery {
                        stream: stream.clone(),
                        source,
                    }),
                    None => {
                        warn!(stream = %stream, "message stream ended, rebinding");
                        continue 'rebind;
                    }
                },
            }
        }
    }

    debug!(stream = %stream, "consume loop stopped");
}

/// Cancellable handle over the running consume loops.
pub struct ConsumeHandle {
    tasks: JoinSet<()>,
    shutdown: CancellationToken,
}

impl ConsumeHandle {
    /// Signal the consume loops to stop.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    /// Wait for every consume loop to finish.
    pub async fn join(mut self) {
        while self.tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_specs_build_work_queue_configs() {
        for (spec, expected_subjects) in [
            (normal_stream_spec(), normal_subjects()),
            (express_stream_spec(), express_subjects()),
        ] {
            let name = spec.name;
            let config = spec.into_config();
            assert_eq!(config.name, name);
            assert!(matches!(config.retention, RetentionPolicy::WorkQueue));
            assert!(matches!(config.storage, StorageType::File));
            assert!(config.allow_direct);
            assert_eq!(config.subjects, expected_subjects);
        }
    }

    #[test]
    fn stream_specs_cover_disjoint_subject_sets() {
        let normal = normal_stream_spec().subjects;
        let express = express_stream_spec().subjects;
        assert!(normal.iter().all(|s| !express.contains(s)));
    }
}
