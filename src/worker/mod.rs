//! The dispatch worker.
//!
//! Consumes both priority streams through the shared durable consumers, runs
//! the dispatch transaction for every `request` message, and settles each
//! delivery explicitly (durable ack after commit, nak with delay on transient
//! failure, term on undecodable payloads). Each stream is paced by its own
//! [`rate_limit::RateLimiter`], so backlog on the normal queue cannot starve
//! express traffic.

pub mod dispatch;
pub mod rate_limit;

use std::sync::Arc;

use async_nats::jetstream::{self, AckKind};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broker::{express_stream_spec, normal_stream_spec, Broker, MessageHandler};
use crate::config::Config;
use crate::subject::{MessageKind, SmsSubject, EXPRESS_STREAM, NORMAL_STREAM};
use dispatch::Disposition;
use rate_limit::RateLimiter;

/// Message handler for both priority streams.
pub struct SmsWorker {
    db: PgPool,
    cost: Decimal,
    normal_limit: RateLimiter,
    express_limit: RateLimiter,
}

impl SmsWorker {
    pub fn new(db: PgPool, cost: Decimal, normal_rate_ms: u64, express_rate_ms: u64) -> Self {
        Self {
            db,
            cost,
            normal_limit: RateLimiter::from_millis(normal_rate_ms),
            express_limit: RateLimiter::from_millis(express_rate_ms),
        }
    }

    fn limiter(&self, subject: SmsSubject) -> &RateLimiter {
        if subject.is_express() {
            &self.express_limit
        } else {
            &self.normal_limit
        }
    }

    async fn settle(&self, message: &jetstream::Message, disposition: &Disposition) {
        match disposition {
            Disposition::Ack => {
                if let Err(err) = message.double_ack().await {
                    error!(error = %err, "failed to double-ack message");
                }
            }
            Disposition::Nak(delay) => {
                if let Err(err) = message.ack_with(AckKind::Nak(Some(*delay))).await {
                    error!(error = %err, "failed to nak message");
                }
            }
            Disposition::Term(reason) => {
                warn!(reason = %reason, "terminating message");
                if let Err(err) = message.ack_with(AckKind::Term).await {
                    error!(error = %err, "failed to term message");
                }
            }
        }
    }
}

#[async_trait]
impl MessageHandler for SmsWorker {
    async fn handle(&self, message: jetstream::Message) {
        let Some(subject) = SmsSubject::parse(message.subject.as_str()) else {
            warn!(subject = %message.subject, "message on unrecognized subject");
            self.settle(&message, &Disposition::Term("unrecognized subject".to_string()))
                .await;
            return;
        };

        match subject.kind() {
            MessageKind::Request => {
                debug!(
                    subject = %subject,
                    payload = %String::from_utf8_lossy(&message.payload),
                    "handling dispatch request"
                );
                let disposition = dispatch::process_request(&self.db, self.cost, &message.payload).await;
                self.settle(&message, &disposition).await;
                if disposition == Disposition::Ack {
                    // Hold this stream's handler until the pacing window elapses;
                    // the broker already saw the ack.
                    self.limiter(subject).throttle().await;
                }
            }
            MessageKind::Status | MessageKind::Error => {
                debug!(
                    subject = %subject,
                    payload = %String::from_utf8_lossy(&message.payload),
                    "acknowledging control message"
                );
                if let Err(err) = message.double_ack().await {
                    error!(error = %err, "failed to double-ack control message");
                }
            }
        }
    }
}

fn consumer_config(durable: &str, description: &str, max_deliver: i64) -> jetstream::consumer::pull::Config {
    jetstream::consumer::pull::Config {
        durable_name: Some(durable.to_string()),
        description: Some(description.to_string()),
        max_deliver,
        ..Default::default()
    }
}

/// Connect the worker's collaborators, bind streams and durable consumers,
/// and consume until `shutdown` fires. In-flight dispatch transactions finish
/// settling before the loops stop.
pub async fn run(config: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.worker.postgres.pool_size)
        .connect(&config.worker.postgres.url())
        .await?;
    crate::migrator().run(&pool).await?;

    let mut broker = Broker::connect(&config.worker.nats.address).await?;
    broker
        .bind_streams([normal_stream_spec(), express_stream_spec()])
        .await?;
    broker
        .bind_consumer(
            NORMAL_STREAM,
            consumer_config(NORMAL_STREAM, "consumes normal sms work queue", config.sms.max_deliver),
        )
        .await?;
    broker
        .bind_consumer(
            EXPRESS_STREAM,
            consumer_config(
                EXPRESS_STREAM,
                "consumes high priority sms work queue",
                config.sms.max_deliver,
            ),
        )
        .await?;

    let worker = Arc::new(SmsWorker::new(
        pool,
        config.sms.cost,
        config.sms.normal.ratelimit,
        config.sms.express.ratelimit,
    ));

    let handle = broker.consume(
        worker,
        Arc::new(|err: crate::broker::BrokerError| error!(error = %err, "consumer error")),
        shutdown,
    );

    info!("worker started");
    handle.join().await;
    info!("worker stopped");

    Ok(())
}
