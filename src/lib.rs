//! # smsgw: a minimal SMS gateway
//!
//! `smsgw` is a two-sided messaging pipeline. The ingress API accepts
//! "send SMS" requests over HTTP, checks the sender's balance as a cheap
//! pre-filter, and enqueues each request durably on a priority-matched
//! JetStream work queue. A separate worker tier consumes the queues and, for
//! every message, runs one database transaction that records the delivery and
//! debits the sender's balance by the configured cost.
//!
//! ## Architecture
//!
//! Two long-running processes share a NATS JetStream broker and a PostgreSQL
//! database:
//!
//! - the **API** (`smsgw api`) publishes to `sms.send.request` or, for the
//!   express class, `sms.ex.send.request`, and returns as soon as the broker
//!   has durably accepted the message;
//! - the **worker** (`smsgw worker`) consumes the `Sms` and `SmsExpress`
//!   work-queue streams through shared durable consumers, inserts the
//!   delivery row and debits the balance inside one transaction, commits, and
//!   only then acknowledges the message. Transient failures are nak'd for
//!   redelivery; undecodable payloads are terminated.
//!
//! The two priority classes live on separate streams with independent rate
//! limiters, so a backlog of normal traffic never delays express dispatch.
//!
//! Consistency: every acknowledged request corresponds to exactly one
//! committed delivery row and one debit. A failed dispatch transaction leaves
//! no row and no balance change, and the message is retried or terminated -
//! never silently consumed. Because the worker commits before acknowledging,
//! a crash in between can duplicate a delivery on redelivery but cannot lose
//! one.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     args: smsgw::config::Args,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse();
//!     let config = smsgw::Config::load(&cli.args)?;
//!     smsgw::telemetry::init_telemetry()?;
//!
//!     smsgw::run_api(config, async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod broker;
pub mod config;
pub mod db;
pub mod errors;
pub mod subject;
pub mod telemetry;
pub mod types;
pub mod worker;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use bon::Builder;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;

use broker::{express_stream_spec, normal_stream_spec, Broker, Publisher};
pub use config::Config;
pub use worker::run as run_worker;

/// Application state shared across all API request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    /// Store connection pool; the API only ever reads from it.
    pub db: PgPool,
    /// Broker session used to enqueue dispatch requests.
    pub publisher: Arc<dyn Publisher>,
    /// Cost charged per dispatched SMS, fixed at startup.
    pub cost: Decimal,
}

/// Get the gateway's database migrator.
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Run the ingress API until `shutdown` resolves, then drain.
///
/// Connects the store and the broker, binds both work-queue streams so that
/// publishes never race stream creation, and serves the router on the
/// configured address.
pub async fn run_api<F>(config: Config, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.api.postgres.pool_size)
        .connect(&config.api.postgres.url())
        .await?;
    migrator().run(&pool).await?;

    let mut broker = Broker::connect(&config.api.nats.address).await?;
    broker
        .bind_streams([normal_stream_spec(), express_stream_spec()])
        .await?;

    let state = AppState::builder()
        .db(pool)
        .publisher(Arc::new(broker))
        .cost(config.sms.cost)
        .build();

    let router = api::build_router(state);
    let listener = TcpListener::bind(&config.api.listen).await?;
    info!("api listening on http://{}", config.api.listen);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("api stopped");
    Ok(())
}
