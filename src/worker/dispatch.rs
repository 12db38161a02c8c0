//! The dispatch transaction: insert the delivery row and debit the sender.

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error};

use crate::db::handlers::{SmsLog, Users};
use crate::db::models::sms::{SmsCreateDBRequest, SmsEnvelope};

/// How a handled message must be settled with the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Remove the message from the work queue (durable ack).
    Ack,
    /// Requeue the message after the given delay.
    Nak(Duration),
    /// Drop the message permanently, with a reason.
    Term(String),
}

/// Delay before the broker redelivers a message after a transient failure.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Runs the dispatch transaction for one request payload.
///
/// Exactly one of three outcomes: the delivery row is committed together with
/// the balance debit (`Ack`); nothing is committed and the message retries
/// (`Nak`); or the payload is undecodable and the message is dropped (`Term`).
/// The caller acknowledges only after this returns `Ack`, so a crash between
/// commit and ack can duplicate a delivery row on redelivery but never lose
/// one.
pub async fn process_request(db: &PgPool, cost: Decimal, payload: &[u8]) -> Disposition {
    let envelope: SmsEnvelope = match serde_json::from_slice(payload) {
        Ok(envelope) => envelope,
        Err(err) => return Disposition::Term(format!("undecodable payload: {err}")),
    };

    let mut tx = match db.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            error!(error = %err, "failed to begin dispatch transaction");
            return Disposition::Nak(RETRY_DELAY);
        }
    };

    let request = SmsCreateDBRequest::from(envelope);

    if let Err(err) = SmsLog::new(&mut tx).add(&request).await {
        error!(error = %err, user_id = request.user_id, "failed to add sms");
        return Disposition::Nak(RETRY_DELAY);
    }

    let new_balance = match Users::new(&mut tx).sub_balance(request.user_id, cost).await {
        Ok(balance) => balance,
        Err(err) => {
            error!(error = %err, user_id = request.user_id, "failed to subtract balance");
            return Disposition::Nak(RETRY_DELAY);
        }
    };

    if let Err(err) = tx.commit().await {
        error!(error = %err, user_id = request.user_id, "failed to commit dispatch transaction");
        return Disposition::Nak(RETRY_DELAY);
    }

    debug!(user_id = request.user_id, new_balance = %new_balance, "dispatched sms");
    Disposition::Ack
}
