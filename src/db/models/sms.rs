//! Database models for the SMS delivery log, and the broker envelope that
//! mirrors its row shape.

use crate::types::{PhoneNumberId, SmsId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Delivery status recorded when the worker first inserts the row. Carrier
/// integration is simulated, so rows stay `pending` in this gateway.
pub const STATUS_PENDING: &str = "pending";

/// A row in the `sms` table. Inserted exactly once by a successful dispatch
/// transaction; there is no update path.
#[derive(Debug, Clone, FromRow)]
pub struct Sms {
    pub id: SmsId,
    pub user_id: UserId,
    pub phone_number_id: PhoneNumberId,
    pub to_phone_number: String,
    pub message: String,
    pub status: String,
    pub delivered_at: DateTime<Utc>,
}

/// Database request for inserting a delivery-log row.
#[derive(Debug, Clone)]
pub struct SmsCreateDBRequest {
    pub user_id: UserId,
    pub phone_number_id: PhoneNumberId,
    pub to_phone_number: String,
    pub message: String,
    pub status: String,
}

/// The JSON payload carried on the request subjects. Field-for-field the
/// insertable part of an [`Sms`] row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsEnvelope {
    pub user_id: UserId,
    pub phone_number_id: PhoneNumberId,
    pub to_phone_number: String,
    pub message: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    STATUS_PENDING.to_string()
}

impl From<SmsEnvelope> for SmsCreateDBRequest {
    fn from(envelope: SmsEnvelope) -> Self {
        Self {
            user_id: envelope.user_id,
            phone_number_id: envelope.phone_number_id,
            to_phone_number: envelope.to_phone_number,
            message: envelope.message,
            status: envelope.status,
        }
    }
}
