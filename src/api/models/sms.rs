use crate::db::models::sms::Sms;
use crate::types::{PhoneNumberId, SmsId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for `POST /sms`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendSmsRequest {
    pub user_id: UserId,
    pub phone_number_id: PhoneNumberId,
    pub to_phone_number: String,
    pub message: String,
    /// Defaults to `pending` when omitted.
    #[serde(default)]
    pub status: Option<String>,
}

/// Query flag selecting the priority class.
#[derive(Debug, Clone, Deserialize)]
pub struct SendSmsQuery {
    #[serde(default)]
    pub express: bool,
}

/// Query parameters for listing a user's delivery log.
#[derive(Debug, Clone, Deserialize)]
pub struct ListSmsQuery {
    pub limit: Option<i64>,
}

/// A delivery-log entry as returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsResponse {
    pub id: SmsId,
    pub user_id: UserId,
    pub phone_number_id: PhoneNumberId,
    pub to_phone_number: String,
    pub message: String,
    pub status: String,
    pub delivered_at: DateTime<Utc>,
}

impl From<Sms> for SmsResponse {
    fn from(sms: Sms) -> Self {
        Self {
            id: sms.id,
            user_id: sms.user_id,
            phone_number_id: sms.phone_number_id,
            to_phone_number: sms.to_phone_number,
            message: sms.message,
            status: sms.status,
            delivered_at: sms.delivered_at,
        }
    }
}
