//! SMS ingress: the admission check and enqueue path.

use crate::{
    api::{
        handlers::{map_user_lookup, JsonBody},
        models::{
            sms::{ListSmsQuery, SendSmsQuery, SendSmsRequest, SmsResponse},
            MsgResponse,
        },
    },
    db::{
        handlers::{SmsLog, Users},
        models::sms::{SmsEnvelope, STATUS_PENDING},
    },
    errors::{Error, Result},
    subject::SmsSubject,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use tracing::debug;

/// Bound enforced by the `sms.message` column.
const MAX_MESSAGE_LEN: usize = 160;

/// Bound enforced by the `sms.to_phone_number` column.
const MAX_PHONE_NUMBER_LEN: usize = 15;

/// `POST /sms?express={bool}`
///
/// Validates the request, reads the sender's balance as an advisory
/// pre-filter, and publishes the envelope to the priority-matched subject.
/// Returns once the broker has durably accepted the message; the worker's
/// transactional debit remains the authoritative balance gate.
pub async fn send_sms(
    State(state): State<AppState>,
    Query(query): Query<SendSmsQuery>,
    body: JsonBody<SendSmsRequest>,
) -> Result<Json<MsgResponse>> {
    let Json(body) = body.map_err(|err| Error::BadRequest {
        message: err.body_text(),
    })?;

    let subject = SmsSubject::request(query.express);

    if body.to_phone_number.is_empty() || body.message.is_empty() {
        return Err(Error::BadRequest {
            message: "to_phone_number and message are required".to_string(),
        });
    }
    if body.message.len() > MAX_MESSAGE_LEN {
        return Err(Error::BadRequest {
            message: format!("message exceeds {MAX_MESSAGE_LEN} characters"),
        });
    }
    if body.to_phone_number.len() > MAX_PHONE_NUMBER_LEN {
        return Err(Error::BadRequest {
            message: format!("to_phone_number exceeds {MAX_PHONE_NUMBER_LEN} characters"),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let balance = Users::new(&mut conn)
        .get_balance(body.user_id)
        .await
        .map_err(map_user_lookup)?;

    if balance < state.cost {
        return Err(Error::InsufficientBalance);
    }

    let envelope = SmsEnvelope {
        user_id: body.user_id,
        phone_number_id: body.phone_number_id,
        to_phone_number: body.to_phone_number,
        message: body.message,
        status: body.status.unwrap_or_else(|| STATUS_PENDING.to_string()),
    };
    let payload = serde_json::to_vec(&envelope).map_err(anyhow::Error::from)?;

    let sequence = state.publisher.publish(subject, payload.into()).await?;
    debug!(subject = %subject, sequence, "queued sms dispatch");

    Ok(Json(MsgResponse::ok()))
}

/// `GET /sms/user/{username}?limit=` - most recent delivery-log entries.
pub async fn list_user_sms(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<ListSmsQuery>,
) -> Result<Json<Vec<SmsResponse>>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user_id = Users::new(&mut conn)
        .get_user_id(&username)
        .await
        .map_err(map_user_lookup)?;
    let messages = SmsLog::new(&mut conn).last_messages(user_id, limit).await?;

    Ok(Json(messages.into_iter().map(SmsResponse::from).collect()))
}
