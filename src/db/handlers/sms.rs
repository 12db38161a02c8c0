//! Database repository for the SMS delivery log.

use crate::{
    db::{
        errors::Result,
        models::sms::{Sms, SmsCreateDBRequest},
    },
    types::UserId,
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct SmsLog<'c> {
    db: &'c mut PgConnection,
}

impl<'c> SmsLog<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert one delivery-log row. `delivered_at` defaults to now.
    #[instrument(skip(self, request), fields(user_id = request.user_id), err)]
    pub async fn add(&mut self, request: &SmsCreateDBRequest) -> Result<Sms> {
        let sms = sqlx::query_as::<_, Sms>(
            r#"
            INSERT INTO sms (user_id, phone_number_id, to_phone_number, message, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, phone_number_id, to_phone_number, message, status, delivered_at
            "#,
        )
        .bind(request.user_id)
        .bind(request.phone_number_id)
        .bind(&request.to_phone_number)
        .bind(&request.message)
        .bind(&request.status)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(sms)
    }

    /// Most recent delivery-log entries for a user, newest first.
    #[instrument(skip(self), err)]
    pub async fn last_messages(&mut self, user_id: UserId, limit: i64) -> Result<Vec<Sms>> {
        let messages = sqlx::query_as::<_, Sms>(
            r#"
            SELECT id, user_id, phone_number_id, to_phone_number, message, status, delivered_at
            FROM sms
            WHERE user_id = $1
            ORDER BY delivered_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        errors::DbError,
        handlers::{PhoneNumbers, Users},
        models::{sms::STATUS_PENDING, users::UserCreateDBRequest},
    };
    use crate::types::PhoneNumberId;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn seed_user_with_number(pool: &PgPool) -> (UserId, PhoneNumberId) {
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let user = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                username: "alice".to_string(),
                balance: Decimal::new(10000, 2),
            })
            .await
            .expect("Failed to create user");
        let number = PhoneNumbers::new(&mut conn)
            .create("alice", "+1234567890")
            .await
            .expect("Failed to create phone number");
        (user.id, number.id)
    }

    fn request(user_id: UserId, phone_number_id: PhoneNumberId, message: &str) -> SmsCreateDBRequest {
        SmsCreateDBRequest {
            user_id,
            phone_number_id,
            to_phone_number: "+0987654321".to_string(),
            message: message.to_string(),
            status: STATUS_PENDING.to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_add_sets_defaults(pool: PgPool) {
        let (user_id, phone_number_id) = seed_user_with_number(&pool).await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let sms = SmsLog::new(&mut conn)
            .add(&request(user_id, phone_number_id, "hi"))
            .await
            .expect("Failed to insert sms");

        assert_eq!(sms.user_id, user_id);
        assert_eq!(sms.phone_number_id, phone_number_id);
        assert_eq!(sms.to_phone_number, "+0987654321");
        assert_eq!(sms.message, "hi");
        assert_eq!(sms.status, STATUS_PENDING);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_add_rejects_unknown_user(pool: PgPool) {
        let (_, phone_number_id) = seed_user_with_number(&pool).await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let result = SmsLog::new(&mut conn)
            .add(&request(99999, phone_number_id, "hi"))
            .await;

        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_add_rejects_unknown_phone_number(pool: PgPool) {
        let (user_id, _) = seed_user_with_number(&pool).await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let result = SmsLog::new(&mut conn).add(&request(user_id, 99999, "hi")).await;

        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_last_messages_orders_newest_first(pool: PgPool) {
        let (user_id, phone_number_id) = seed_user_with_number(&pool).await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut log = SmsLog::new(&mut conn);

        for i in 0..5 {
            log.add(&request(user_id, phone_number_id, &format!("message {i}")))
                .await
                .expect("Failed to insert sms");
        }

        let messages = log.last_messages(user_id, 3).await.expect("Failed to list");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].message, "message 4");
        for pair in messages.windows(2) {
            assert!(pair[0].delivered_at >= pair[1].delivered_at);
        }
    }
}
