//! Database repository for phone numbers.

use crate::{
    db::{
        errors::{DbError, Result},
        models::phone_numbers::PhoneNumber,
    },
    types::{PhoneNumberId, UserId},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct PhoneNumbers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PhoneNumbers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Attach a number to the user with the given username.
    ///
    /// Fails with `DbError::NotFound` for an unknown user and
    /// `DbError::UniqueViolation` for a number already registered.
    #[instrument(skip(self), err)]
    pub async fn create(&mut self, username: &str, phone_number: &str) -> Result<PhoneNumber> {
        let user_id = sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        let phone_number = sqlx::query_as::<_, PhoneNumber>(
            r#"
            INSERT INTO phone_numbers (user_id, phone_number)
            VALUES ($1, $2)
            RETURNING id, user_id, phone_number
            "#,
        )
        .bind(user_id)
        .bind(phone_number)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(phone_number)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, id: PhoneNumberId) -> Result<Option<PhoneNumber>> {
        let phone_number = sqlx::query_as::<_, PhoneNumber>(
            "SELECT id, user_id, phone_number FROM phone_numbers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(phone_number)
    }

    /// Remove a number. Returns `false` when no row matched.
    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: PhoneNumberId) -> Result<bool> {
        let deleted = sqlx::query_scalar::<_, PhoneNumberId>(
            "DELETE FROM phone_numbers WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(deleted.is_some())
    }

    /// All numbers owned by the user with the given username.
    #[instrument(skip(self), err)]
    pub async fn list_by_username(&mut self, username: &str) -> Result<Vec<PhoneNumber>> {
        let numbers = sqlx::query_as::<_, PhoneNumber>(
            r#"
            SELECT pn.id, pn.user_id, pn.phone_number
            FROM phone_numbers pn
            JOIN users u ON pn.user_id = u.id
            WHERE u.username = $1
            ORDER BY pn.id
            "#,
        )
        .bind(username)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(numbers)
    }

    /// Resolve a `(user, number)` pair to the number's id.
    #[instrument(skip(self), err)]
    pub async fn get_phone_number_id(
        &mut self,
        user_id: UserId,
        phone_number: &str,
    ) -> Result<Option<PhoneNumberId>> {
        let id = sqlx::query_scalar::<_, PhoneNumberId>(
            "SELECT id FROM phone_numbers WHERE user_id = $1 AND phone_number = $2",
        )
        .bind(user_id)
        .bind(phone_number)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{handlers::Users, models::users::UserCreateDBRequest};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn create_user(pool: &PgPool, username: &str) -> UserId {
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                balance: Decimal::ZERO,
            })
            .await
            .expect("Failed to create user")
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_phone_number(pool: PgPool) {
        let user_id = create_user(&pool, "alice").await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut numbers = PhoneNumbers::new(&mut conn);

        let created = numbers
            .create("alice", "+1234567890")
            .await
            .expect("Failed to create phone number");
        assert_eq!(created.user_id, user_id);
        assert_eq!(created.phone_number, "+1234567890");

        let fetched = numbers
            .get(created.id)
            .await
            .expect("Failed to get phone number")
            .expect("Phone number missing");
        assert_eq!(fetched.phone_number, "+1234567890");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_for_unknown_user(pool: PgPool) {
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let result = PhoneNumbers::new(&mut conn).create("nobody", "+1234567890").await;

        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_number_is_a_unique_violation(pool: PgPool) {
        create_user(&pool, "alice").await;
        create_user(&pool, "bob").await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut numbers = PhoneNumbers::new(&mut conn);

        numbers
            .create("alice", "+1234567890")
            .await
            .expect("Failed to create phone number");
        let result = numbers.create("bob", "+1234567890").await;

        assert!(matches!(result, Err(DbError::UniqueViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_phone_number(pool: PgPool) {
        create_user(&pool, "alice").await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut numbers = PhoneNumbers::new(&mut conn);

        let created = numbers
            .create("alice", "+1234567890")
            .await
            .expect("Failed to create phone number");

        assert!(numbers.delete(created.id).await.expect("Failed to delete"));
        assert!(numbers.get(created.id).await.expect("Failed to get").is_none());

        // Second delete finds nothing
        assert!(!numbers.delete(created.id).await.expect("Failed to delete"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_by_username(pool: PgPool) {
        create_user(&pool, "alice").await;
        create_user(&pool, "bob").await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut numbers = PhoneNumbers::new(&mut conn);

        numbers.create("alice", "+111").await.expect("Failed to create");
        numbers.create("alice", "+222").await.expect("Failed to create");
        numbers.create("bob", "+333").await.expect("Failed to create");

        let listed = numbers.list_by_username("alice").await.expect("Failed to list");
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|n| n.phone_number != "+333"));

        let empty = numbers.list_by_username("nobody").await.expect("Failed to list");
        assert!(empty.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_phone_number_id(pool: PgPool) {
        let user_id = create_user(&pool, "alice").await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut numbers = PhoneNumbers::new(&mut conn);

        let created = numbers.create("alice", "+1234567890").await.expect("Failed to create");

        let id = numbers
            .get_phone_number_id(user_id, "+1234567890")
            .await
            .expect("Failed to resolve");
        assert_eq!(id, Some(created.id));

        let missing = numbers
            .get_phone_number_id(user_id, "+0000000000")
            .await
            .expect("Failed to resolve");
        assert_eq!(missing, None);
    }
}
