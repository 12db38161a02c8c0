//! Database repository for users and their balances.

use crate::{
    db::{
        errors::Result,
        models::users::{User, UserCreateDBRequest},
    },
    types::UserId,
};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{instrument, trace};

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create a new user with the given starting balance.
    #[instrument(skip(self, request), fields(username = %request.username), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, balance)
            VALUES ($1, $2)
            RETURNING id, username, balance
            "#,
        )
        .bind(&request.username)
        .bind(request.balance)
        .fetch_one(&mut *self.db)
        .await?;

        trace!("Created user {} with id {}", user.username, user.id);

        Ok(user)
    }

    /// Resolve a username to its id.
    #[instrument(skip(self), err)]
    pub async fn get_user_id(&mut self, username: &str) -> Result<UserId> {
        let id = sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(id)
    }

    /// Current balance for a user. Read-consistent with subsequent writes when
    /// called on an open transaction.
    #[instrument(skip(self), err)]
    pub async fn get_balance(&mut self, user_id: UserId) -> Result<Decimal> {
        let balance = sqlx::query_scalar::<_, Decimal>("SELECT balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(balance)
    }

    /// Administrative credit. Returns the new balance.
    #[instrument(skip(self), err)]
    pub async fn add_balance(&mut self, user_id: UserId, amount: Decimal) -> Result<Decimal> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE users
            SET balance = balance + $2
            WHERE id = $1
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(balance)
    }

    /// Atomic conditional debit. Fails with `DbError::NotFound` when the user
    /// does not exist or the remaining balance does not cover `amount`, so the
    /// balance never goes negative. Returns the new balance.
    #[instrument(skip(self), err)]
    pub async fn sub_balance(&mut self, user_id: UserId, amount: Decimal) -> Result<Decimal> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE users
            SET balance = balance - $2
            WHERE id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(balance)
    }
}
