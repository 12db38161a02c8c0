//! Database models for users.

use crate::types::UserId;
use rust_decimal::Decimal;
use sqlx::FromRow;

/// A row in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub balance: Decimal,
}

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    /// Starting balance; zero for users funded later by a credit operation.
    pub balance: Decimal,
}
