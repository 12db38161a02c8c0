use crate::db::models::users::User;
use crate::types::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request body for `POST /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    /// Starting balance; omitted means zero.
    #[serde(default)]
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub balance: Decimal,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            balance: user.balance,
        }
    }
}

/// Request body for the administrative credit operation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdResponse {
    pub id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub balance: Decimal,
}
