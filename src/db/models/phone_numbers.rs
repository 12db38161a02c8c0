//! Database models for phone numbers.

use crate::types::{PhoneNumberId, UserId};
use sqlx::FromRow;

/// A row in the `phone_numbers` table. Each number belongs to exactly one
/// user and is never mutated after creation.
#[derive(Debug, Clone, FromRow)]
pub struct PhoneNumber {
    pub id: PhoneNumberId,
    pub user_id: UserId,
    pub phone_number: String,
}
