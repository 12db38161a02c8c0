use crate::db::models::phone_numbers::PhoneNumber;
use crate::types::{PhoneNumberId, UserId};
use serde::{Deserialize, Serialize};

/// Request body for `POST /phone-number`.
#[derive(Debug, Clone, Deserialize)]
pub struct PhoneNumberCreate {
    pub username: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneNumberResponse {
    pub id: PhoneNumberId,
    pub user_id: UserId,
    pub phone_number: String,
}

impl From<PhoneNumber> for PhoneNumberResponse {
    fn from(number: PhoneNumber) -> Self {
        Self {
            id: number.id,
            user_id: number.user_id,
            phone_number: number.phone_number,
        }
    }
}
