//! Repository implementations, one per table.

pub mod phone_numbers;
pub mod sms;
pub mod users;

pub use phone_numbers::PhoneNumbers;
pub use sms::SmsLog;
pub use users::Users;
