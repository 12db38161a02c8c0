//! Identifier aliases shared across the API, store, and worker.

/// Serial id of a row in `users`.
pub type UserId = i32;

/// Serial id of a row in `phone_numbers`.
pub type PhoneNumberId = i32;

/// Serial id of a row in `sms`.
pub type SmsId = i32;
