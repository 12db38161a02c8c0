pub mod phone_numbers;
pub mod sms;
pub mod users;

use serde::Serialize;

/// Body returned by mutating endpoints on success.
#[derive(Debug, Serialize)]
pub struct MsgResponse {
    pub msg: &'static str,
}

impl MsgResponse {
    pub fn ok() -> Self {
        Self { msg: "OK" }
    }
}
