//! Axum route handlers.

pub mod health;
pub mod phone_numbers;
pub mod sms;
pub mod users;

use crate::db::errors::DbError;
use crate::errors::Error;

/// Body extractor result; the handlers map a rejection to a 400 so malformed
/// and incomplete bodies share one status.
pub(crate) type JsonBody<T> =
    std::result::Result<axum::Json<T>, axum::extract::rejection::JsonRejection>;

/// Maps a failed user lookup to a 404 instead of the generic store error.
pub(crate) fn map_user_lookup(err: DbError) -> Error {
    match err {
        DbError::NotFound => Error::NotFound {
            resource: "user".to_string(),
        },
        other => Error::Database(other),
    }
}
