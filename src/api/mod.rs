//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response structures
//!
//! The only core endpoint is `POST /sms`; the remaining routes are plain CRUD
//! over the same store plus the `/health` probe expected by deployment
//! tooling.

pub mod handlers;
pub mod models;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the application router with all endpoints and tracing middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/sms", post(handlers::sms::send_sms))
        .route("/sms/user/{username}", get(handlers::sms::list_user_sms))
        .route("/user", post(handlers::users::create_user))
        .route("/user/{username}/id", get(handlers::users::get_user_id))
        .route("/user/{username}/balance", get(handlers::users::get_user_balance))
        .route("/user/{username}/credit", post(handlers::users::credit_user))
        .route("/phone-number", post(handlers::phone_numbers::create_phone_number))
        .route("/phone-number/{id}", get(handlers::phone_numbers::get_phone_number))
        .route("/phone-number/{id}", delete(handlers::phone_numbers::delete_phone_number))
        .route(
            "/phone-number/user/{username}",
            get(handlers::phone_numbers::list_user_phone_numbers),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
