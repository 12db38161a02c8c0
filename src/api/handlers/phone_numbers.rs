//! Phone-number CRUD. Numbers are attached by username and never mutated.

use crate::{
    api::{
        handlers::JsonBody,
        models::{
            phone_numbers::{PhoneNumberCreate, PhoneNumberResponse},
            MsgResponse,
        },
    },
    db::{errors::DbError, handlers::PhoneNumbers},
    errors::{Error, Result},
    types::PhoneNumberId,
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

/// `POST /phone-number`
pub async fn create_phone_number(
    State(state): State<AppState>,
    body: JsonBody<PhoneNumberCreate>,
) -> Result<(StatusCode, Json<PhoneNumberResponse>)> {
    let Json(body) = body.map_err(|err| Error::BadRequest {
        message: err.body_text(),
    })?;

    if body.username.is_empty() || body.phone_number.is_empty() {
        return Err(Error::BadRequest {
            message: "username and phone_number are required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let number = PhoneNumbers::new(&mut conn)
        .create(&body.username, &body.phone_number)
        .await
        .map_err(|err| match err {
            DbError::NotFound => Error::NotFound {
                resource: "user".to_string(),
            },
            other => Error::Database(other),
        })?;

    Ok((StatusCode::CREATED, Json(PhoneNumberResponse::from(number))))
}

/// `GET /phone-number/{id}`
pub async fn get_phone_number(
    State(state): State<AppState>,
    Path(id): Path<PhoneNumberId>,
) -> Result<Json<PhoneNumberResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let number = PhoneNumbers::new(&mut conn)
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "phone number".to_string(),
        })?;

    Ok(Json(PhoneNumberResponse::from(number)))
}

/// `DELETE /phone-number/{id}`
pub async fn delete_phone_number(
    State(state): State<AppState>,
    Path(id): Path<PhoneNumberId>,
) -> Result<Json<MsgResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = PhoneNumbers::new(&mut conn).delete(id).await?;

    if !deleted {
        return Err(Error::NotFound {
            resource: "phone number".to_string(),
        });
    }

    Ok(Json(MsgResponse::ok()))
}

/// `GET /phone-number/user/{username}`
pub async fn list_user_phone_numbers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<PhoneNumberResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let numbers = PhoneNumbers::new(&mut conn).list_by_username(&username).await?;

    Ok(Json(numbers.into_iter().map(PhoneNumberResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, seed_user, MockPublisher};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use sqlx::PgPool;
    use std::sync::Arc;

    fn server(pool: PgPool) -> axum_test::TestServer {
        create_test_app(pool, Arc::new(MockPublisher::default()), Decimal::ONE)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn create_get_and_delete_phone_number(pool: PgPool) {
        seed_user(&pool, "alice", "0").await;
        let server = server(pool);

        let created = server
            .post("/phone-number")
            .json(&json!({"username": "alice", "phone_number": "+1234567890"}))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
        let number = created.json::<PhoneNumberResponse>();
        assert_eq!(number.phone_number, "+1234567890");

        let fetched = server.get(&format!("/phone-number/{}", number.id)).await;
        assert_eq!(fetched.status_code(), StatusCode::OK);

        let deleted = server.delete(&format!("/phone-number/{}", number.id)).await;
        assert_eq!(deleted.status_code(), StatusCode::OK);
        assert_eq!(deleted.json::<Value>(), json!({"msg": "OK"}));

        let gone = server.get(&format!("/phone-number/{}", number.id)).await;
        assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn create_for_unknown_user_is_not_found(pool: PgPool) {
        let server = server(pool);

        let response = server
            .post("/phone-number")
            .json(&json!({"username": "nobody", "phone_number": "+1234567890"}))
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>(), json!({"error": "user not found"}));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn duplicate_number_conflicts(pool: PgPool) {
        seed_user(&pool, "alice", "0").await;
        let server = server(pool);

        server
            .post("/phone-number")
            .json(&json!({"username": "alice", "phone_number": "+1234567890"}))
            .await;
        let response = server
            .post("/phone-number")
            .json(&json!({"username": "alice", "phone_number": "+1234567890"}))
            .await;

        assert_eq!(response.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            response.json::<Value>(),
            json!({"error": "phone number already exists"})
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn list_by_user_returns_only_their_numbers(pool: PgPool) {
        seed_user(&pool, "alice", "0").await;
        seed_user(&pool, "bob", "0").await;
        let server = server(pool);

        for (user, number) in [("alice", "+111"), ("alice", "+222"), ("bob", "+333")] {
            server
                .post("/phone-number")
                .json(&json!({"username": user, "phone_number": number}))
                .await;
        }

        let response = server.get("/phone-number/user/alice").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let numbers = response.json::<Vec<PhoneNumberResponse>>();
        assert_eq!(numbers.len(), 2);
    }
}
