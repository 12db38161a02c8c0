//! User management: creation, id lookup, and the administrative credit
//! operation. Plain CRUD over the same store as the dispatch path.

use crate::{
    api::{
        handlers::{map_user_lookup, JsonBody},
        models::users::{BalanceResponse, CreditRequest, UserCreate, UserIdResponse, UserResponse},
    },
    db::{handlers::Users, models::users::UserCreateDBRequest},
    errors::{Error, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;

/// `POST /user`
pub async fn create_user(
    State(state): State<AppState>,
    body: JsonBody<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let Json(body) = body.map_err(|err| Error::BadRequest {
        message: err.body_text(),
    })?;

    if body.username.is_empty() {
        return Err(Error::BadRequest {
            message: "username is required".to_string(),
        });
    }

    let balance = body.balance.unwrap_or(Decimal::ZERO);
    if balance < Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "balance must not be negative".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: body.username,
            balance,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// `GET /user/{username}/id`
pub async fn get_user_id(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserIdResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let id = Users::new(&mut conn)
        .get_user_id(&username)
        .await
        .map_err(map_user_lookup)?;

    Ok(Json(UserIdResponse { id }))
}

/// `GET /user/{username}/balance`
pub async fn get_user_balance(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<BalanceResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let user_id = users.get_user_id(&username).await.map_err(map_user_lookup)?;
    let balance = users.get_balance(user_id).await?;

    Ok(Json(BalanceResponse { user_id, balance }))
}

/// `POST /user/{username}/credit` - administrative credit. Returns the new
/// balance.
pub async fn credit_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    body: JsonBody<CreditRequest>,
) -> Result<Json<BalanceResponse>> {
    let Json(body) = body.map_err(|err| Error::BadRequest {
        message: err.body_text(),
    })?;

    if body.amount <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "amount must be greater than zero".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let user_id = users.get_user_id(&username).await.map_err(map_user_lookup)?;
    let balance = users.add_balance(user_id, body.amount).await?;

    Ok(Json(BalanceResponse { user_id, balance }))
}
