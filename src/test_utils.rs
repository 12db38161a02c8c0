//! Test utilities shared by the API handler tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;

use crate::broker::{BrokerError, Publisher};
use crate::db::{
    handlers::{PhoneNumbers, Users},
    models::users::UserCreateDBRequest,
};
use crate::subject::SmsSubject;
use crate::types::{PhoneNumberId, UserId};
use crate::{api, AppState};

/// Publisher double that records published envelopes instead of reaching a
/// broker. Flip `fail` to simulate a broker outage.
#[derive(Default)]
pub struct MockPublisher {
    published: Mutex<Vec<(SmsSubject, Bytes)>>,
    fail: AtomicBool,
}

impl MockPublisher {
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.fail.store(true, Ordering::Relaxed);
        publisher
    }

    /// Drain everything published so far.
    pub fn take(&self) -> Vec<(SmsSubject, Bytes)> {
        std::mem::take(&mut *self.published.lock())
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, subject: SmsSubject, payload: Bytes) -> Result<u64, BrokerError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(BrokerError::UnboundStream {
                name: subject.stream().to_string(),
            });
        }
        let mut published = self.published.lock();
        published.push((subject, payload));
        Ok(published.len() as u64)
    }
}

pub fn create_test_app(pool: PgPool, publisher: Arc<MockPublisher>, cost: Decimal) -> TestServer {
    let state = AppState::builder().db(pool).publisher(publisher).cost(cost).build();
    TestServer::new(api::build_router(state)).expect("Failed to create test server")
}

pub async fn seed_user(pool: &PgPool, username: &str, balance: &str) -> UserId {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            balance: Decimal::from_str(balance).unwrap(),
        })
        .await
        .expect("Failed to create test user")
        .id
}

pub async fn seed_phone_number(pool: &PgPool, username: &str, phone_number: &str) -> PhoneNumberId {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    PhoneNumbers::new(&mut conn)
        .create(username, phone_number)
        .await
        .expect("Failed to create test phone number")
        .id
}
