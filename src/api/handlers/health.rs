//! Liveness probe for deployment tooling.

pub async fn health() -> &'static str {
    "OK"
}
