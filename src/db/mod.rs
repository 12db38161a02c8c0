//! Database layer for the ledger and delivery log.
//!
//! Follows the repository pattern over SQLx/PostgreSQL: [`handlers`] hold the
//! queries for each table, [`models`] mirror the table rows, and [`errors`]
//! translate driver errors into a taxonomy the callers can match on.
//!
//! Repositories borrow a `PgConnection`, so they compose with either a pooled
//! connection (read paths in the API) or an open transaction (the worker's
//! dispatch transaction).

pub mod errors;
pub mod handlers;
pub mod models;
