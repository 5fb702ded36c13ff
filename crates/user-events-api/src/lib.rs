//! User events HTTP API.
//!
//! Exposes event creation and query over axum and wires the aggregation
//! scheduler and the `PostgreSQL` store together in the binary.

pub mod config;
pub mod error;
pub mod observability;
pub mod routes;
pub mod state;
