//! User Events Core: shared domain abstractions.
//!
//! This crate defines the event and bucket types, the error taxonomy and the
//! store capability traits that the ingestion, aggregation and storage crates
//! depend on. It contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod event;
pub mod repository;
