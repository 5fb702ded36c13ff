//! Domain layer for the Ingestion context.

pub mod commands;
pub mod queries;
pub mod timestamp;
