//! CLI command implementations.

pub mod common;
pub mod config;
pub mod mutate;
pub mod query;
pub mod rebuild;
pub mod resolve;
