//! Rust client for the Continuum decision-memory knowledge graph.
//!
//! This crate is intentionally thin today: it carries the error type a
//! future transport (HTTP or gRPC) would return. No transport is wired up
//! yet — see `Cargo.toml` for which teacher dependencies were kept for that
//! future surface and which were dropped.

pub mod error;

pub use error::{ClientError, Result};
