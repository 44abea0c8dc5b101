//! Continuum: a decision-memory knowledge graph for engineering teams.
//!
//! This crate maintains a graph of architectural decisions, the entities
//! they touch, and the commits and conversations that created or challenged
//! them, so an agent or a human can ask "why does this code look like
//! this" and get a grounded answer instead of a guess.
//!
//! # Features
//!
//! - **Decision extraction**: turns free-form agent/human conversation into
//!   structured `Decision` and `CandidateDecision` nodes.
//! - **Entity resolution**: matches extracted entity mentions onto a
//!   per-tenant entity graph instead of minting duplicates.
//! - **Relationship analysis**: derives `SUPERSEDES`/`CONTRADICTS`/
//!   `SIMILAR_TO` edges between decisions as the graph grows.
//! - **Resilience substrate**: circuit breakers, retry/backoff, rate
//!   limiting, caching and write-batching shared by every upstream call.
//! - **Embedded storage**: `sled` for durability, `petgraph` for in-memory
//!   traversal.
//!
//! # Quick Start
//!
//! `Continuum` takes its LLM and embedding providers as injected
//! collaborators (spec §1 treats "hosting LLMs" as a non-goal — this crate
//! only defines the provider contract, not an implementation of it):
//!
//! ```no_run
//! use continuum_core::llm::{ChatMessage, EmbeddingProvider, LlmProvider, LlmUsage};
//! use continuum_core::{Config, Continuum};
//! use continuum_types::CoreError;
//! use std::sync::Arc;
//!
//! struct MyProvider;
//!
//! #[async_trait::async_trait]
//! impl LlmProvider for MyProvider {
//!     fn model_name(&self) -> &str { "my-model" }
//!     async fn generate(
//!         &self,
//!         messages: &[ChatMessage],
//!         temperature: f32,
//!         max_tokens: u32,
//!     ) -> Result<(String, LlmUsage), CoreError> {
//!         unimplemented!()
//!     }
//!     async fn generate_stream(
//!         &self,
//!         messages: &[ChatMessage],
//!         temperature: f32,
//!         max_tokens: u32,
//!     ) -> Result<futures::stream::BoxStream<'static, Result<String, CoreError>>, CoreError> {
//!         unimplemented!()
//!     }
//! }
//!
//! #[async_trait::async_trait]
//! impl EmbeddingProvider for MyProvider {
//!     fn dimensions(&self) -> usize { 768 }
//!     async fn embed(&self, texts: &[String], input_type: &str) -> Result<Vec<Vec<f32>>, CoreError> {
//!         unimplemented!()
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let provider = Arc::new(MyProvider);
//! let continuum = Continuum::open(
//!     std::path::Path::new("./data"),
//!     config,
//!     provider.clone(),
//!     None,
//!     provider,
//! )?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent_context;
pub mod analyzers;
pub mod engine;
pub mod export;
pub mod extraction;
pub mod graph;
pub mod llm;
pub mod notifications;
pub mod resilience;
pub mod telemetry;

pub use continuum_types::{Config, CoreError, Result};
pub use engine::Continuum;

/// Current version of the Continuum library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
