//! The decision-memory graph: storage contract, embedded `sled` backend,
//! on-disk encoding, the write path (`GraphWriter`), and read-side query
//! helpers built on `petgraph` (spec §3, §4.5, §6).

pub mod queries;
pub mod serialization;
pub mod sled_backend;
pub mod storage;
pub mod writer;

pub use queries::{contains_search, contains_search_for_user, direct_neighbors, expand_subgraph, Subgraph};
pub use serialization::{decode, encode};
pub use sled_backend::SledGraphStorage;
pub use storage::{GraphStorage, StorageStats};
pub use writer::{AffectedFile, GraphWriter, MentionedEntity, StorageEntityStore};
