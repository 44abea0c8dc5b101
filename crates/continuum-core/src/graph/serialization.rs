//! Node/edge encoding for the `sled` backend.
//!
//! The teacher's storage layer (`src/storage/serialization.rs`) is declared
//! but absent from this pack; only `mod.rs`'s `StorageBackend` trait shape
//! survives. MessagePack via `rmp-serde` was already a workspace dependency,
//! so it is used directly here rather than falling back to JSON the way
//! `ApiliumCode-aingle`'s `hope_agents::persistence` placeholder does for its
//! `Binary`/`MessagePack` variants — this is the real storage path, not a
//! stub.

use continuum_types::CoreError;
use serde::{de::DeserializeOwned, Serialize};

/// Encode a value to its on-disk MessagePack representation.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    rmp_serde::to_vec(value).map_err(|e| CoreError::StorageFailure(format!("encode failed: {e}")))
}

/// Decode a value from its on-disk MessagePack representation.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    rmp_serde::from_slice(bytes).map_err(|e| CoreError::StorageFailure(format!("decode failed: {e}")))
}
