//! Logging/observability helpers shared across the pipeline (SPEC_FULL.md §10.1, §12).

pub mod redact;

pub use redact::{sanitize_for_logging, sanitize_json_value, sanitize_user_id};
