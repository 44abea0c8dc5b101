//! Markdown export of decisions and conversations (spec §6,
//! SPEC_FULL.md §12). The only import/export surface this crate
//! implements — bulk import/export beyond this stays with the external
//! HTTP/CLI collaborators.

pub mod markdown;

pub use markdown::{export_conversation, write_decisions_log};
