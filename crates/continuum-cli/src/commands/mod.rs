//! CLI command implementations
//!
//! Each command is organized into its own submodule for better maintainability.

pub mod agent;
pub mod decision;
pub mod entity;
pub mod export;
pub mod notification;
pub mod search;
pub mod stats;

use continuum_core::Continuum;
use continuum_types::UserId;

use crate::output::OutputFormat;

/// Common context passed to all commands
pub struct CommandContext<'a> {
    pub continuum: &'a Continuum,
    pub format: &'a OutputFormat,
    pub user_id: &'a UserId,
}

impl<'a> CommandContext<'a> {
    pub fn new(continuum: &'a Continuum, format: &'a OutputFormat, user_id: &'a UserId) -> Self {
        Self { continuum, format, user_id }
    }
}
