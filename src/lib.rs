//! sortbox - sort a directory tree into category folders by file extension.
//!
//! The library exposes the classifier ([`ExtensionTable`]), the organization
//! engine ([`Organizer`]) with its duplicate-safe naming and dry-run mode,
//! TOML configuration, and the injected activity log the engine reports to.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;

pub use config::{CompiledFilters, Config, ConfigError};
pub use file_category::{Category, ExtensionTable, FALLBACK_CATEGORY};
pub use file_organizer::{
    MoveDecision, OrganizeError, Organizer, PlannedPaths, RunReport, resolve_duplicate,
};
pub use logging::{ActivityLog, MemoryLog, TracingLog};

pub use cli::{Cli, OrganizeCommand, run_cli};
