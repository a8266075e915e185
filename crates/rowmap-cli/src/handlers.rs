//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod check;
mod completions;
mod config;
mod convert;
mod mappings;
mod utils;

pub use check::handle_check;
pub use completions::handle_completions;
pub use config::handle_config;
pub use convert::{handle_from_persistence, handle_to_persistence};
pub use mappings::handle_mappings;
