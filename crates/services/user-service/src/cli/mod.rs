//! CLI module - Command-line interface for the user service.
//!
//! Provides commands for:
//! - `migrate` - Database migrations
//! - `users` - User account management

pub mod args;

pub use args::{Cli, Commands};
