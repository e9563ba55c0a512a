//! Common utilities shared across the workspace.
//!
//! This crate provides:
//! - The application error taxonomy and its serialisable error body
//! - Configuration structures
//! - Pagination types for listings

pub mod config;
pub mod error;
pub mod pagination;

pub use config::*;
pub use error::{AppError, AppResult, ErrorResponse, OptionExt};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
