//! Shared types, errors, and configuration for Kasa.
//!
//! This crate provides common types used across all other crates:
//! - Typed integer IDs for entity references
//! - Validated three-letter currency codes
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
