//! Shared types, errors, and configuration for Beneficio.
//!
//! This crate provides common building blocks used across all other crates:
//! - Two-decimal fixed-point arithmetic for money and weights
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use types::money::{self, FixedParseError};
