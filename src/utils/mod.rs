// src/utils/mod.rs
//! Shared utilities
//!
//! - **errors**: Framework error type and `Result` alias
//! - **config**: Layered configuration (defaults, file, environment)

pub mod config;
pub mod errors;

pub use config::{InterposeConfig, LoggingConfig, ProxyDefaults};
pub use errors::{AopError, Result};
