// src/utils/errors.rs
//! Error types for the interception framework
//!
//! Every failure a caller can observe falls into one of three groups:
//!
//! - configuration errors, reported when a proxy configuration is assembled
//!   or built
//! - invocation protocol violations, reported at the point of misuse
//! - target faults, passed through unchanged as [`AopError::Target`]

use crate::invocation::fault::Fault;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AopError>;

/// Framework error
#[derive(Debug, Clone, Error)]
pub enum AopError {
    #[error("Invalid proxy configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Cannot build a proxy without advice")]
    EmptyAdviceChain,

    #[error("Cannot build a proxy that exposes no capabilities")]
    NoCapabilities,

    #[error("No target configured and the advice chain does not end in terminal advice")]
    MissingTarget,

    #[error("Advice '{advice}' would be unreachable behind terminal advice '{terminal}'")]
    UnreachableAdvice { advice: String, terminal: String },

    #[error("Object '{0}' is not advice")]
    NotAdvice(String),

    #[error("Unknown object: {0}")]
    UnknownObject(String),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invocation already completed: all {length} advice entries have been invoked")]
    ChainExhausted { length: usize },

    #[error("Index {index} out of range (length {length})")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("No invocation is exposed on this thread (is expose_invocation enabled?)")]
    NoCurrentInvocation,

    #[error("Proxy has been released")]
    ProxyReleased,

    #[error("No transaction is active for the current invocation")]
    NoActiveTransaction,

    #[error("Capability '{0}' is not exposed by this object")]
    UnsupportedCapability(String),

    #[error("No method '{method}' on capability '{capability}'")]
    NoSuchMethod { capability: String, method: String },

    #[error("Method {method} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Target(#[from] Fault),
}

impl AopError {
    /// Whether this error is a fault raised by target code
    pub fn is_target_fault(&self) -> bool {
        matches!(self, AopError::Target(_))
    }

    /// The target fault carried by this error, if any
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            AopError::Target(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for AopError {
    fn from(err: config::ConfigError) -> Self {
        AopError::ConfigError(err.to_string())
    }
}

impl From<serde_yaml::Error> for AopError {
    fn from(err: serde_yaml::Error) -> Self {
        AopError::ConfigError(err.to_string())
    }
}
