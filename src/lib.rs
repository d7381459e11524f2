// src/lib.rs
//! Interpose: runtime interception for Rust objects
//!
//! Wrap a target object in a [`Proxy`] exposing the same capabilities and
//! route every call through an ordered chain of advice.
//!
//! # Architecture
//!
//! - **invocation**: Call model (capabilities, methods, values, faults) and
//!   per-call state
//! - **advice**: The interceptor contract and built-in advice
//! - **proxy**: Configuration, factory, the proxy handle, declarative assembly
//! - **introduction**: Mixins that add capabilities to a proxy
//! - **pointcut**: Regexp and attribute-driven selection, rollback rules
//! - **transaction**: Transaction demarcation on top of rollback rules
//! - **observability**: Tracing subscriber and metric descriptions
//! - **utils**: Configuration and errors
//!
//! ```text
//! caller ──► Proxy ──► advice[0] ──► advice[1] ──► … ──► TargetInvoker ──► target
//!               ▲           │             │                    │
//!               └───────────┴─────────────┴────── result ──────┘
//! ```

// Public module exports
pub mod advice;
pub mod introduction;
pub mod invocation;
pub mod observability;
pub mod pointcut;
pub mod proxy;
pub mod transaction;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use advice::{Advice, Interceptor};
pub use introduction::{DelegatingIntroduction, IntroductionInterceptor};
pub use invocation::{
    current_invocation, current_proxy, Arguments, Capability, ErrorClass, Fault, FromValue,
    Invocation, IntoValue, Method, MethodSignature, ObjectRef, SelfRef, Target, Value,
};
pub use pointcut::{MethodPointcut, RegexpMethodPointcut, RollbackRule};
pub use proxy::{AdvisedConfig, ObjectRegistry, Proxy, ProxyDefinition, ProxyFactory};
pub use utils::config::InterposeConfig;
pub use utils::errors::{AopError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
