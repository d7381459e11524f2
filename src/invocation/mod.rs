// src/invocation/mod.rs
//! Call model and per-call state
//!
//! - **Method**: Capability and method descriptors, call arguments
//! - **Value**: Dynamically typed arguments and return values
//! - **Target**: Objects that can sit behind a proxy
//! - **Fault**: Errors raised by target code and their class hierarchy
//! - **Context**: The per-call [`Invocation`] and chain traversal
//! - **Exposure**: Thread-scoped access to the running invocation

pub mod context;
pub mod exposure;
pub mod fault;
pub mod method;
pub mod target;
pub mod value;

// Re-export commonly used types
pub use context::Invocation;
pub use exposure::{current_invocation, current_proxy, ExposedInvocation};
pub use fault::{ErrorClass, Fault, ERROR, EXCEPTION, RUNTIME_EXCEPTION, THROWABLE};
pub use method::{Arguments, Capability, Method, MethodSignature};
pub use target::{same_object, ObjectRef, Target};
pub use value::{FromValue, IntoValue, SelfRef, Value};
