// src/pointcut/mod.rs
//! Rule-based advice selection
//!
//! - **Regexp**: Select methods by qualified name
//! - **Attributes**: Method metadata and attribute-driven selection
//! - **Rules**: Rollback rules matched against the fault class hierarchy
//!
//! A pointcut pairs a predicate over the call with one interceptor. The
//! predicate is evaluated when the chain reaches the entry; if it does not
//! apply, traversal continues with the next entry.

pub mod attributes;
pub mod regexp;
pub mod rules;

use crate::advice::Interceptor;
use crate::invocation::method::{Arguments, Method};
use std::sync::Arc;

// Re-export commonly used types
pub use attributes::{
    find_attribute, Attribute, AttributePointcut, AttributeRegistry, MethodMapAttributeRegistry,
};
pub use regexp::RegexpMethodPointcut;
pub use rules::{winning_rule, RollbackRule};

/// Conditional advice
pub trait MethodPointcut: Send + Sync {
    /// Whether the interceptor should run for this call. Must not have side
    /// effects.
    fn applies(
        &self,
        method: &Method,
        args: &Arguments,
        attributes: Option<&dyn AttributeRegistry>,
    ) -> bool;

    fn interceptor(&self) -> Arc<dyn Interceptor>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
