// src/invocation/target.rs
//! Interceptable objects
//!
//! Anything that can sit behind a proxy implements [`Target`]: it declares
//! the capabilities it exposes and answers dynamic calls against them. The
//! [`crate::capability!`] and [`crate::impl_target!`] macros generate both
//! halves from ordinary trait implementations.

use crate::invocation::method::{Arguments, Capability, Method};
use crate::invocation::value::Value;
use crate::proxy::Proxy;
use crate::utils::errors::Result;
use std::sync::Arc;

/// An object exposing one or more capabilities
pub trait Target: Send + Sync + 'static {
    /// Capabilities this object implements
    fn capabilities(&self) -> Vec<Capability>;

    /// Dispatch a call on one of those capabilities
    fn invoke(&self, method: &Method, args: &mut Arguments) -> Result<Value>;

    /// The proxy handle, when this object is a proxy
    fn as_proxy(&self) -> Option<Proxy> {
        None
    }
}

/// Shared handle to an interceptable object
pub type ObjectRef = Arc<dyn Target>;

/// Pointer identity of two object handles
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Whether `object` declares the named capability
pub fn implements(object: &dyn Target, capability: &str) -> bool {
    object
        .capabilities()
        .iter()
        .any(|declared| declared.name() == capability)
}
