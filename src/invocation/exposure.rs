// src/invocation/exposure.rs
//! Thread-scoped access to the running invocation
//!
//! Advice receives its [`Invocation`](crate::invocation::Invocation)
//! explicitly. Target code that cannot be handed one (it only sees its own
//! arguments) can still reach the call it is running in when the proxy
//! configuration enables `expose_invocation`.
//!
//! Each exposed call pushes onto a per-thread stack and pops through a drop
//! guard, so the stack is restored on return, on error and on unwind.
//! Re-entrant calls see the innermost invocation.

use crate::invocation::context::Attachments;
use crate::invocation::method::Method;
use crate::invocation::value::Value;
use crate::proxy::handle::{Proxy, ProxyInner};
use crate::utils::errors::{AopError, Result};
use std::cell::RefCell;
use std::sync::Weak;
use ulid::Ulid;

thread_local! {
    static EXPOSED: RefCell<Vec<ExposedInvocation>> = RefCell::new(Vec::new());
}

/// Handle to an invocation published on the current thread
#[derive(Clone)]
pub struct ExposedInvocation {
    id: Ulid,
    method: Method,
    proxy: Weak<ProxyInner>,
    attachments: Attachments,
}

impl ExposedInvocation {
    pub(crate) fn new(
        id: Ulid,
        method: Method,
        proxy: Weak<ProxyInner>,
        attachments: Attachments,
    ) -> Self {
        Self {
            id,
            method,
            proxy,
            attachments,
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn proxy(&self) -> Result<Proxy> {
        self.proxy
            .upgrade()
            .map(Proxy::from_inner)
            .ok_or(AopError::ProxyReleased)
    }

    pub fn attachment(&self, key: &str) -> Option<Value> {
        self.attachments.get(key)
    }

    pub fn set_attachment(&self, key: &str, value: Value) -> Option<Value> {
        self.attachments.set(key, value)
    }
}

/// Pops the exposed invocation when dropped
pub(crate) struct ExposureGuard {
    depth: usize,
}

impl Drop for ExposureGuard {
    fn drop(&mut self) {
        let _ = EXPOSED.try_with(|stack| {
            stack.borrow_mut().truncate(self.depth - 1);
        });
    }
}

/// Publish `invocation` until the returned guard is dropped
pub(crate) fn expose(invocation: ExposedInvocation) -> ExposureGuard {
    let depth = EXPOSED.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack.push(invocation);
        stack.len()
    });
    ExposureGuard { depth }
}

/// The innermost invocation exposed on this thread
pub fn current_invocation() -> Result<ExposedInvocation> {
    EXPOSED.with(|stack| {
        stack
            .borrow()
            .last()
            .cloned()
            .ok_or(AopError::NoCurrentInvocation)
    })
}

/// The proxy of the innermost exposed invocation
pub fn current_proxy() -> Result<Proxy> {
    current_invocation()?.proxy()
}

/// Number of invocations currently exposed on this thread
pub fn exposure_depth() -> usize {
    EXPOSED.with(|stack| stack.borrow().len())
}
