// src/invocation/context.rs
//! Per-call invocation state and chain traversal
//!
//! A fresh [`Invocation`] is created for every call on a proxy. It carries
//! the method, the (mutable) arguments, a snapshot of the advice chain and
//! the position reached in it. Advice receives the invocation and calls
//! [`Invocation::proceed`] to hand control to the next entry.
//!
//! ```text
//! proxy.call()
//!   └─ proceed() → advice[0].invoke(inv)
//!                     └─ proceed() → advice[1].invoke(inv)
//!                                       └─ proceed() → TargetInvoker → target
//! ```
//!
//! The position only moves forward. Calling `proceed()` once every entry
//! has been dispatched is an error and leaves the position where it was.

use crate::advice::Advice;
use crate::introduction::{IntroductionInterceptor, PublishedCapabilities};
use crate::invocation::exposure::ExposedInvocation;
use crate::invocation::method::{Arguments, Capability, Method};
use crate::invocation::target::ObjectRef;
use crate::invocation::value::Value;
use crate::pointcut::attributes::AttributeRegistry;
use crate::proxy::handle::{Proxy, ProxyInner};
use crate::utils::errors::{AopError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;
use ulid::Ulid;

/// Call-scoped key/value store shared between an invocation, its clones and
/// its exposed handle
#[derive(Clone, Default)]
pub(crate) struct Attachments {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl Attachments {
    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }

    /// Setting `Value::Unit` clears the key
    pub(crate) fn set(&self, key: &str, value: Value) -> Option<Value> {
        let mut entries = self.entries.lock();
        if value.is_unit() {
            entries.remove(key)
        } else {
            entries.insert(key.to_string(), value)
        }
    }

    pub(crate) fn remove(&self, key: &str) -> Option<Value> {
        self.entries.lock().remove(key)
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

/// State of one call travelling through an advice chain
pub struct Invocation {
    id: Ulid,
    proxy: Weak<ProxyInner>,
    target: Option<ObjectRef>,
    method: Method,
    arguments: Arguments,
    chain: Arc<[Advice]>,
    /// Number of entries dispatched so far
    position: usize,
    attachments: Attachments,
    attribute_registry: Option<Arc<dyn AttributeRegistry>>,
    published: PublishedCapabilities,
}

impl Invocation {
    pub(crate) fn new(
        proxy: Weak<ProxyInner>,
        target: Option<ObjectRef>,
        method: Method,
        arguments: Arguments,
        chain: Arc<[Advice]>,
        attribute_registry: Option<Arc<dyn AttributeRegistry>>,
    ) -> Self {
        Self {
            id: Ulid::new(),
            proxy,
            target,
            method,
            arguments,
            chain,
            position: 0,
            attachments: Attachments::default(),
            attribute_registry,
            published: PublishedCapabilities::default(),
        }
    }

    pub(crate) fn with_published(mut self, published: PublishedCapabilities) -> Self {
        self.published = published;
        self
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> &mut Arguments {
        &mut self.arguments
    }

    /// The configured target, if any
    pub fn target(&self) -> Option<&ObjectRef> {
        self.target.as_ref()
    }

    /// The proxy this call was made on
    pub fn proxy(&self) -> Result<Proxy> {
        self.proxy
            .upgrade()
            .map(Proxy::from_inner)
            .ok_or(AopError::ProxyReleased)
    }

    pub fn attribute_registry(&self) -> Option<&dyn AttributeRegistry> {
        self.attribute_registry.as_deref()
    }

    /// Capabilities `introduction` published when the proxy was built, if it
    /// was in the chain then
    pub fn published_by(
        &self,
        introduction: &dyn IntroductionInterceptor,
    ) -> Option<&[Capability]> {
        self.published.get(introduction)
    }

    /// Index of the entry most recently dispatched; `None` before the first
    /// `proceed()`
    pub fn current_index(&self) -> Option<usize> {
        self.position.checked_sub(1)
    }

    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Bounds-checked access to the chain snapshot
    pub fn interceptor_at(&self, index: usize) -> Result<&Advice> {
        self.chain.get(index).ok_or(AopError::IndexOutOfRange {
            index,
            length: self.chain.len(),
        })
    }

    /// Dispatch the next entry of the chain and return its outcome unchanged
    pub fn proceed(&mut self) -> Result<Value> {
        if self.position >= self.chain.len() {
            return Err(AopError::ChainExhausted {
                length: self.chain.len(),
            });
        }

        let index = self.position;
        self.position += 1;

        let chain = Arc::clone(&self.chain);
        let advice = &chain[index];
        trace!(
            invocation = %self.id,
            index,
            advice = advice.name(),
            "Dispatching {}",
            self.method
        );

        match advice {
            Advice::Interceptor(interceptor) => interceptor.invoke(self),
            Advice::Introduction(introduction) => introduction.invoke(self),
            Advice::Pointcut(pointcut) => {
                let applies = pointcut.applies(
                    &self.method,
                    &self.arguments,
                    self.attribute_registry.as_deref(),
                );
                if applies {
                    pointcut.interceptor().invoke(self)
                } else {
                    trace!(invocation = %self.id, index, "Pointcut does not apply, skipping");
                    self.proceed()
                }
            }
        }
    }

    pub fn attachment(&self, key: &str) -> Option<Value> {
        self.attachments.get(key)
    }

    /// Store a value for later advice or the caller; `Value::Unit` clears
    /// the key. Returns the previous value.
    pub fn set_attachment(&mut self, key: &str, value: Value) -> Option<Value> {
        self.attachments.set(key, value)
    }

    pub fn remove_attachment(&mut self, key: &str) -> Option<Value> {
        self.attachments.remove(key)
    }

    pub fn attachment_keys(&self) -> Vec<String> {
        self.attachments.keys()
    }

    /// Independent copy at the same position, for advice that proceeds more
    /// than once. Arguments are copied; attachments stay shared.
    pub fn invocable_clone(&self) -> Invocation {
        Invocation {
            id: self.id,
            proxy: self.proxy.clone(),
            target: self.target.clone(),
            method: self.method,
            arguments: self.arguments.clone(),
            chain: Arc::clone(&self.chain),
            position: self.position,
            attachments: self.attachments.clone(),
            attribute_registry: self.attribute_registry.clone(),
            published: self.published.clone(),
        }
    }

    pub(crate) fn exposed(&self) -> ExposedInvocation {
        ExposedInvocation::new(
            self.id,
            self.method,
            self.proxy.clone(),
            self.attachments.clone(),
        )
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("arguments", &self.arguments)
            .field("current_index", &self.current_index())
            .field("chain_len", &self.chain.len())
            .finish()
    }
}
