// src/proxy/handle.rs
//! The proxy handle
//!
//! A [`Proxy`] stands in for its target. It exposes a fixed capability set
//! (computed when it was built) and routes every call through a fresh
//! [`Invocation`] over a snapshot of its configuration's advice.
//!
//! ```text
//! caller ──► Proxy::invoke
//!              ├─ interpose.Object?  → answered locally (equals, hash_code, to_string)
//!              ├─ not exposed?       → UnsupportedCapability
//!              └─ otherwise          → snapshot chain → Invocation::proceed()
//! ```

use crate::introduction::PublishedCapabilities;
use crate::invocation::context::Invocation;
use crate::invocation::exposure;
use crate::invocation::method::{Arguments, Capability, Method};
use crate::invocation::target::{ObjectRef, Target};
use crate::invocation::value::Value;
use crate::proxy::config::AdvisedConfig;
use crate::utils::errors::{AopError, Result};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use tracing::debug_span;

/// Shared state behind a [`Proxy`]
pub(crate) struct ProxyInner {
    this: Weak<ProxyInner>,
    config: AdvisedConfig,
    capabilities: Vec<Capability>,
    published: PublishedCapabilities,
}

/// A stand-in for a target object
#[derive(Clone)]
pub struct Proxy {
    inner: Arc<ProxyInner>,
}

impl Proxy {
    pub(crate) fn new(
        config: AdvisedConfig,
        capabilities: Vec<Capability>,
        published: PublishedCapabilities,
    ) -> Self {
        let inner = Arc::new_cyclic(|this| ProxyInner {
            this: this.clone(),
            config,
            capabilities,
            published,
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<ProxyInner>) -> Self {
        Self { inner }
    }

    /// The configuration this proxy was built from
    pub fn advised(&self) -> &AdvisedConfig {
        &self.inner.config
    }

    /// Capabilities exposed by this proxy, fixed at build time
    pub fn capabilities(&self) -> &[Capability] {
        &self.inner.capabilities
    }

    pub fn implements(&self, capability: &str) -> bool {
        self.inner.implements(capability)
    }

    /// This proxy as an interceptable object
    pub fn as_object(&self) -> ObjectRef {
        Arc::clone(&self.inner) as ObjectRef
    }

    /// Whether `object` is this proxy
    pub fn is(&self, object: &ObjectRef) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner) as *const (),
            Arc::as_ptr(object) as *const (),
        )
    }

    /// Call `method` through the advice chain
    pub fn invoke(&self, method: &Method, args: Arguments) -> Result<Value> {
        self.inner.dispatch(method, args)
    }

    fn hash_code(&self) -> i64 {
        let mut hasher = DefaultHasher::new();
        self.inner.config.identity().hash(&mut hasher);
        hasher.finish() as i64
    }
}

impl ProxyInner {
    fn implements(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|exposed| exposed.name() == capability)
    }

    fn dispatch(&self, method: &Method, args: Arguments) -> Result<Value> {
        if method.capability() == Capability::OBJECT.name() {
            return self.answer_object_method(method, args);
        }

        if !self.implements(method.capability()) {
            return Err(AopError::UnsupportedCapability(
                method.capability().to_string(),
            ));
        }

        let snapshot = self.config.snapshot()?;
        let mut invocation = Invocation::new(
            self.this.clone(),
            snapshot.target,
            *method,
            args,
            snapshot.chain,
            snapshot.attribute_registry,
        )
        .with_published(self.published.clone());
        metrics::counter!("interpose_invocations_total").increment(1);

        let _exposed = snapshot
            .expose_invocation
            .then(|| exposure::expose(invocation.exposed()));
        let span = debug_span!("invocation", id = %invocation.id(), method = %method);
        let _entered = span.enter();

        invocation.proceed()
    }

    /// `interpose.Object` methods never reach advice or the target
    fn answer_object_method(&self, method: &Method, args: Arguments) -> Result<Value> {
        let proxy = self.proxy()?;
        match method.name() {
            "equals" => {
                args.expect_len(method, 1)?;
                let equal = match args.get(0) {
                    Some(Value::Object(other)) => other
                        .as_proxy()
                        .map_or(false, |other| other == proxy),
                    _ => false,
                };
                Ok(Value::Bool(equal))
            }
            "hash_code" => {
                args.expect_len(method, 0)?;
                Ok(Value::Int(proxy.hash_code()))
            }
            "to_string" => {
                args.expect_len(method, 0)?;
                Ok(Value::Str(proxy.to_string()))
            }
            other => Err(AopError::NoSuchMethod {
                capability: method.capability().to_string(),
                method: other.to_string(),
            }),
        }
    }

    fn proxy(&self) -> Result<Proxy> {
        self.this
            .upgrade()
            .map(Proxy::from_inner)
            .ok_or(AopError::ProxyReleased)
    }
}

impl Target for ProxyInner {
    fn capabilities(&self) -> Vec<Capability> {
        self.capabilities.clone()
    }

    fn invoke(&self, method: &Method, args: &mut Arguments) -> Result<Value> {
        self.dispatch(method, args.clone())
    }

    fn as_proxy(&self) -> Option<Proxy> {
        self.this.upgrade().map(Proxy::from_inner)
    }
}

/// Proxies are equal when they share a configuration
impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.inner.config.ptr_eq(&other.inner.config)
    }
}

impl Eq for Proxy {}

impl PartialEq<AdvisedConfig> for Proxy {
    fn eq(&self, other: &AdvisedConfig) -> bool {
        self.inner.config.ptr_eq(other)
    }
}

/// Only another proxy of the same configuration compares equal; never the
/// raw target
impl PartialEq<ObjectRef> for Proxy {
    fn eq(&self, other: &ObjectRef) -> bool {
        other.as_proxy().map_or(false, |other| *self == other)
    }
}

impl Hash for Proxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.config.identity().hash(state);
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.inner.capabilities.iter().map(|c| c.name()).collect();
        write!(
            f,
            "Proxy[{}] with {} advice, config {:#x}",
            names.join(", "),
            self.inner.config.advice_count(),
            self.inner.config.identity()
        )
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("capabilities", &self.inner.capabilities)
            .field("config", &self.inner.config)
            .finish()
    }
}
