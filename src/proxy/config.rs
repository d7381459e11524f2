// src/proxy/config.rs
//! Proxy configuration
//!
//! An [`AdvisedConfig`] is a shared, mutable handle over the target, the
//! explicitly added capabilities and the ordered advice list. Every proxy
//! built from a handle observes later changes to its advice; the chain is
//! snapshotted once per call.
//!
//! Once a terminal entry (one that never proceeds) is in the chain, nothing
//! may be added after it. Rejected additions leave the chain untouched.

use crate::advice::invoker::IMPLICIT_INVOKER;
use crate::advice::{Advice, Interceptor};
use crate::introduction::{IntroductionInterceptor, PublishedCapabilities};
use crate::invocation::method::Capability;
use crate::invocation::target::ObjectRef;
use crate::pointcut::attributes::AttributeRegistry;
use crate::pointcut::MethodPointcut;
use crate::utils::errors::{AopError, Result};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
pub(crate) struct ProxyConfig {
    target: Option<ObjectRef>,
    capabilities: Vec<Capability>,
    advice: Vec<Advice>,
    expose_invocation: bool,
    attribute_registry: Option<Arc<dyn AttributeRegistry>>,
}

/// What a single call needs from the configuration
pub(crate) struct ChainSnapshot {
    pub chain: Arc<[Advice]>,
    pub target: Option<ObjectRef>,
    pub expose_invocation: bool,
    pub attribute_registry: Option<Arc<dyn AttributeRegistry>>,
}

/// Shared handle to a proxy configuration
#[derive(Clone, Default)]
pub struct AdvisedConfig {
    inner: Arc<RwLock<ProxyConfig>>,
}

impl AdvisedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(target: ObjectRef) -> Self {
        let config = Self::new();
        config.set_target(Some(target));
        config
    }

    pub fn target(&self) -> Option<ObjectRef> {
        self.inner.read().target.clone()
    }

    pub fn set_target(&self, target: Option<ObjectRef>) {
        self.inner.write().target = target;
    }

    /// Add a capability explicitly; duplicates are ignored
    pub fn add_capability(&self, capability: Capability) -> bool {
        let mut config = self.inner.write();
        if config.capabilities.contains(&capability) {
            return false;
        }
        config.capabilities.push(capability);
        true
    }

    pub fn remove_capability(&self, name: &str) -> bool {
        let mut config = self.inner.write();
        let before = config.capabilities.len();
        config.capabilities.retain(|capability| capability.name() != name);
        config.capabilities.len() != before
    }

    /// Capabilities added with [`AdvisedConfig::add_capability`]
    pub fn explicit_capabilities(&self) -> Vec<Capability> {
        self.inner.read().capabilities.clone()
    }

    /// The set a proxy built now would expose: target capabilities, then
    /// explicit additions, then introduced capabilities, without duplicates
    pub fn capabilities(&self) -> Vec<Capability> {
        let config = self.inner.read();
        let introduced = config
            .advice
            .iter()
            .flat_map(|advice| advice.introduced_capabilities());
        aggregate(&config, introduced)
    }

    /// The capability set together with what each introduction publishes,
    /// read under one lock
    pub(crate) fn build_view(&self) -> (Vec<Capability>, PublishedCapabilities) {
        let config = self.inner.read();
        let published = PublishedCapabilities::capture(&config.advice);
        let capabilities = aggregate(&config, published.all());
        (capabilities, published)
    }

    /// Append an interceptor
    pub fn add_interceptor<I: Interceptor + 'static>(&self, interceptor: I) -> Result<()> {
        self.add_advice(Advice::interceptor(interceptor))
    }

    /// Append an interceptor that is also held elsewhere
    pub fn add_shared_interceptor(&self, interceptor: Arc<dyn Interceptor>) -> Result<()> {
        self.add_advice(Advice::Interceptor(interceptor))
    }

    pub fn add_interceptor_at<I: Interceptor + 'static>(
        &self,
        position: usize,
        interceptor: I,
    ) -> Result<()> {
        self.insert_advice(position, Advice::interceptor(interceptor))
    }

    pub fn add_pointcut<P: MethodPointcut + 'static>(&self, pointcut: P) -> Result<()> {
        self.add_advice(Advice::pointcut(pointcut))
    }

    pub fn add_introduction<I: IntroductionInterceptor + 'static>(
        &self,
        introduction: I,
    ) -> Result<()> {
        self.add_advice(Advice::introduction(introduction))
    }

    pub fn add_advice(&self, advice: Advice) -> Result<()> {
        let mut config = self.inner.write();
        let length = config.advice.len();
        Self::insert_into(&mut config, length, advice)
    }

    /// Insert `advice` at `position`
    pub fn insert_advice(&self, position: usize, advice: Advice) -> Result<()> {
        Self::insert_into(&mut self.inner.write(), position, advice)
    }

    fn insert_into(config: &mut ProxyConfig, position: usize, advice: Advice) -> Result<()> {
        let length = config.advice.len();

        if position > length {
            return Err(AopError::IndexOutOfRange {
                index: position,
                length,
            });
        }

        if let Some(terminal) = config.advice.iter().position(Advice::is_terminal) {
            if position > terminal {
                let terminal = config.advice[terminal].name().to_string();
                warn!(
                    advice = advice.name(),
                    terminal = %terminal,
                    "Rejected advice placed after terminal advice"
                );
                return Err(AopError::UnreachableAdvice {
                    advice: advice.name().to_string(),
                    terminal,
                });
            }
        }

        if advice.is_terminal() && position < length {
            let shadowed = config.advice[position].name().to_string();
            warn!(
                advice = advice.name(),
                shadowed = %shadowed,
                "Rejected terminal advice with advice after it"
            );
            return Err(AopError::UnreachableAdvice {
                advice: shadowed,
                terminal: advice.name().to_string(),
            });
        }

        debug!(advice = advice.name(), position, "Adding advice");
        config.advice.insert(position, advice);
        Ok(())
    }

    /// Resolve a named registered object as advice and append it
    pub fn add_advice_object(
        &self,
        name: &str,
        object: Arc<dyn Any + Send + Sync>,
    ) -> Result<()> {
        self.add_advice(Advice::from_object(name, object)?)
    }

    pub fn remove_advice_at(&self, index: usize) -> Result<Advice> {
        let mut config = self.inner.write();
        let length = config.advice.len();
        if index >= length {
            return Err(AopError::IndexOutOfRange { index, length });
        }
        Ok(config.advice.remove(index))
    }

    /// Remove the entry wrapping the same advice object as `advice`
    pub fn remove_interceptor(&self, advice: &Advice) -> bool {
        let mut config = self.inner.write();
        match config.advice.iter().position(|entry| entry.is_same(advice)) {
            Some(index) => {
                config.advice.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn advice(&self) -> Vec<Advice> {
        self.inner.read().advice.clone()
    }

    pub fn advice_count(&self) -> usize {
        self.inner.read().advice.len()
    }

    pub fn expose_invocation(&self) -> bool {
        self.inner.read().expose_invocation
    }

    pub fn set_expose_invocation(&self, expose: bool) {
        self.inner.write().expose_invocation = expose;
    }

    pub fn attribute_registry(&self) -> Option<Arc<dyn AttributeRegistry>> {
        self.inner.read().attribute_registry.clone()
    }

    pub fn set_attribute_registry(&self, registry: Option<Arc<dyn AttributeRegistry>>) {
        self.inner.write().attribute_registry = registry;
    }

    /// Whether both handles refer to the same configuration
    pub fn ptr_eq(&self, other: &AdvisedConfig) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address-derived identity, stable for the configuration's lifetime
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Check the preconditions for building a proxy
    pub fn validate(&self) -> Result<()> {
        let (advice_empty, has_target, ends_terminal) = {
            let config = self.inner.read();
            (
                config.advice.is_empty(),
                config.target.is_some(),
                config.advice.last().map_or(false, Advice::is_terminal),
            )
        };

        if advice_empty {
            return Err(AopError::EmptyAdviceChain);
        }
        if self.capabilities().is_empty() {
            return Err(AopError::NoCapabilities);
        }
        if !has_target && !ends_terminal {
            return Err(AopError::MissingTarget);
        }
        Ok(())
    }

    /// Copy out what one call needs, appending the implicit target invoker
    /// when the chain does not end in terminal advice
    pub(crate) fn snapshot(&self) -> Result<ChainSnapshot> {
        let config = self.inner.read();
        if config.advice.is_empty() {
            return Err(AopError::EmptyAdviceChain);
        }

        let ends_terminal = config.advice.last().map_or(false, Advice::is_terminal);
        let chain: Arc<[Advice]> = if ends_terminal {
            config.advice.iter().cloned().collect()
        } else if config.target.is_some() {
            config
                .advice
                .iter()
                .cloned()
                .chain(std::iter::once(Advice::Interceptor(Arc::clone(
                    &*IMPLICIT_INVOKER,
                ))))
                .collect()
        } else {
            return Err(AopError::MissingTarget);
        };

        Ok(ChainSnapshot {
            chain,
            target: config.target.clone(),
            expose_invocation: config.expose_invocation,
            attribute_registry: config.attribute_registry.clone(),
        })
    }
}

fn aggregate(
    config: &ProxyConfig,
    introduced: impl Iterator<Item = Capability>,
) -> Vec<Capability> {
    let from_target = config
        .target
        .as_ref()
        .map(|target| target.capabilities())
        .unwrap_or_default();

    let mut aggregated: Vec<Capability> = Vec::new();
    for capability in from_target
        .into_iter()
        .chain(config.capabilities.iter().copied())
        .chain(introduced)
    {
        if !aggregated.contains(&capability) {
            aggregated.push(capability);
        }
    }
    aggregated
}

impl fmt::Debug for AdvisedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.inner.read();
        f.debug_struct("AdvisedConfig")
            .field("has_target", &config.target.is_some())
            .field("capabilities", &config.capabilities)
            .field("advice", &config.advice)
            .field("expose_invocation", &config.expose_invocation)
            .finish()
    }
}
