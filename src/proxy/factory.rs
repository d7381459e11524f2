// src/proxy/factory.rs
//! Proxy construction
//!
//! Two ways in:
//!
//! - [`ProxyFactory::build`] turns an existing [`AdvisedConfig`] into a proxy
//! - the builder form, `ProxyFactory::new(target).with_interceptor(..)?.proxy()`
//!
//! Building checks that the chain is non-empty, that at least one capability
//! would be exposed, and that there is a target unless the chain ends in
//! terminal advice.

use crate::advice::{Advice, Interceptor};
use crate::introduction::IntroductionInterceptor;
use crate::invocation::method::Capability;
use crate::invocation::target::{ObjectRef, Target};
use crate::pointcut::attributes::AttributeRegistry;
use crate::pointcut::MethodPointcut;
use crate::proxy::assembly::{ObjectRegistry, ProxyDefinition};
use crate::proxy::config::AdvisedConfig;
use crate::proxy::handle::Proxy;
use crate::utils::errors::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds proxies over a configuration
#[derive(Debug, Clone, Default)]
pub struct ProxyFactory {
    config: AdvisedConfig,
}

impl ProxyFactory {
    /// Start from an owned target
    pub fn new<T: Target>(target: T) -> Self {
        Self::with_target(Arc::new(target))
    }

    /// Start from a shared target
    pub fn with_target(target: ObjectRef) -> Self {
        Self {
            config: AdvisedConfig::with_target(target),
        }
    }

    /// Start without a target; the chain must end in terminal advice
    pub fn without_target() -> Self {
        Self::default()
    }

    /// Wrap an existing configuration
    pub fn from_config(config: AdvisedConfig) -> Self {
        Self { config }
    }

    pub fn with_capability(self, capability: Capability) -> Self {
        self.config.add_capability(capability);
        self
    }

    pub fn with_interceptor<I: Interceptor + 'static>(self, interceptor: I) -> Result<Self> {
        self.config.add_interceptor(interceptor)?;
        Ok(self)
    }

    pub fn with_advice(self, advice: Advice) -> Result<Self> {
        self.config.add_advice(advice)?;
        Ok(self)
    }

    pub fn with_pointcut<P: MethodPointcut + 'static>(self, pointcut: P) -> Result<Self> {
        self.config.add_pointcut(pointcut)?;
        Ok(self)
    }

    pub fn with_introduction<I: IntroductionInterceptor + 'static>(
        self,
        introduction: I,
    ) -> Result<Self> {
        self.config.add_introduction(introduction)?;
        Ok(self)
    }

    pub fn with_expose_invocation(self, expose: bool) -> Self {
        self.config.set_expose_invocation(expose);
        self
    }

    pub fn with_attribute_registry(self, registry: Arc<dyn AttributeRegistry>) -> Self {
        self.config.set_attribute_registry(Some(registry));
        self
    }

    pub fn config(&self) -> &AdvisedConfig {
        &self.config
    }

    /// Build a proxy over the accumulated configuration
    pub fn proxy(&self) -> Result<Proxy> {
        Self::build(&self.config)
    }

    /// Build a proxy over `config`
    ///
    /// The proxy shares `config`: later advice changes are visible to it,
    /// but its capability set and what each introduction publishes to it
    /// are fixed now.
    pub fn build(config: &AdvisedConfig) -> Result<Proxy> {
        config.validate()?;

        let (capabilities, published) = config.build_view();
        let proxy = Proxy::new(config.clone(), capabilities, published);
        info!(
            "Built proxy over {} capability(ies) with {} advice",
            proxy.capabilities().len(),
            config.advice_count()
        );
        Ok(proxy)
    }

    /// Assemble a configuration from a definition, resolving names in
    /// `registry`, and build it
    pub fn from_definition(
        definition: &ProxyDefinition,
        registry: &ObjectRegistry,
    ) -> Result<Proxy> {
        let config = AdvisedConfig::new();

        if let Some(name) = &definition.target {
            config.set_target(Some(registry.target(name)?));
        }

        for name in &definition.capabilities {
            config.add_capability(registry.capability(name)?);
        }

        for name in &definition.interceptors {
            debug!(advice = %name, "Resolving advice");
            config.add_advice(registry.advice(name)?)?;
        }

        if let Some(expose) = definition.expose_invocation {
            config.set_expose_invocation(expose);
        }

        if let Some(name) = &definition.attributes {
            config.set_attribute_registry(Some(registry.attributes(name)?));
        }

        Self::build(&config)
    }
}
