// src/proxy/assembly.rs
//! Proxy assembly from declarative definitions
//!
//! A [`ProxyDefinition`] names the pieces of a proxy; an [`ObjectRegistry`]
//! maps those names to live objects. Definitions usually come from the
//! configuration file (see [`crate::utils::config`]) or from YAML.
//!
//! ```yaml
//! target: person
//! capabilities: [app.Greeter]
//! interceptors: [audit, counter]
//! expose_invocation: true
//! ```

use crate::advice::Advice;
use crate::invocation::method::Capability;
use crate::invocation::target::{ObjectRef, Target};
use crate::pointcut::attributes::AttributeRegistry;
use crate::utils::errors::{AopError, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Named description of a proxy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyDefinition {
    /// Registered target name
    pub target: Option<String>,

    /// Registered capability names, added explicitly
    pub capabilities: Vec<String>,

    /// Registered advice names, in chain order
    pub interceptors: Vec<String>,

    pub expose_invocation: Option<bool>,

    /// Registered attribute registry name
    pub attributes: Option<String>,
}

impl ProxyDefinition {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Name → object lookup used when assembling definitions
#[derive(Default)]
pub struct ObjectRegistry {
    targets: DashMap<String, ObjectRef>,
    objects: DashMap<String, Arc<dyn Any + Send + Sync>>,
    capabilities: DashMap<String, Capability>,
    attributes: DashMap<String, Arc<dyn AttributeRegistry>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_target<T: Target>(&self, name: &str, target: T) -> ObjectRef {
        let target: ObjectRef = Arc::new(target);
        self.register_shared_target(name, Arc::clone(&target));
        target
    }

    pub fn register_shared_target(&self, name: &str, target: ObjectRef) {
        debug!(name, "Registering target");
        self.targets.insert(name.to_string(), target);
    }

    pub fn register_advice(&self, name: &str, advice: Advice) {
        self.register_object(name, Arc::new(advice));
    }

    /// Register an arbitrary object; it is checked for being advice only
    /// when a definition refers to it as an interceptor
    pub fn register_object(&self, name: &str, object: Arc<dyn Any + Send + Sync>) {
        debug!(name, "Registering object");
        self.objects.insert(name.to_string(), object);
    }

    /// Register a capability under its own name
    pub fn register_capability(&self, capability: Capability) {
        self.capabilities
            .insert(capability.name().to_string(), capability);
    }

    pub fn register_attributes(&self, name: &str, registry: Arc<dyn AttributeRegistry>) {
        self.attributes.insert(name.to_string(), registry);
    }

    pub fn target(&self, name: &str) -> Result<ObjectRef> {
        self.targets
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AopError::UnknownObject(format!("target '{}'", name)))
    }

    /// Resolve a registered object as advice
    pub fn advice(&self, name: &str) -> Result<Advice> {
        let object = self
            .objects
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AopError::UnknownObject(format!("advice '{}'", name)))?;
        Advice::from_object(name, object)
    }

    pub fn capability(&self, name: &str) -> Result<Capability> {
        self.capabilities
            .get(name)
            .map(|entry| *entry.value())
            .ok_or_else(|| AopError::UnknownCapability(name.to_string()))
    }

    pub fn attributes(&self, name: &str) -> Result<Arc<dyn AttributeRegistry>> {
        self.attributes
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AopError::UnknownObject(format!("attribute registry '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::{CountingInterceptor, TracingInterceptor};
    use crate::proxy::ProxyFactory;
    use crate::testing::{Greeter, GreeterCapability, Person};

    fn registry() -> ObjectRegistry {
        let registry = ObjectRegistry::new();
        registry.register_target("person", Person::new("Ann"));
        registry.register_capability(GreeterCapability::descriptor());
        registry.register_advice("tracing", Advice::interceptor(TracingInterceptor::new()));
        registry.register_object("plain", Arc::new("just a string".to_string()));
        registry
    }

    #[test]
    fn test_definition_from_yaml() {
        let definition = ProxyDefinition::from_yaml(
            "target: person\ninterceptors: [tracing]\nexpose_invocation: true\n",
        )
        .unwrap();

        assert_eq!(definition.target.as_deref(), Some("person"));
        assert_eq!(definition.interceptors, vec!["tracing"]);
        assert_eq!(definition.expose_invocation, Some(true));
        assert!(definition.capabilities.is_empty());
    }

    #[test]
    fn test_assemble_from_definition() {
        let registry = registry();
        let counter: Arc<dyn crate::advice::Interceptor> = Arc::new(CountingInterceptor::new());
        registry.register_object("counter", Arc::new(counter));

        let definition = ProxyDefinition {
            target: Some("person".to_string()),
            capabilities: vec!["app.Greeter".to_string()],
            interceptors: vec!["tracing".to_string(), "counter".to_string()],
            ..Default::default()
        };

        let proxy = ProxyFactory::from_definition(&definition, &registry).unwrap();
        assert_eq!(proxy.name().unwrap(), "Ann");
        assert_eq!(proxy.advised().advice_count(), 2);
    }

    #[test]
    fn test_non_advice_object_rejected() {
        let definition = ProxyDefinition {
            target: Some("person".to_string()),
            interceptors: vec!["plain".to_string()],
            ..Default::default()
        };

        let result = ProxyFactory::from_definition(&definition, &registry());
        assert!(matches!(result, Err(AopError::NotAdvice(name)) if name == "plain"));
    }

    #[test]
    fn test_unknown_names() {
        let registry = registry();
        assert!(matches!(
            registry.target("nobody"),
            Err(AopError::UnknownObject(_))
        ));
        assert!(matches!(
            registry.capability("app.Nothing"),
            Err(AopError::UnknownCapability(_))
        ));
        assert!(registry.advice("missing").is_err());
        assert!(registry.attributes("missing").is_err());
    }
}
