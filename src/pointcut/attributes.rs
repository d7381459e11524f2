// src/pointcut/attributes.rs
//! Method attributes and attribute-driven selection
//!
//! An [`AttributeRegistry`] associates arbitrary typed metadata with
//! methods. Advice such as the transaction interceptor reads it to decide
//! what to do; [`AttributePointcut`] applies its interceptor only to methods
//! carrying an attribute of a given type.

use crate::advice::Interceptor;
use crate::invocation::method::{Arguments, Method};
use crate::pointcut::MethodPointcut;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Opaque attribute value
pub type Attribute = Arc<dyn Any + Send + Sync>;

/// Source of method metadata
pub trait AttributeRegistry: Send + Sync {
    fn attributes(&self, method: &Method) -> Vec<Attribute>;
}

/// First attribute of type `T` declared on `method`
pub fn find_attribute<T: Any + Send + Sync>(
    registry: &dyn AttributeRegistry,
    method: &Method,
) -> Option<Arc<T>> {
    registry
        .attributes(method)
        .into_iter()
        .find_map(|attribute| attribute.downcast::<T>().ok())
}

/// Attributes keyed by qualified method name
///
/// Keys may start or end with `*` (`"app.Greeter.*"`, `"*.save"`). An exact
/// key wins; otherwise the longest matching wildcard key does.
#[derive(Default)]
pub struct MethodMapAttributeRegistry {
    entries: RwLock<HashMap<String, Vec<Attribute>>>,
}

impl MethodMapAttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T: Any + Send + Sync>(&self, key: &str, attribute: T) {
        debug!(key, "Registering method attribute");
        self.entries
            .write()
            .entry(key.to_string())
            .or_default()
            .push(Arc::new(attribute));
    }

    fn key_matches(key: &str, name: &str) -> bool {
        if let Some(suffix) = key.strip_prefix('*') {
            name.ends_with(suffix)
        } else if let Some(prefix) = key.strip_suffix('*') {
            name.starts_with(prefix)
        } else {
            false
        }
    }
}

impl AttributeRegistry for MethodMapAttributeRegistry {
    fn attributes(&self, method: &Method) -> Vec<Attribute> {
        let name = method.qualified_name();
        let entries = self.entries.read();

        if let Some(exact) = entries.get(&name) {
            return exact.clone();
        }

        entries
            .iter()
            .filter(|(key, _)| Self::key_matches(key, &name))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, attributes)| attributes.clone())
            .unwrap_or_default()
    }
}

/// Applies when the method carries an attribute of type `T`
pub struct AttributePointcut<T> {
    interceptor: Arc<dyn Interceptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> AttributePointcut<T> {
    pub fn new<I: Interceptor + 'static>(interceptor: I) -> Self {
        Self::with_shared(Arc::new(interceptor))
    }

    pub fn with_shared(interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            interceptor,
            _marker: PhantomData,
        }
    }
}

impl<T: Any + Send + Sync> MethodPointcut for AttributePointcut<T> {
    fn applies(
        &self,
        method: &Method,
        _args: &Arguments,
        attributes: Option<&dyn AttributeRegistry>,
    ) -> bool {
        attributes.map_or(false, |registry| {
            find_attribute::<T>(registry, method).is_some()
        })
    }

    fn interceptor(&self) -> Arc<dyn Interceptor> {
        Arc::clone(&self.interceptor)
    }

    fn name(&self) -> &str {
        std::any::type_name::<T>()
    }
}
