// src/advice/invoker.rs
//! Terminal advice
//!
//! Terminal advice ends the chain. [`TargetInvoker`] performs the real method
//! dispatch on the target; [`ProxyForwarder`] hands the call to another proxy
//! with its own chain. Neither ever calls `proceed()`.

use crate::advice::Interceptor;
use crate::invocation::context::Invocation;
use crate::invocation::target::{same_object, ObjectRef};
use crate::invocation::value::Value;
use crate::proxy::Proxy;
use crate::utils::errors::{AopError, Result};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

/// Invoker appended to chains that end without terminal advice
pub(crate) static IMPLICIT_INVOKER: Lazy<Arc<dyn Interceptor>> =
    Lazy::new(|| Arc::new(TargetInvoker::for_configured_target()));

/// Replace a returned receiver with the proxy the call came through, so that
/// "return self" keeps callers on the proxy
pub(crate) fn replace_receiver(
    value: Value,
    receiver: &ObjectRef,
    invocation: &Invocation,
) -> Result<Value> {
    let is_receiver = match &value {
        Value::This => true,
        Value::Object(object) => same_object(object, receiver),
        _ => false,
    };

    if is_receiver {
        Ok(Value::Object(invocation.proxy()?.as_object()))
    } else {
        Ok(value)
    }
}

/// Invokes the target method
pub struct TargetInvoker {
    target: Option<ObjectRef>,
}

impl TargetInvoker {
    /// Invoke a fixed target, regardless of the configuration's target
    pub fn new(target: ObjectRef) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// Invoke whatever target the invocation carries
    pub fn for_configured_target() -> Self {
        Self { target: None }
    }
}

impl Interceptor for TargetInvoker {
    fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
        let target = match &self.target {
            Some(target) => Arc::clone(target),
            None => invocation
                .target()
                .cloned()
                .ok_or(AopError::MissingTarget)?,
        };

        let method = *invocation.method();
        match target.invoke(&method, invocation.arguments_mut()) {
            Ok(value) => replace_receiver(value, &target, invocation),
            Err(err) => {
                if let AopError::Target(fault) = &err {
                    debug!(invocation = %invocation.id(), "Target threw {}", fault);
                    metrics::counter!("interpose_target_faults_total").increment(1);
                }
                Err(err)
            }
        }
    }

    fn name(&self) -> &str {
        "TargetInvoker"
    }

    fn is_terminal(&self) -> bool {
        true
    }
}

/// Hands the call to another proxy
pub struct ProxyForwarder {
    next: Proxy,
}

impl ProxyForwarder {
    pub fn new(next: Proxy) -> Self {
        Self { next }
    }

    pub fn next(&self) -> &Proxy {
        &self.next
    }
}

impl Interceptor for ProxyForwarder {
    fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
        debug!(
            invocation = %invocation.id(),
            "Forwarding {} to {}",
            invocation.method(),
            self.next
        );
        let value = self
            .next
            .invoke(invocation.method(), invocation.arguments().clone())?;
        replace_receiver(value, &self.next.as_object(), invocation)
    }

    fn name(&self) -> &str {
        "ProxyForwarder"
    }

    fn is_terminal(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::Advice;
    use crate::invocation::fault::{Fault, RUNTIME_EXCEPTION};
    use crate::proxy::ProxyFactory;
    use crate::testing::{Counter, FailingGreeter, Greeter, Person, Tally};

    #[test]
    fn test_explicit_invoker_is_terminal() {
        let invoker = TargetInvoker::new(Arc::new(Person::new("Ann")));
        assert!(invoker.is_terminal());
        assert!(Advice::interceptor(invoker).is_terminal());
    }

    #[test]
    fn test_explicit_invoker_overrides_configured_target() {
        let proxy = ProxyFactory::new(Person::new("Ann"))
            .with_interceptor(TargetInvoker::new(Arc::new(Person::new("Bob"))))
            .unwrap()
            .proxy()
            .unwrap();

        assert_eq!(proxy.name().unwrap(), "Bob");
    }

    #[test]
    fn test_target_fault_identity_preserved() {
        let fault = Fault::new(&RUNTIME_EXCEPTION, "no greeting today");
        let proxy = ProxyFactory::new(FailingGreeter::new(fault.clone()))
            .with_interceptor(crate::advice::CountingInterceptor::new())
            .unwrap()
            .proxy()
            .unwrap();

        let err = proxy.name().unwrap_err();
        assert!(Fault::ptr_eq(err.fault().unwrap(), &fault));
    }

    #[test]
    fn test_return_self_becomes_proxy() {
        let proxy = ProxyFactory::new(Tally::default())
            .with_interceptor(crate::advice::CountingInterceptor::new())
            .unwrap()
            .proxy()
            .unwrap();

        let returned = proxy.touch().unwrap();
        assert!(returned.refers_to(&proxy));
    }

    #[test]
    fn test_forwarder_hands_off_to_next_proxy() {
        let inner = ProxyFactory::new(Person::new("Ann"))
            .with_interceptor(crate::advice::CountingInterceptor::new())
            .unwrap()
            .proxy()
            .unwrap();

        let outer = ProxyFactory::without_target()
            .with_capability(crate::testing::GreeterCapability::descriptor())
            .with_interceptor(ProxyForwarder::new(inner.clone()))
            .unwrap()
            .proxy()
            .unwrap();

        assert_eq!(outer.name().unwrap(), "Ann");
        assert_ne!(outer, inner);
    }
}
