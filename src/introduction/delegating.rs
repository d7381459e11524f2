// src/introduction/delegating.rs
//! Introduction backed by a delegate object
//!
//! The delegate's capabilities, minus framework-internal ones and minus any
//! suppressed ones, are published. Calls on a published capability go to
//! the delegate, even when the target implements the same capability.

use crate::advice::invoker::replace_receiver;
use crate::advice::Interceptor;
use crate::introduction::IntroductionInterceptor;
use crate::invocation::context::Invocation;
use crate::invocation::method::Capability;
use crate::invocation::target::{ObjectRef, Target};
use crate::invocation::value::Value;
use crate::utils::errors::{AopError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

pub struct DelegatingIntroduction {
    delegate: ObjectRef,
    published: RwLock<Vec<Capability>>,
}

impl DelegatingIntroduction {
    /// Take ownership of `delegate` and publish its capabilities
    pub fn new<T: Target>(delegate: T) -> Self {
        Self::from_delegate(Arc::new(delegate))
    }

    /// Build from a possibly missing delegate, as assembled configurations
    /// may supply
    pub fn from_object(delegate: Option<ObjectRef>) -> Result<Self> {
        delegate.map(Self::from_delegate).ok_or_else(|| {
            AopError::InvalidConfiguration("introduction delegate must not be missing".to_string())
        })
    }

    fn from_delegate(delegate: ObjectRef) -> Self {
        let published: Vec<Capability> = delegate
            .capabilities()
            .into_iter()
            .filter(|capability| !capability.is_framework_internal())
            .collect();
        debug!(
            "Introducing {} capability(ies) from delegate",
            published.len()
        );

        Self {
            delegate,
            published: RwLock::new(published),
        }
    }

    /// Stop publishing `name`. Proxies already built keep both their
    /// capability set and their routing to the delegate; returns whether the
    /// capability was published.
    pub fn suppress_capability(&self, name: &str) -> bool {
        let mut published = self.published.write();
        let before = published.len();
        published.retain(|capability| capability.name() != name);
        published.len() != before
    }

    pub fn delegate(&self) -> &ObjectRef {
        &self.delegate
    }
}

impl Interceptor for DelegatingIntroduction {
    fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
        let capability = invocation.method().capability();
        let published = match invocation.published_by(self) {
            Some(recorded) => recorded.iter().any(|c| c.name() == capability),
            None => IntroductionInterceptor::implements(self, capability),
        };
        if !published {
            return invocation.proceed();
        }

        trace!(invocation = %invocation.id(), "Delegating {}", invocation.method());
        let method = *invocation.method();
        let value = self.delegate.invoke(&method, invocation.arguments_mut())?;
        replace_receiver(value, &self.delegate, invocation)
    }

    fn name(&self) -> &str {
        "DelegatingIntroduction"
    }
}

impl IntroductionInterceptor for DelegatingIntroduction {
    fn introduced_capabilities(&self) -> Vec<Capability> {
        self.published.read().clone()
    }
}
