// src/advice/mod.rs
//! Advice: units of behaviour woven around a call
//!
//! - **Interceptor**: The single-operation advice contract
//! - **Invoker**: Terminal advice (target invocation, proxy hand-off)
//! - **Logging**: Tracing and counting advice
//!
//! A proxy configuration holds an ordered list of [`Advice`] entries. Plain
//! interceptors always run; pointcut entries run their interceptor only when
//! the pointcut applies to the call; introductions answer calls on the
//! capabilities they add.

pub mod invoker;
pub mod logging;

use crate::introduction::IntroductionInterceptor;
use crate::invocation::context::Invocation;
use crate::invocation::method::Capability;
use crate::invocation::value::Value;
use crate::pointcut::MethodPointcut;
use crate::utils::errors::{AopError, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

// Re-export commonly used types
pub use invoker::{ProxyForwarder, TargetInvoker};
pub use logging::{CountingInterceptor, TracingInterceptor};

/// Around advice
///
/// Implementations either call [`Invocation::proceed`] (zero, one or, via
/// [`Invocation::invocable_clone`], several times) or produce their own
/// result. Target faults should be propagated unless the advice exists to
/// translate them.
pub trait Interceptor: Send + Sync {
    fn invoke(&self, invocation: &mut Invocation) -> Result<Value>;

    /// Name used in logs and error messages
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Terminal advice ends the chain: it never proceeds, so nothing may be
    /// placed after it
    fn is_terminal(&self) -> bool {
        false
    }
}

/// An entry in a proxy's advice list
#[derive(Clone)]
pub enum Advice {
    Interceptor(Arc<dyn Interceptor>),
    Pointcut(Arc<dyn MethodPointcut>),
    Introduction(Arc<dyn IntroductionInterceptor>),
}

impl Advice {
    pub fn interceptor<I: Interceptor + 'static>(interceptor: I) -> Self {
        Advice::Interceptor(Arc::new(interceptor))
    }

    pub fn pointcut<P: MethodPointcut + 'static>(pointcut: P) -> Self {
        Advice::Pointcut(Arc::new(pointcut))
    }

    pub fn introduction<I: IntroductionInterceptor + 'static>(introduction: I) -> Self {
        Advice::Introduction(Arc::new(introduction))
    }

    /// Resolve an arbitrary registered object as advice
    ///
    /// Accepts an [`Advice`] or a shared interceptor, pointcut or
    /// introduction; anything else is rejected.
    pub fn from_object(name: &str, object: Arc<dyn Any + Send + Sync>) -> Result<Self> {
        let object = match object.downcast::<Advice>() {
            Ok(advice) => return Ok(advice.as_ref().clone()),
            Err(object) => object,
        };
        let object = match object.downcast::<Arc<dyn Interceptor>>() {
            Ok(interceptor) => return Ok(Advice::Interceptor(Arc::clone(&interceptor))),
            Err(object) => object,
        };
        let object = match object.downcast::<Arc<dyn MethodPointcut>>() {
            Ok(pointcut) => return Ok(Advice::Pointcut(Arc::clone(&pointcut))),
            Err(object) => object,
        };
        match object.downcast::<Arc<dyn IntroductionInterceptor>>() {
            Ok(introduction) => Ok(Advice::Introduction(Arc::clone(&introduction))),
            Err(_) => Err(AopError::NotAdvice(name.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Advice::Interceptor(interceptor) => interceptor.name(),
            Advice::Pointcut(pointcut) => pointcut.name(),
            Advice::Introduction(introduction) => introduction.name(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            Advice::Interceptor(interceptor) => interceptor.is_terminal(),
            Advice::Pointcut(_) | Advice::Introduction(_) => false,
        }
    }

    /// Capabilities this entry adds to a proxy
    pub fn introduced_capabilities(&self) -> Vec<Capability> {
        match self {
            Advice::Introduction(introduction) => introduction.introduced_capabilities(),
            _ => Vec::new(),
        }
    }

    /// Identity comparison: both entries wrap the same advice object
    pub fn is_same(&self, other: &Advice) -> bool {
        fn addr<T: ?Sized>(arc: &Arc<T>) -> *const () {
            Arc::as_ptr(arc) as *const ()
        }

        match (self, other) {
            (Advice::Interceptor(a), Advice::Interceptor(b)) => addr(a) == addr(b),
            (Advice::Pointcut(a), Advice::Pointcut(b)) => addr(a) == addr(b),
            (Advice::Introduction(a), Advice::Introduction(b)) => addr(a) == addr(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Advice::Interceptor(_) => "Interceptor",
            Advice::Pointcut(_) => "Pointcut",
            Advice::Introduction(_) => "Introduction",
        };
        write!(f, "{}({})", kind, self.name())
    }
}
