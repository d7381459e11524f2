// src/pointcut/regexp.rs
//! Regular-expression method pointcut
//!
//! The pattern must match the whole qualified method name,
//! `"<capability>.<method>"`. Only names are compared: overloads and
//! argument values do not take part in matching.

use crate::advice::Interceptor;
use crate::invocation::method::{Arguments, Method};
use crate::pointcut::attributes::AttributeRegistry;
use crate::pointcut::MethodPointcut;
use crate::utils::errors::{AopError, Result};
use regex::Regex;
use std::sync::Arc;

pub struct RegexpMethodPointcut {
    pattern: String,
    regex: Regex,
    interceptor: Arc<dyn Interceptor>,
}

impl RegexpMethodPointcut {
    pub fn new<I: Interceptor + 'static>(pattern: &str, interceptor: I) -> Result<Self> {
        Self::with_shared(pattern, Arc::new(interceptor))
    }

    pub fn with_shared(pattern: &str, interceptor: Arc<dyn Interceptor>) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|err| {
            AopError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: err.to_string(),
            }
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            interceptor,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, method: &Method) -> bool {
        self.regex.is_match(&method.qualified_name())
    }
}

impl MethodPointcut for RegexpMethodPointcut {
    fn applies(
        &self,
        method: &Method,
        _args: &Arguments,
        _attributes: Option<&dyn AttributeRegistry>,
    ) -> bool {
        self.matches(method)
    }

    fn interceptor(&self) -> Arc<dyn Interceptor> {
        Arc::clone(&self.interceptor)
    }

    fn name(&self) -> &str {
        &self.pattern
    }
}
