// src/invocation/method.rs
//! Capability and method descriptors, and call arguments

use crate::invocation::value::{FromValue, Value};
use crate::utils::errors::{AopError, Result};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Signature of one method in a capability's dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: &'static str,
    pub params: &'static [&'static str],
}

impl MethodSignature {
    pub const fn new(name: &'static str, params: &'static [&'static str]) -> Self {
        Self { name, params }
    }
}

/// A named interface: the unit a proxy exposes
///
/// Two capabilities are the same capability when their fully-qualified
/// names are equal.
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    name: &'static str,
    methods: &'static [MethodSignature],
}

impl Capability {
    /// Identity and description methods answered by every proxy
    pub const OBJECT: Capability = Capability::new(
        "interpose.Object",
        &[
            MethodSignature::new("equals", &["Value"]),
            MethodSignature::new("hash_code", &[]),
            MethodSignature::new("to_string", &[]),
        ],
    );

    /// Configuration introspection surface of a proxy
    pub const ADVISED: Capability = Capability::new("interpose.Advised", &[]);

    pub const INTERCEPTOR: Capability = Capability::new(
        "interpose.Interceptor",
        &[MethodSignature::new("invoke", &["Invocation"])],
    );

    pub const INTRODUCTION_INTERCEPTOR: Capability = Capability::new(
        "interpose.IntroductionInterceptor",
        &[
            MethodSignature::new("invoke", &["Invocation"]),
            MethodSignature::new("introduced_capabilities", &[]),
        ],
    );

    pub const fn new(name: &'static str, methods: &'static [MethodSignature]) -> Self {
        Self { name, methods }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn methods(&self) -> &'static [MethodSignature] {
        self.methods
    }

    /// Descriptor for the first method with this name
    pub fn method(&self, name: &str) -> Option<Method> {
        self.methods
            .iter()
            .find(|signature| signature.name == name)
            .map(|signature| Method::new(self.name, signature.name, signature.params))
    }

    /// Capabilities owned by the framework itself; never published by
    /// introductions
    pub fn is_framework_internal(&self) -> bool {
        [
            Self::OBJECT.name,
            Self::ADVISED.name,
            Self::INTERCEPTOR.name,
            Self::INTRODUCTION_INTERCEPTOR.name,
        ]
        .contains(&self.name)
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Abstract call descriptor: declaring capability, name and signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Method {
    capability: &'static str,
    name: &'static str,
    params: &'static [&'static str],
}

impl Method {
    pub const EQUALS: Method = Method::new("interpose.Object", "equals", &["Value"]);
    pub const HASH_CODE: Method = Method::new("interpose.Object", "hash_code", &[]);
    pub const TO_STRING: Method = Method::new("interpose.Object", "to_string", &[]);

    pub const fn new(
        capability: &'static str,
        name: &'static str,
        params: &'static [&'static str],
    ) -> Self {
        Self {
            capability,
            name,
            params,
        }
    }

    /// Name of the declaring capability
    pub fn capability(&self) -> &'static str {
        self.capability
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }

    /// `"<capability>.<method>"`, the string pointcuts match against
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.capability, self.name)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.capability,
            self.name,
            self.params.join(", ")
        )
    }
}

/// Mutable, index-addressable call arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Replace the argument at `index`, returning the previous value
    pub fn set(&mut self, index: usize, value: Value) -> Result<Value> {
        let length = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(AopError::IndexOutOfRange { index, length })?;
        Ok(std::mem::replace(slot, value))
    }

    /// Typed copy of the argument at `index`
    pub fn extract<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.values.get(index).cloned().ok_or(AopError::IndexOutOfRange {
            index,
            length: self.values.len(),
        })?;
        T::from_value(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }

    /// Fail unless exactly `expected` arguments were supplied
    pub fn expect_len(&self, method: &Method, expected: usize) -> Result<()> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(AopError::ArgumentCount {
                method: method.qualified_name(),
                expected,
                actual: self.values.len(),
            })
        }
    }

    /// Sequential typed reader used by generated dispatch code
    pub fn cursor(&self) -> ArgumentCursor<'_> {
        ArgumentCursor {
            args: self,
            index: 0,
        }
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// Reads arguments front to back, converting each to the requested type
pub struct ArgumentCursor<'a> {
    args: &'a Arguments,
    index: usize,
}

impl ArgumentCursor<'_> {
    pub fn take<T: FromValue>(&mut self) -> Result<T> {
        let value = self.args.extract(self.index)?;
        self.index += 1;
        Ok(value)
    }
}
