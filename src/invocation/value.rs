// src/invocation/value.rs
//! Dynamically typed call values
//!
//! Arguments and return values cross the advice chain as [`Value`]s. Typed
//! code converts with [`IntoValue`] and [`FromValue`]; the generated
//! capability wrappers do this automatically.

use crate::invocation::target::{same_object, ObjectRef};
use crate::proxy::Proxy;
use crate::utils::errors::{AopError, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A call argument or return value
#[derive(Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Json(serde_json::Value),
    /// Another interceptable object (possibly a proxy)
    Object(ObjectRef),
    /// Arbitrary shared payload advice does not interpret
    Opaque(Arc<dyn Any + Send + Sync>),
    /// "The receiver itself"; replaced with the outer proxy on the way out
    This,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Json(_) => "json",
            Value::Object(_) => "object",
            Value::Opaque(_) => "opaque",
            Value::This => "this",
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn opaque<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Value::Opaque(value)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Downcast an opaque payload
    pub fn as_opaque<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Opaque(any) => Arc::clone(any).downcast::<T>().ok(),
            _ => None,
        }
    }

    fn mismatch(expected: &'static str, found: &Value) -> AopError {
        AopError::TypeMismatch {
            expected,
            found: found.type_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) | (Value::This, Value::This) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => same_object(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => {
                std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("Unit"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Json(json) => write!(f, "Json({})", json),
            Value::Object(object) => {
                let names: Vec<_> = object.capabilities().iter().map(|c| c.name()).collect();
                write!(f, "Object({})", names.join(", "))
            }
            Value::Opaque(_) => f.write_str("Opaque(..)"),
            Value::This => f.write_str("This"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Conversion into a [`Value`]
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion out of a [`Value`]
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Unit
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Unit => Ok(()),
            other => Err(Value::mismatch("unit", &other)),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(Value::mismatch("bool", &other)),
        }
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(Value::mismatch("int", &other)),
        }
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(i) => i32::try_from(i).map_err(|_| AopError::TypeMismatch {
                expected: "i32",
                found: "int",
            }),
            other => Err(Value::mismatch("int", &other)),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            other => Err(Value::mismatch("float", &other)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(Value::mismatch("string", &other)),
        }
    }
}

impl IntoValue for serde_json::Value {
    fn into_value(self) -> Value {
        Value::Json(self)
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(json) => Ok(json),
            Value::Unit => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(b)),
            Value::Int(i) => Ok(serde_json::Value::from(i)),
            Value::Str(s) => Ok(serde_json::Value::String(s)),
            other => Err(Value::mismatch("json", &other)),
        }
    }
}

impl IntoValue for ObjectRef {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(object) => Ok(object),
            other => Err(Value::mismatch("object", &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(value) => value.into_value(),
            None => Value::Unit,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Unit => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Return type for methods that hand back their receiver
///
/// Implementations return [`SelfRef::receiver`]; callers going through a
/// proxy receive a `SelfRef` pointing at the proxy.
#[derive(Clone, Default)]
pub struct SelfRef(Option<ObjectRef>);

impl SelfRef {
    pub fn receiver() -> Self {
        Self(None)
    }

    pub fn object(&self) -> Option<&ObjectRef> {
        self.0.as_ref()
    }

    /// Whether this reference points at `proxy`
    pub fn refers_to(&self, proxy: &Proxy) -> bool {
        self.0.as_ref().map_or(false, |object| proxy.is(object))
    }
}

impl IntoValue for SelfRef {
    fn into_value(self) -> Value {
        match self.0 {
            Some(object) => Value::Object(object),
            None => Value::This,
        }
    }
}

impl FromValue for SelfRef {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::This => Ok(SelfRef(None)),
            Value::Object(object) => Ok(SelfRef(Some(object))),
            other => Err(Value::mismatch("object", &other)),
        }
    }
}
