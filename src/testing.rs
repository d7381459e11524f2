// src/testing.rs
//! Shared fixtures for unit tests

use crate::invocation::fault::Fault;
use crate::invocation::value::SelfRef;
use crate::Result;
use std::sync::atomic::{AtomicI64, Ordering};

crate::capability! {
    pub trait Greeter as GreeterCapability = "app.Greeter" {
        fn name(&self) -> String;
        fn greet(&self, whom: String) -> String;
    }
}

crate::capability! {
    pub trait Counter as CounterCapability = "app.Counter" {
        fn increment(&self, by: i64) -> i64;
        fn touch(&self) -> SelfRef;
    }
}

pub struct Person {
    name: String,
}

impl Person {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Greeter for Person {
    fn name(&self) -> Result<String> {
        Ok(self.name.clone())
    }

    fn greet(&self, whom: String) -> Result<String> {
        Ok(format!("Hello {}, I am {}", whom, self.name))
    }
}

crate::impl_target!(Person => GreeterCapability);

#[derive(Default)]
pub struct Tally {
    total: AtomicI64,
}

impl Counter for Tally {
    fn increment(&self, by: i64) -> Result<i64> {
        Ok(self.total.fetch_add(by, Ordering::SeqCst) + by)
    }

    fn touch(&self) -> Result<SelfRef> {
        Ok(SelfRef::receiver())
    }
}

crate::impl_target!(Tally => CounterCapability);

/// Greeter whose every method throws the same fault
pub struct FailingGreeter {
    fault: Fault,
}

impl FailingGreeter {
    pub fn new(fault: Fault) -> Self {
        Self { fault }
    }
}

impl Greeter for FailingGreeter {
    fn name(&self) -> Result<String> {
        Err(self.fault.clone().into())
    }

    fn greet(&self, _whom: String) -> Result<String> {
        Err(self.fault.clone().into())
    }
}

crate::impl_target!(FailingGreeter => GreeterCapability);
