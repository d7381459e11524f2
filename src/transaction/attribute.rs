// src/transaction/attribute.rs
//! Transaction attributes
//!
//! The attribute declared on a method says how a transaction is demarcated
//! around it and which faults roll it back.

use crate::invocation::fault::Fault;
use crate::pointcut::rules::{winning_rule, RollbackRule};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a call relates to a transaction already in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// Join the current transaction or start one
    #[default]
    Required,
    RequiresNew,
    Supports,
    NotSupported,
    Mandatory,
    Never,
    Nested,
}

/// Transaction attribute with rollback rules
///
/// Without a matching rule a fault rolls back exactly when it is unchecked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleBasedTransactionAttribute {
    pub propagation: Propagation,
    pub read_only: bool,
    pub timeout_secs: Option<u64>,
    pub rules: Vec<RollbackRule>,
}

impl RuleBasedTransactionAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn with_rule(mut self, rule: RollbackRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Whether `fault` should roll the transaction back
    pub fn rollback_on(&self, fault: &Fault) -> bool {
        match winning_rule(&self.rules, fault.class()) {
            Some(rule) => rule.rolls_back(),
            None => fault.is_unchecked(),
        }
    }
}
