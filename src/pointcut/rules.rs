// src/pointcut/rules.rs
//! Rollback rules
//!
//! A rule names a fragment of an error-class name and says whether faults
//! matching it roll back. A rule's depth for a class is the number of
//! superclass steps from the class to the first class whose name contains
//! the fragment:
//!
//! ```text
//! rule "lang.Exception" against ejb.EJBException:
//!
//! ejb.EJBException          0   no match
//! lang.RuntimeException     1   no match
//! lang.Exception            2   match → depth 2
//! ```
//!
//! The rule with the smallest depth wins; among equal depths the first one
//! registered wins.

use crate::invocation::fault::ErrorClass;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackRule {
    pattern: String,
    rollback: bool,
}

impl RollbackRule {
    /// Faults matching `pattern` roll back
    pub fn rollback_on(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            rollback: true,
        }
    }

    /// Faults matching `pattern` commit
    pub fn no_rollback_on(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            rollback: false,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn rolls_back(&self) -> bool {
        self.rollback
    }

    /// Superclass steps from `class` to the first class whose name contains
    /// the pattern; `None` when no class up to the root matches
    pub fn depth(&self, class: &ErrorClass) -> Option<usize> {
        class
            .ancestors()
            .position(|ancestor| ancestor.name().contains(self.pattern.as_str()))
    }
}

impl fmt::Display for RollbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.rollback { "+" } else { "-" };
        write!(f, "{}{}", prefix, self.pattern)
    }
}

/// The rule with the smallest depth for `class`; ties go to the earliest
pub fn winning_rule<'a>(rules: &'a [RollbackRule], class: &ErrorClass) -> Option<&'a RollbackRule> {
    let mut winner: Option<(usize, &RollbackRule)> = None;
    for rule in rules {
        if let Some(depth) = rule.depth(class) {
            if winner.map_or(true, |(best, _)| depth < best) {
                winner = Some((depth, rule));
            }
        }
    }
    winner.map(|(_, rule)| rule)
}
