// src/transaction/mod.rs
//! Transaction demarcation
//!
//! - **Attribute**: Propagation, timeouts and rollback rules per method
//! - **Interceptor**: Advice that begins, commits and rolls back
//!
//! No resource manager is provided; callers supply a [`TransactionManager`].

pub mod attribute;
pub mod interceptor;

use crate::utils::errors::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use ulid::Ulid;

// Re-export commonly used types
pub use attribute::{Propagation, RuleBasedTransactionAttribute};
pub use interceptor::TransactionInterceptor;

/// Attachment key under which the running call's status is stored
pub const TRANSACTION_STATUS_ATTACHMENT: &str = "interpose.transaction.status";

/// Begins and completes transactions
pub trait TransactionManager: Send + Sync {
    fn begin(&self, attribute: &RuleBasedTransactionAttribute) -> Result<TransactionStatus>;

    fn commit(&self, status: &TransactionStatus) -> Result<()>;

    fn rollback(&self, status: &TransactionStatus) -> Result<()>;
}

/// State of one transaction
#[derive(Debug)]
pub struct TransactionStatus {
    id: Ulid,
    new_transaction: bool,
    rollback_only: AtomicBool,
    completed: AtomicBool,
}

impl TransactionStatus {
    pub fn new(new_transaction: bool) -> Self {
        Self {
            id: Ulid::new(),
            new_transaction,
            rollback_only: AtomicBool::new(false),
            completed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn is_new_transaction(&self) -> bool {
        self.new_transaction
    }

    /// Roll back even if the call succeeds
    pub fn set_rollback_only(&self) {
        self.rollback_only.store(true, Ordering::SeqCst);
    }

    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only.load(Ordering::SeqCst)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_completed(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }
}
