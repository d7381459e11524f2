// src/transaction/interceptor.rs
//! Transaction-demarcating advice
//!
//! ```text
//! attribute for method?
//!   no  → proceed
//!   yes → begin → attach status → proceed
//!           ├─ Ok                → commit (rollback if marked rollback-only)
//!           ├─ Err(target fault) → rollback or commit per rules, rethrow fault
//!           └─ Err(other)        → rollback, rethrow
//! ```

use crate::advice::Interceptor;
use crate::invocation::context::Invocation;
use crate::invocation::exposure::current_invocation;
use crate::invocation::value::Value;
use crate::pointcut::attributes::{find_attribute, AttributeRegistry};
use crate::transaction::{
    RuleBasedTransactionAttribute, TransactionManager, TransactionStatus,
    TRANSACTION_STATUS_ATTACHMENT,
};
use crate::utils::errors::{AopError, Result};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct TransactionInterceptor {
    manager: Arc<dyn TransactionManager>,
    attributes: Arc<dyn AttributeRegistry>,
}

impl TransactionInterceptor {
    pub fn new(
        manager: Arc<dyn TransactionManager>,
        attributes: Arc<dyn AttributeRegistry>,
    ) -> Self {
        Self {
            manager,
            attributes,
        }
    }

    /// Status of the transaction around the exposed invocation on this
    /// thread; requires `expose_invocation`
    pub fn current_status() -> Result<Arc<TransactionStatus>> {
        current_invocation()?
            .attachment(TRANSACTION_STATUS_ATTACHMENT)
            .and_then(|value| value.as_opaque::<TransactionStatus>())
            .ok_or(AopError::NoActiveTransaction)
    }

    fn complete(&self, status: &TransactionStatus, rollback: bool) -> Result<()> {
        let (outcome, result) = if rollback {
            ("rollback", self.manager.rollback(status))
        } else {
            ("commit", self.manager.commit(status))
        };
        status.mark_completed();

        debug!(transaction = %status.id(), outcome, "Completed transaction");
        metrics::counter!("interpose_transactions_total", "outcome" => outcome).increment(1);
        result
    }
}

impl Interceptor for TransactionInterceptor {
    fn invoke(&self, invocation: &mut Invocation) -> Result<Value> {
        let attribute = match find_attribute::<RuleBasedTransactionAttribute>(
            self.attributes.as_ref(),
            invocation.method(),
        ) {
            Some(attribute) => attribute,
            None => return invocation.proceed(),
        };

        let status = Arc::new(self.manager.begin(&attribute)?);
        debug!(
            invocation = %invocation.id(),
            transaction = %status.id(),
            "Began transaction for {}",
            invocation.method()
        );
        invocation.set_attachment(
            TRANSACTION_STATUS_ATTACHMENT,
            Value::opaque(Arc::clone(&status)),
        );

        match invocation.proceed() {
            Ok(value) => {
                self.complete(&status, status.is_rollback_only())?;
                Ok(value)
            }
            Err(err) => {
                let rollback = status.is_rollback_only()
                    || err.fault().map_or(true, |fault| attribute.rollback_on(fault));
                if let Err(completion) = self.complete(&status, rollback) {
                    warn!(
                        transaction = %status.id(),
                        "Failed to complete transaction after error: {}",
                        completion
                    );
                }
                Err(err)
            }
        }
    }

    fn name(&self) -> &str {
        "TransactionInterceptor"
    }
}
