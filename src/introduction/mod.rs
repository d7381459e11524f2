// src/introduction/mod.rs
//! Introductions (mixins)
//!
//! An introduction adds capabilities the target does not have. It sits in
//! the advice chain like any interceptor, answers calls on the capabilities
//! it publishes and proceeds for everything else.
//!
//! - **Delegating**: Introduction backed by a delegate object

pub mod delegating;

use crate::advice::{Advice, Interceptor};
use crate::invocation::method::Capability;
use std::sync::Arc;

// Re-export commonly used types
pub use delegating::DelegatingIntroduction;

/// Interceptor that adds capabilities to a proxy
pub trait IntroductionInterceptor: Interceptor {
    /// Capabilities this introduction publishes
    fn introduced_capabilities(&self) -> Vec<Capability>;

    fn implements(&self, capability: &str) -> bool {
        self.introduced_capabilities()
            .iter()
            .any(|published| published.name() == capability)
    }
}

/// What each introduction in a chain published when a proxy was built
///
/// Suppressing a capability later changes the introduction's live set but
/// not this record, so proxies built earlier keep delegating as they did.
#[derive(Clone, Default)]
pub(crate) struct PublishedCapabilities {
    entries: Arc<Vec<(usize, Vec<Capability>)>>,
}

impl PublishedCapabilities {
    pub(crate) fn capture(chain: &[Advice]) -> Self {
        let entries = chain
            .iter()
            .filter_map(|advice| match advice {
                Advice::Introduction(introduction) => Some((
                    address(&**introduction),
                    introduction.introduced_capabilities(),
                )),
                _ => None,
            })
            .collect();
        Self {
            entries: Arc::new(entries),
        }
    }

    /// The recorded set for `introduction`; `None` when it joined the chain
    /// after the proxy was built
    pub(crate) fn get(
        &self,
        introduction: &dyn IntroductionInterceptor,
    ) -> Option<&[Capability]> {
        let key = address(introduction);
        self.entries
            .iter()
            .find(|(entry, _)| *entry == key)
            .map(|(_, capabilities)| capabilities.as_slice())
    }

    /// Every recorded capability, in chain order
    pub(crate) fn all(&self) -> impl Iterator<Item = Capability> + '_ {
        self.entries
            .iter()
            .flat_map(|(_, capabilities)| capabilities.iter().copied())
    }
}

fn address(introduction: &dyn IntroductionInterceptor) -> usize {
    introduction as *const dyn IntroductionInterceptor as *const () as usize
}
