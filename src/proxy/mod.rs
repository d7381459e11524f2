// src/proxy/mod.rs
//! Proxies and their configuration
//!
//! - **Config**: The shared, mutable advice/target/capability configuration
//! - **Factory**: Validation and proxy construction
//! - **Handle**: The proxy itself and its dispatch entry point
//! - **Assembly**: Building proxies from named definitions
//! - **Macros**: `capability!` and `impl_target!`

pub mod assembly;
pub mod config;
pub mod factory;
pub mod handle;
mod macros;

// Re-export commonly used types
pub use assembly::{ObjectRegistry, ProxyDefinition};
pub use config::AdvisedConfig;
pub use factory::ProxyFactory;
pub use handle::Proxy;
