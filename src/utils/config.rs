// src/utils/config.rs
//! Layered configuration
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. An optional configuration file (TOML, YAML or JSON by extension)
//! 3. `INTERPOSE_*` environment variables, `__` separating nested keys
//!    (e.g. `INTERPOSE_LOGGING__LEVEL=debug`)

use crate::proxy::assembly::{ObjectRegistry, ProxyDefinition};
use crate::proxy::{Proxy, ProxyFactory};
use crate::utils::errors::{AopError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Default configuration file looked up by [`InterposeConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "interpose";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "INTERPOSE";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (e.g. "info", "interpose=debug")
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Defaults applied to proxies assembled from definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyDefaults {
    /// Publish running invocations on the thread-local stack
    pub expose_invocation: bool,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterposeConfig {
    pub logging: LoggingConfig,

    pub proxy: ProxyDefaults,

    /// Named proxy definitions
    pub definitions: HashMap<String, ProxyDefinition>,
}

impl InterposeConfig {
    /// Load from `interpose.{toml,yaml,json}` in the working directory (if
    /// present) and the environment
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        info!(
            "Loaded configuration with {} proxy definition(s)",
            config.definitions.len()
        );
        Ok(config)
    }

    /// Load from an explicit file, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {:?}", path);

        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Look up a named proxy definition
    pub fn definition(&self, name: &str) -> Result<&ProxyDefinition> {
        self.definitions
            .get(name)
            .ok_or_else(|| AopError::UnknownObject(format!("proxy definition '{}'", name)))
    }

    /// Assemble and build the named proxy, applying [`ProxyDefaults`]
    pub fn build_proxy(&self, name: &str, registry: &ObjectRegistry) -> Result<Proxy> {
        let mut definition = self.definition(name)?.clone();
        if definition.expose_invocation.is_none() {
            definition.expose_invocation = Some(self.proxy.expose_invocation);
        }
        ProxyFactory::from_definition(&definition, registry)
    }
}
