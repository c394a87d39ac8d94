//! Provider registry: process-wide name → factory lookup.
//!
//! The registry decouples callers from concrete factory types: a platform is
//! resolved by name at runtime, and registering a new platform requires no
//! change to any calling code.
//!
//! Lifecycle: `register` (or [`ProviderRegistry::with_builtin_providers`]) at
//! bootstrap, `get_factory` at any point afterwards, `clear` for test
//! isolation or hot reconfiguration. All operations are serialized through an
//! internal read-write lock, so a concurrent host may interleave lookups with
//! registration safely.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::LlmError;
use crate::traits::ProviderFactory;

/// Name → factory registry.
///
/// Names are matched case-insensitively (keys are lower-cased on insert and
/// lookup). At most one factory per name; the last registration wins.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: RwLock<HashMap<String, Arc<dyn ProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in provider factories pre-registered.
    pub fn with_builtin_providers() -> Self {
        let registry = Self::new();
        crate::providers::register_builtin_providers(&registry);
        registry
    }

    // Every mutation is a single insert or clear, so a guard recovered from
    // a poisoned lock still sees a consistent map.
    fn read_factories(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn ProviderFactory>>> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_factories(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn ProviderFactory>>> {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a factory under `name`, overwriting any prior entry.
    pub fn register(&self, name: &str, factory: Arc<dyn ProviderFactory>) {
        let key = name.to_lowercase();
        tracing::debug!(platform = %key, "registering provider factory");
        self.write_factories().insert(key, factory);
    }

    /// Look up the factory registered under `name`, case-insensitively.
    pub fn get_factory(&self, name: &str) -> Result<Arc<dyn ProviderFactory>, LlmError> {
        self.read_factories()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| LlmError::NotRegistered {
                platform: name.to_string(),
            })
    }

    /// All registered platform names, in unspecified order.
    pub fn list_platforms(&self) -> Vec<String> {
        self.read_factories().keys().cloned().collect()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.write_factories().clear();
    }
}

// Process-wide registry instance.
static GLOBAL_REGISTRY: OnceLock<Arc<ProviderRegistry>> = OnceLock::new();

/// Get the global registry, initialized with the built-in providers on first
/// access.
///
/// Prefer constructing and injecting an explicit [`ProviderRegistry`] where
/// you can (tests always should); this accessor exists for bootstrap
/// convenience.
pub fn global() -> Arc<ProviderRegistry> {
    GLOBAL_REGISTRY
        .get_or_init(|| Arc::new(ProviderRegistry::with_builtin_providers()))
        .clone()
}
