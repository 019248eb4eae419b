//! Generation context shared by the validators and the generator.

use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::metadata::{CloudMetadataProvider, ResourceTypeCache};
use crate::registry::ResourceTypeRegistry;

/// Explicit replacement for process-wide state: the registry, the clock, the
/// metadata cache and the optional live metadata provider.
#[derive(Clone)]
pub struct GenerationContext {
    registry: Arc<ResourceTypeRegistry>,
    clock: Arc<dyn Clock>,
    cache: Arc<ResourceTypeCache>,
    metadata: Option<Arc<dyn CloudMetadataProvider>>,
}

impl GenerationContext {
    /// Context with the built-in Azure registry and the system clock.
    pub fn new() -> Self {
        Self::with_registry(ResourceTypeRegistry::azure())
    }

    pub fn with_registry(registry: ResourceTypeRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            clock: Arc::new(SystemClock),
            cache: Arc::new(ResourceTypeCache::new()),
            metadata: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metadata_provider(mut self, provider: Arc<dyn CloudMetadataProvider>) -> Self {
        self.metadata = Some(provider);
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResourceTypeCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn registry(&self) -> &ResourceTypeRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn cache(&self) -> &ResourceTypeCache {
        &self.cache
    }

    /// The live provider, only when present and authenticated.
    pub fn live_metadata(&self) -> Option<&dyn CloudMetadataProvider> {
        self.metadata
            .as_deref()
            .filter(|provider| provider.is_authenticated())
    }
}

impl Default for GenerationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GenerationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationContext")
            .field("registry", &self.registry.len())
            .field("cached_types", &self.cache.len())
            .field("metadata", &self.metadata.is_some())
            .finish()
    }
}
