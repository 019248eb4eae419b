//! Cloud metadata provider interface and the resource type cache.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreResult;

/// Live source of resource type metadata.
///
/// Implementations may be unauthenticated or unreachable; callers fall back
/// to the static registry in that case.
#[async_trait]
pub trait CloudMetadataProvider: Send + Sync {
    /// Whether live queries can be made.
    fn is_authenticated(&self) -> bool;

    /// All resource types visible to the caller.
    async fn resource_types(&self) -> CoreResult<Vec<String>>;

    /// API versions available for a resource type.
    async fn api_versions(&self, resource_type: &str) -> CoreResult<Vec<String>>;

    /// Regions in which a resource type can be deployed.
    async fn resource_locations(&self, resource_type: &str) -> CoreResult<Vec<String>>;

    /// Whether a resource type exists.
    async fn validate_resource_type(&self, resource_type: &str) -> CoreResult<bool>;
}

/// Metadata previously fetched for one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedTypeInfo {
    pub resource_type: String,
    pub exists: bool,
    pub api_versions: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Process-wide cache of live resource type metadata.
#[derive(Debug, Default)]
pub struct ResourceTypeCache {
    entries: RwLock<HashMap<String, CachedTypeInfo>>,
}

impl ResourceTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource_type: &str) -> Option<CachedTypeInfo> {
        self.entries.read().get(resource_type).cloned()
    }

    pub fn insert(&self, info: CachedTypeInfo) {
        debug!("Caching metadata for {}", info.resource_type);
        self.entries.write().insert(info.resource_type.clone(), info);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Snapshot for persistence.
    pub fn snapshot(&self) -> Vec<CachedTypeInfo> {
        let mut entries: Vec<_> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.resource_type.cmp(&b.resource_type));
        entries
    }

    /// Restore entries from a persisted snapshot.
    pub fn restore(&self, entries: Vec<CachedTypeInfo>) {
        let mut map = self.entries.write();
        for entry in entries {
            map.insert(entry.resource_type.clone(), entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(resource_type: &str) -> CachedTypeInfo {
        CachedTypeInfo {
            resource_type: resource_type.to_string(),
            exists: true,
            api_versions: vec!["2023-01-01".to_string()],
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_cache_insert_and_get() {
        let cache = ResourceTypeCache::new();
        assert!(cache.is_empty());

        cache.insert(cached("Microsoft.Web/sites"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("Microsoft.Web/sites").is_some());
        assert!(cache.get("Microsoft.Web/serverfarms").is_none());
    }

    #[test]
    fn test_cache_snapshot_restore() {
        let cache = ResourceTypeCache::new();
        cache.insert(cached("b/b"));
        cache.insert(cached("a/a"));

        let snapshot = cache.snapshot();
        assert_eq!(snapshot[0].resource_type, "a/a");

        let restored = ResourceTypeCache::new();
        restored.restore(snapshot);
        assert_eq!(restored.len(), 2);
    }
}
