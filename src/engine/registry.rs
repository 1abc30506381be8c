//! Cache Registry
//!
//! Typed lookup table from (container, object kind) to the single cache
//! instance serving that pair. Containers are registered up front; lookups
//! never create caches behind the caller's back.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::engine::cache::SchemaObjectCache;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::SchemaSource;
use crate::engine::types::{Namespace, ObjectKind};

/// Registry that owns every schema cache for one data source
pub struct CacheRegistry {
    source: Arc<dyn SchemaSource>,
    caches: RwLock<HashMap<(Namespace, ObjectKind), Arc<SchemaObjectCache>>>,
}

impl CacheRegistry {
    /// Creates an empty registry backed by `source`
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            source,
            caches: RwLock::new(HashMap::new()),
        }
    }

    pub fn source_id(&self) -> &'static str {
        self.source.source_id()
    }

    /// Registers a container, creating one cache per object kind
    ///
    /// Registering the same container twice keeps the existing caches.
    pub fn register_container(&self, namespace: Namespace) {
        let mut caches = self.caches.write();
        let mut created = 0;
        for kind in ObjectKind::ALL {
            caches
                .entry((namespace.clone(), kind))
                .or_insert_with(|| {
                    created += 1;
                    Arc::new(SchemaObjectCache::new(
                        namespace.clone(),
                        kind,
                        Arc::clone(&self.source),
                    ))
                });
        }
        if created > 0 {
            info!(container = %namespace, "Registered schema caches");
        }
    }

    /// Gets the cache for a (container, kind) pair
    pub fn cache_for(
        &self,
        namespace: &Namespace,
        kind: ObjectKind,
    ) -> EngineResult<Arc<SchemaObjectCache>> {
        self.caches
            .read()
            .get(&(namespace.clone(), kind))
            .cloned()
            .ok_or_else(|| EngineError::container_not_found(namespace.to_string()))
    }

    /// Lists all registered containers
    pub fn containers(&self) -> Vec<Namespace> {
        let caches = self.caches.read();
        let mut containers: Vec<Namespace> = caches
            .keys()
            .map(|(ns, _)| ns.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        containers.sort();
        containers
    }

    /// Current constraint names of a container (unique keys and foreign keys)
    ///
    /// Loads the constraint caches on first use.
    pub async fn constraint_names(&self, namespace: &Namespace) -> EngineResult<HashSet<String>> {
        let mut names = HashSet::new();
        for kind in ObjectKind::ALL.into_iter().filter(|k| k.is_constraint()) {
            let snapshot = self.cache_for(namespace, kind)?.objects().await?;
            names.extend(snapshot.names().map(str::to_string));
        }
        Ok(names)
    }

    /// Returns the number of registered caches
    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    /// Returns true if no container is registered
    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }
}
