// SPDX-License-Identifier: Apache-2.0

//! Schema Object Cache
//!
//! Per-container, per-kind store of schema objects. Readers always see a
//! complete published snapshot; refreshes and incremental edits build a new
//! collection off to the side and swap it in under a short write lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::SchemaSource;
use crate::engine::types::{Namespace, ObjectKind, SchemaObject};

/// Immutable view of a cache at one point in time
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    objects: Vec<SchemaObject>,
    loaded: bool,
    generation: u64,
    refreshed_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    pub fn objects(&self) -> &[SchemaObject] {
        &self.objects
    }

    /// Whether a full load has completed at least once
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Incremented on every publish
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn find(&self, name: &str) -> Option<&SchemaObject> {
        self.objects.iter().find(|o| o.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.name())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Cache of one object kind inside one container
pub struct SchemaObjectCache {
    namespace: Namespace,
    kind: ObjectKind,
    source: Arc<dyn SchemaSource>,
    published: RwLock<Arc<CacheSnapshot>>,
    /// Serializes refreshes and incremental edits against each other
    writer: Mutex<()>,
}

impl SchemaObjectCache {
    pub fn new(namespace: Namespace, kind: ObjectKind, source: Arc<dyn SchemaSource>) -> Self {
        Self {
            namespace,
            kind,
            source,
            published: RwLock::new(Arc::new(CacheSnapshot::default())),
            writer: Mutex::new(()),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Returns the last published snapshot without waiting for writers
    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.published.read())
    }

    /// Returns the contents, loading them on first access
    pub async fn objects(&self) -> EngineResult<Arc<CacheSnapshot>> {
        let snapshot = self.snapshot();
        if snapshot.is_loaded() {
            return Ok(snapshot);
        }

        let _writer = self.writer.lock().await;
        // Another task may have finished the load while we waited
        let snapshot = self.snapshot();
        if snapshot.is_loaded() {
            return Ok(snapshot);
        }
        self.refresh_locked().await
    }

    /// Full refresh from the source
    ///
    /// On failure the previous snapshot stays published and the error is returned.
    #[instrument(skip(self), fields(container = %self.namespace, kind = %self.kind))]
    pub async fn load(&self) -> EngineResult<Arc<CacheSnapshot>> {
        let _writer = self.writer.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> EngineResult<Arc<CacheSnapshot>> {
        let objects = match self.source.load_objects(&self.namespace, self.kind).await {
            Ok(objects) => objects,
            Err(err) => {
                warn!(error = %err, "Cache refresh failed, keeping last known snapshot");
                return Err(EngineError::load_failed(
                    self.namespace.to_string(),
                    self.kind.as_str(),
                    err.to_string(),
                ));
            }
        };

        let (accepted, rejected): (Vec<_>, Vec<_>) = objects
            .into_iter()
            .partition(|o| o.kind() == self.kind && o.namespace() == &self.namespace);
        if !rejected.is_empty() {
            warn!(
                rejected = rejected.len(),
                "Source returned objects outside this cache, ignoring them"
            );
        }

        let snapshot = self.publish(accepted, true, true);
        debug!(
            count = snapshot.len(),
            generation = snapshot.generation(),
            "Cache refreshed"
        );
        Ok(snapshot)
    }

    /// Adds or replaces an object after a successful commit
    pub async fn add(&self, object: SchemaObject) -> EngineResult<()> {
        self.check_belongs(&object)?;

        let _writer = self.writer.lock().await;
        let current = self.snapshot();
        let mut objects: Vec<SchemaObject> = current
            .objects
            .iter()
            .filter(|o| o.name() != object.name())
            .cloned()
            .collect();
        debug!(container = %self.namespace, kind = %self.kind, name = object.name(), "Cache add");
        objects.push(object);
        self.publish(objects, current.loaded, false);
        Ok(())
    }

    /// Removes an object by name; returns false if it was not cached
    pub async fn remove(&self, name: &str) -> bool {
        let _writer = self.writer.lock().await;
        let current = self.snapshot();
        if current.find(name).is_none() {
            return false;
        }
        let objects: Vec<SchemaObject> = current
            .objects
            .iter()
            .filter(|o| o.name() != name)
            .cloned()
            .collect();
        debug!(container = %self.namespace, kind = %self.kind, name, "Cache remove");
        self.publish(objects, current.loaded, false);
        true
    }

    fn check_belongs(&self, object: &SchemaObject) -> EngineResult<()> {
        if object.kind() != self.kind || object.namespace() != &self.namespace {
            return Err(EngineError::internal(format!(
                "{} does not belong to the {} cache of {}",
                object.key(),
                self.kind,
                self.namespace
            )));
        }
        Ok(())
    }

    /// Swaps in a fully built collection; callers hold `writer`
    fn publish(&self, objects: Vec<SchemaObject>, loaded: bool, refreshed: bool) -> Arc<CacheSnapshot> {
        let mut published = self.published.write();
        let snapshot = Arc::new(CacheSnapshot {
            objects,
            loaded,
            generation: published.generation + 1,
            refreshed_at: if refreshed {
                Some(Utc::now())
            } else {
                published.refreshed_at
            },
        });
        *published = Arc::clone(&snapshot);
        snapshot
    }
}
