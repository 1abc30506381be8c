//! SchemaSource trait definition
//!
//! This is the abstraction every physical metadata reader must implement.
//! Caches call it to refresh their contents; how the objects are fetched
//! (catalog queries, driver APIs) stays behind the trait.

use async_trait::async_trait;

use crate::engine::error::EngineResult;
use crate::engine::types::{Namespace, ObjectKind, SchemaObject};

/// Core trait that all metadata readers must implement
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Returns the unique identifier for this source (e.g., "sqlserver", "postgres")
    fn source_id(&self) -> &'static str;

    /// Reads every object of `kind` in `namespace`
    ///
    /// The returned list replaces the cache contents wholesale.
    async fn load_objects(
        &self,
        namespace: &Namespace,
        kind: ObjectKind,
    ) -> EngineResult<Vec<SchemaObject>>;
}
