// QoreDB Structure - constraint editing and virtual schema
// Core library

pub mod config;
pub mod engine;
pub mod metrics;
pub mod observability;
pub mod structure;
pub mod virtual_schema;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use config::StructureConfig;
use engine::{CacheRegistry, EngineError, EngineResult, Namespace, SchemaSource};
use structure::{
    CommandContext, CommandExecutor, ConstraintManager, DialectProfile, EditWorkflow,
};
use virtual_schema::{JsonOverlayStore, OverlayPersistence, VirtualSchemaOverlay};

/// Everything one data source needs for structure editing
///
/// Owns the cache registry and the overlay; nothing here lives in statics.
pub struct StructureRuntime {
    pub config: StructureConfig,
    pub dialect: DialectProfile,
    pub registry: Arc<CacheRegistry>,
    pub overlay: Arc<VirtualSchemaOverlay>,
}

impl StructureRuntime {
    pub fn new(
        source: Arc<dyn SchemaSource>,
        dialect: DialectProfile,
        config: StructureConfig,
        overlay_store: Arc<dyn OverlayPersistence>,
    ) -> Self {
        let registry = Arc::new(CacheRegistry::new(source));
        let overlay = Arc::new(VirtualSchemaOverlay::new(
            overlay_store,
            config.naming.clone(),
        ));

        Self {
            config,
            dialect,
            registry,
            overlay,
        }
    }

    /// Loads `structure.json` from `data_dir`, starts file logging and opens
    /// the JSON overlay store
    ///
    /// The dialect is picked from the source id.
    pub fn open(data_dir: &Path, source: Arc<dyn SchemaSource>) -> EngineResult<Self> {
        let dialect = DialectProfile::from_driver_id(source.source_id()).ok_or_else(|| {
            EngineError::not_supported(format!(
                "No dialect profile for source '{}'",
                source.source_id()
            ))
        })?;
        let config = StructureConfig::load(data_dir)?;
        observability::init_tracing(&config.log_dir(data_dir), &config.observability);
        let store = JsonOverlayStore::new(config.overlay_dir(data_dir))?;

        info!(
            source = source.source_id(),
            dialect = dialect.id,
            "Structure runtime opened"
        );
        Ok(Self::new(source, dialect, config, Arc::new(store)))
    }

    /// `open` on the per-user data directory
    pub fn open_default(source: Arc<dyn SchemaSource>) -> EngineResult<Self> {
        Self::open(&config::default_data_dir(), source)
    }

    pub fn register_container(&self, namespace: Namespace) {
        self.registry.register_container(namespace);
    }

    pub fn constraint_manager(&self, workflow: Arc<dyn EditWorkflow>) -> ConstraintManager {
        ConstraintManager::new(
            Arc::clone(&self.registry),
            workflow,
            self.dialect,
            self.config.naming.clone(),
        )
    }

    /// Fresh, empty command queue bound to this runtime's caches
    pub fn command_context(&self, executor: Arc<dyn CommandExecutor>) -> CommandContext {
        CommandContext::new(Arc::clone(&self.registry), executor)
    }
}
