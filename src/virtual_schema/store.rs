// SPDX-License-Identifier: Apache-2.0

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::{EntityRef, Namespace};

use super::types::{OverlayDocument, VirtualEntity};

/// Durable storage for virtual entities; the format is up to the implementation
pub trait OverlayPersistence: Send + Sync {
    fn save(&self, entity: &VirtualEntity) -> EngineResult<()>;

    fn load(&self, entity: &EntityRef) -> EngineResult<Option<VirtualEntity>>;

    /// Returns false when nothing was stored for `entity`
    fn delete(&self, entity: &EntityRef) -> EngineResult<bool>;
}

/// JSON persistence, one file per container
///
/// File stems encode the database and schema separately: `[a-z0-9-]` is kept
/// and every other byte becomes `_xx`, so distinct containers never share a
/// file, even on case-insensitive filesystems.
pub struct JsonOverlayStore {
    data_dir: PathBuf,
    // Held across each load-modify-write of a container file
    documents: Mutex<HashMap<Namespace, OverlayDocument>>,
}

impl JsonOverlayStore {
    pub fn new(data_dir: PathBuf) -> EngineResult<Self> {
        fs::create_dir_all(&data_dir).map_err(|e| {
            EngineError::persistence(format!(
                "Failed to create overlay directory {:?}: {}",
                data_dir, e
            ))
        })?;
        Ok(Self {
            data_dir,
            documents: Mutex::new(HashMap::new()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file_path(&self, namespace: &Namespace) -> PathBuf {
        let mut stem = encode_component(&namespace.database);
        if let Some(schema) = &namespace.schema {
            stem.push('.');
            stem.push_str(&encode_component(schema));
        }
        self.data_dir.join(format!("{}.json", stem))
    }

    fn ensure_loaded<'a>(
        &self,
        documents: &'a mut HashMap<Namespace, OverlayDocument>,
        namespace: &Namespace,
    ) -> EngineResult<&'a mut OverlayDocument> {
        match documents.entry(namespace.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let document = self.read_file(namespace)?;
                Ok(entry.insert(document))
            }
        }
    }

    fn read_file(&self, namespace: &Namespace) -> EngineResult<OverlayDocument> {
        let path = self.file_path(namespace);
        if !path.exists() {
            return Ok(OverlayDocument::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| EngineError::persistence(format!("Failed to read {:?}: {}", path, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| EngineError::persistence(format!("Failed to parse {:?}: {}", path, e)))
    }

    fn write(&self, namespace: &Namespace, document: &OverlayDocument) -> EngineResult<()> {
        let path = self.file_path(namespace);
        let content = serde_json::to_string_pretty(document).map_err(|e| {
            EngineError::persistence(format!("Failed to serialize virtual schema: {}", e))
        })?;
        fs::write(&path, content).map_err(|e| {
            EngineError::persistence(format!("Failed to write {:?}: {}", path, e))
        })?;
        debug!(path = ?path, entities = document.entities.len(), "Virtual schema written");
        Ok(())
    }
}

fn encode_component(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("_{:02x}", byte));
        }
    }
    encoded
}

impl OverlayPersistence for JsonOverlayStore {
    fn save(&self, entity: &VirtualEntity) -> EngineResult<()> {
        let namespace = &entity.entity.namespace;
        let mut documents = self.documents.lock();
        let document = self.ensure_loaded(&mut documents, namespace)?;

        let mut updated = document.clone();
        match updated
            .entities
            .iter()
            .position(|e| e.entity == entity.entity)
        {
            Some(pos) => updated.entities[pos] = entity.clone(),
            None => updated.entities.push(entity.clone()),
        }
        self.write(namespace, &updated)?;
        *document = updated;
        Ok(())
    }

    fn load(&self, entity: &EntityRef) -> EngineResult<Option<VirtualEntity>> {
        let mut documents = self.documents.lock();
        let document = self.ensure_loaded(&mut documents, &entity.namespace)?;
        Ok(document
            .entities
            .iter()
            .find(|e| &e.entity == entity)
            .cloned())
    }

    fn delete(&self, entity: &EntityRef) -> EngineResult<bool> {
        let mut documents = self.documents.lock();
        let document = self.ensure_loaded(&mut documents, &entity.namespace)?;
        if !document.entities.iter().any(|e| &e.entity == entity) {
            return Ok(false);
        }

        let mut updated = document.clone();
        updated.entities.retain(|e| &e.entity != entity);
        self.write(&entity.namespace, &updated)?;
        *document = updated;
        Ok(true)
    }
}

/// Process-local persistence, lost on exit
#[derive(Default)]
pub struct MemoryOverlayStore {
    entities: RwLock<HashMap<EntityRef, VirtualEntity>>,
}

impl MemoryOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}

impl OverlayPersistence for MemoryOverlayStore {
    fn save(&self, entity: &VirtualEntity) -> EngineResult<()> {
        self.entities
            .write()
            .insert(entity.entity.clone(), entity.clone());
        Ok(())
    }

    fn load(&self, entity: &EntityRef) -> EngineResult<Option<VirtualEntity>> {
        Ok(self.entities.read().get(entity).cloned())
    }

    fn delete(&self, entity: &EntityRef) -> EngineResult<bool> {
        Ok(self.entities.write().remove(entity).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{ConstraintRef, ModifyRule};
    use crate::virtual_schema::types::{
        ColorOperator, ColorOverride, TransformSettings, VirtualForeignKey,
        VirtualForeignKeyColumn, VirtualUniqueKey,
    };
    use uuid::Uuid;

    fn ns() -> Namespace {
        Namespace::with_schema("sales", "dbo")
    }

    fn sample() -> VirtualEntity {
        let orders = EntityRef::new(ns(), "orders");
        let mut entity = VirtualEntity::new(orders);
        entity.unique_key = Some(VirtualUniqueKey {
            name: "VK_orders".to_string(),
            attributes: vec!["region".to_string(), "number".to_string()],
        });
        entity.foreign_keys.push(VirtualForeignKey {
            id: Uuid::new_v4(),
            name: "VFK_orders_customer".to_string(),
            referenced_key: ConstraintRef::new(EntityRef::new(ns(), "customers"), "PK_customers"),
            delete_rule: ModifyRule::NoAction,
            update_rule: ModifyRule::NoAction,
            columns: vec![
                VirtualForeignKeyColumn {
                    attribute: "customer_region".to_string(),
                    referenced_attribute: "region".to_string(),
                },
                VirtualForeignKeyColumn {
                    attribute: "customer_no".to_string(),
                    referenced_attribute: "number".to_string(),
                },
            ],
        });
        entity.transforms.insert(
            "payload".to_string(),
            TransformSettings {
                included_transformers: vec!["json".to_string()],
                ..TransformSettings::default()
            },
        );
        entity.color_overrides.push(ColorOverride {
            attribute: "status".to_string(),
            operator: ColorOperator::Equals,
            values: vec![serde_json::json!("LATE")],
            foreground: None,
            background: Some("#ffcccc".to_string()),
            whole_row: true,
        });
        entity
    }

    #[test]
    fn test_json_store_round_trip_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let entity = sample();

        let store = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        store.save(&entity).unwrap();

        let reopened = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        let loaded = reopened.load(&entity.entity).unwrap();
        assert_eq!(loaded, Some(entity));
    }

    #[test]
    fn test_json_store_file_per_container() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        store.save(&sample()).unwrap();
        store
            .save(&VirtualEntity::new(EntityRef::new(Namespace::new("hr"), "people")))
            .unwrap();

        assert!(dir.path().join("sales.dbo.json").exists());
        assert!(dir.path().join("hr.json").exists());
    }

    #[test]
    fn test_similar_container_names_use_separate_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spaced = VirtualEntity::new(EntityRef::new(Namespace::new("my db"), "orders"));
        let mut underscored =
            VirtualEntity::new(EntityRef::new(Namespace::new("my_db"), "orders"));
        underscored.unique_key = Some(VirtualUniqueKey {
            name: "VK_orders".to_string(),
            attributes: vec!["id".to_string()],
        });

        let store = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        store.save(&spaced).unwrap();
        store.save(&underscored).unwrap();
        store.save(&spaced).unwrap();

        let reopened = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.load(&spaced.entity).unwrap(), Some(spaced));
        assert_eq!(reopened.load(&underscored.entity).unwrap(), Some(underscored));
    }

    #[test]
    fn test_dotted_database_does_not_alias_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dotted = EntityRef::new(Namespace::new("sales.dbo"), "orders");
        let schema = sample();

        let store = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        store.save(&VirtualEntity::new(dotted.clone())).unwrap();
        store.save(&schema).unwrap();
        assert_ne!(store.file_path(&dotted.namespace), store.file_path(&ns()));
        assert_ne!(
            store.file_path(&Namespace::new("Sales")),
            store.file_path(&Namespace::new("sales"))
        );

        let reopened = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.load(&schema.entity).unwrap(), Some(schema));
        assert_eq!(reopened.load(&dotted).unwrap(), Some(VirtualEntity::new(dotted)));
    }

    #[test]
    fn test_concurrent_saves_to_one_container_all_land() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        let entities: Vec<VirtualEntity> = (0..8)
            .map(|i| VirtualEntity::new(EntityRef::new(ns(), format!("table_{}", i))))
            .collect();

        std::thread::scope(|scope| {
            for entity in &entities {
                let store = &store;
                scope.spawn(move || store.save(entity).unwrap());
            }
        });

        let reopened = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        for entity in &entities {
            assert_eq!(reopened.load(&entity.entity).unwrap(), Some(entity.clone()));
        }
    }

    #[test]
    fn test_json_store_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();
        let entity = sample();
        store.save(&entity).unwrap();

        assert!(store.delete(&entity.entity).unwrap());
        assert!(!store.delete(&entity.entity).unwrap());
        assert_eq!(store.load(&entity.entity).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_persistence_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("sales.dbo.json"), "{broken").unwrap();
        let store = JsonOverlayStore::new(dir.path().to_path_buf()).unwrap();

        let result = store.load(&EntityRef::new(ns(), "orders"));
        assert!(matches!(result, Err(EngineError::PersistenceError { .. })));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryOverlayStore::new();
        let entity = sample();
        store.save(&entity).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.load(&entity.entity).unwrap(), Some(entity.clone()));
        assert!(store.delete(&entity.entity).unwrap());
        assert!(store.is_empty());
    }
}
