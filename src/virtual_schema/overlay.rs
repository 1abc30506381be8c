// SPDX-License-Identifier: Apache-2.0

//! Virtual Schema Overlay
//!
//! Client-side keys, transforms and color rules layered over entities. Edits
//! are visible in memory at once; `flush` hands every entity touched since
//! the previous flush to the persistence port.
//!
//! Attribute references are stored by name and resolved lazily. A name that
//! no longer resolves is dropped from the result and recorded as a
//! diagnostic; it never fails the overlay.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::NamingPolicy;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::{ConstraintRef, EntityRef, Namespace, TableColumn};
use crate::metrics;
use crate::structure::dialect::DialectProfile;
use crate::structure::naming::ConstraintNamer;
use crate::structure::workflow::{EditOutcome, EditPrototype, EditRequest, EditWorkflow};

use super::store::OverlayPersistence;
use super::types::{
    ColorOverride, DictionarySettings, ResolvedColumn, ResolvedIdentifier, TransformSettings,
    VirtualEntity, VirtualForeignKey, VirtualForeignKeyColumn, VirtualUniqueKey,
};

const DEFINE_FOREIGN_KEY_TITLE: &str = "Define virtual foreign key";

pub struct VirtualSchemaOverlay {
    entities: RwLock<HashMap<EntityRef, VirtualEntity>>,
    dirty: Mutex<BTreeSet<EntityRef>>,
    diagnostics: Mutex<Vec<EngineError>>,
    store: Arc<dyn OverlayPersistence>,
    namer: ConstraintNamer,
}

impl VirtualSchemaOverlay {
    pub fn new(store: Arc<dyn OverlayPersistence>, naming: NamingPolicy) -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            dirty: Mutex::new(BTreeSet::new()),
            diagnostics: Mutex::new(Vec::new()),
            store,
            namer: ConstraintNamer::new(naming, DialectProfile::VIRTUAL),
        }
    }

    /// Existing overlay for `entity`, or a fresh empty one
    pub fn get_or_create(&self, entity: &EntityRef) -> VirtualEntity {
        if let Some(existing) = self.entities.read().get(entity) {
            return existing.clone();
        }
        self.entities
            .write()
            .entry(entity.clone())
            .or_insert_with(|| VirtualEntity::new(entity.clone()))
            .clone()
    }

    pub fn get(&self, entity: &EntityRef) -> Option<VirtualEntity> {
        self.entities.read().get(entity).cloned()
    }

    pub fn entities(&self) -> Vec<EntityRef> {
        let mut refs: Vec<EntityRef> = self.entities.read().keys().cloned().collect();
        refs.sort();
        refs
    }

    pub fn is_dirty(&self, entity: &EntityRef) -> bool {
        self.dirty.lock().contains(entity)
    }

    fn edit<R>(&self, entity: &EntityRef, f: impl FnOnce(&mut VirtualEntity) -> R) -> R {
        let result = {
            let mut entities = self.entities.write();
            let target = entities
                .entry(entity.clone())
                .or_insert_with(|| VirtualEntity::new(entity.clone()));
            f(target)
        };
        self.dirty.lock().insert(entity.clone());
        result
    }

    fn virtual_key_names(&self, namespace: &Namespace) -> HashSet<String> {
        self.entities
            .read()
            .values()
            .filter(|e| &e.entity.namespace == namespace)
            .flat_map(|e| {
                e.foreign_keys
                    .iter()
                    .map(|fk| fk.name.clone())
                    .chain(e.unique_key.iter().map(|uk| uk.name.clone()))
            })
            .collect()
    }

    /// Stores a virtual foreign key by attribute names
    ///
    /// Names are not checked against live attributes here.
    pub fn add_foreign_key(
        &self,
        entity: &EntityRef,
        attributes: &[String],
        referenced_attributes: &[String],
        referenced_key: ConstraintRef,
    ) -> EngineResult<VirtualForeignKey> {
        if attributes.is_empty() {
            return Err(EngineError::validation(
                "A virtual foreign key needs at least one column",
            ));
        }
        if attributes.len() != referenced_attributes.len() {
            return Err(EngineError::validation(format!(
                "Column count mismatch: {} own, {} referenced",
                attributes.len(),
                referenced_attributes.len()
            )));
        }

        let existing = self.virtual_key_names(&entity.namespace);
        let name = self.namer.foreign_key_name(entity, attributes, &existing)?;
        let foreign_key = VirtualForeignKey {
            id: Uuid::new_v4(),
            name,
            referenced_key,
            delete_rule: Default::default(),
            update_rule: Default::default(),
            columns: attributes
                .iter()
                .zip(referenced_attributes)
                .map(|(a, r)| VirtualForeignKeyColumn {
                    attribute: a.clone(),
                    referenced_attribute: r.clone(),
                })
                .collect(),
        };

        self.edit(entity, |e| e.foreign_keys.push(foreign_key.clone()));
        debug!(entity = %entity, name = %foreign_key.name, "Virtual foreign key added");
        Ok(foreign_key)
    }

    /// Removes the foreign key with `id`; the others keep their order
    pub fn remove_foreign_key(&self, entity: &EntityRef, id: Uuid) -> bool {
        let removed = {
            let mut entities = self.entities.write();
            let Some(target) = entities.get_mut(entity) else {
                return false;
            };
            let before = target.foreign_keys.len();
            target.foreign_keys.retain(|fk| fk.id != id);
            target.foreign_keys.len() != before
        };
        if removed {
            self.dirty.lock().insert(entity.clone());
        }
        removed
    }

    pub fn set_unique_key(
        &self,
        entity: &EntityRef,
        attributes: Vec<String>,
    ) -> EngineResult<VirtualUniqueKey> {
        if attributes.is_empty() {
            return Err(EngineError::validation(
                "A virtual unique key needs at least one attribute",
            ));
        }
        // Redefining keeps the current name
        let current = self
            .get(entity)
            .and_then(|e| e.unique_key)
            .map(|uk| uk.name);
        let name = match current {
            Some(name) => name,
            None => {
                let existing = self.virtual_key_names(&entity.namespace);
                self.namer.unique_key_name(entity, &attributes, &existing)?
            }
        };

        let key = VirtualUniqueKey { name, attributes };
        self.edit(entity, |e| e.unique_key = Some(key.clone()));
        Ok(key)
    }

    pub fn clear_unique_key(&self, entity: &EntityRef) -> bool {
        let had_key = self
            .entities
            .read()
            .get(entity)
            .is_some_and(|e| e.unique_key.is_some());
        if had_key {
            self.edit(entity, |e| e.unique_key = None);
        }
        had_key
    }

    /// Re-associates the virtual unique key with the live attribute set
    pub fn resolve_identifier(
        &self,
        entity: &EntityRef,
        live_attributes: &[TableColumn],
    ) -> ResolvedIdentifier {
        let Some(key) = self.get(entity).and_then(|e| e.unique_key) else {
            return ResolvedIdentifier::default();
        };

        let mut resolved = ResolvedIdentifier::default();
        for name in key.attributes {
            match resolve_name(&name, live_attributes) {
                Some(live) => resolved.attributes.push(live),
                None => {
                    self.record_unresolved(entity, &name);
                    resolved.unresolved.push(name);
                }
            }
        }
        resolved
    }

    /// Resolves each column of a virtual foreign key on both sides
    ///
    /// Returns `None` when the entity has no foreign key with `id`.
    pub fn resolve_foreign_key(
        &self,
        entity: &EntityRef,
        id: Uuid,
        own_attributes: &[TableColumn],
        referenced_attributes: &[TableColumn],
    ) -> Option<Vec<ResolvedColumn>> {
        let foreign_key = self
            .get(entity)?
            .foreign_keys
            .into_iter()
            .find(|fk| fk.id == id)?;
        let referenced_entity = foreign_key.referenced_key.entity.clone();

        let columns = foreign_key
            .columns
            .into_iter()
            .map(|column| {
                let attribute = resolve_name(&column.attribute, own_attributes);
                if attribute.is_none() {
                    self.record_unresolved(entity, &column.attribute);
                }
                let referenced_attribute =
                    resolve_name(&column.referenced_attribute, referenced_attributes);
                if referenced_attribute.is_none() {
                    self.record_unresolved(&referenced_entity, &column.referenced_attribute);
                }
                ResolvedColumn {
                    attribute,
                    referenced_attribute,
                }
            })
            .collect();
        Some(columns)
    }

    fn record_unresolved(&self, entity: &EntityRef, attribute: &str) {
        warn!(entity = %entity, attribute = %attribute, "Virtual attribute no longer resolves, dropped");
        metrics::record_unresolved_attribute();
        self.diagnostics
            .lock()
            .push(EngineError::unresolved(entity.to_string(), attribute));
    }

    pub fn diagnostics(&self) -> Vec<EngineError> {
        self.diagnostics.lock().clone()
    }

    pub fn take_diagnostics(&self) -> Vec<EngineError> {
        std::mem::take(&mut *self.diagnostics.lock())
    }

    /// Last write wins; empty settings remove the entry
    pub fn set_transform(&self, entity: &EntityRef, attribute: &str, settings: TransformSettings) {
        self.edit(entity, |e| {
            if settings.is_empty() {
                e.transforms.remove(attribute);
            } else {
                e.transforms.insert(attribute.to_string(), settings);
            }
        });
    }

    pub fn transform(&self, entity: &EntityRef, attribute: &str) -> Option<TransformSettings> {
        self.entities
            .read()
            .get(entity)
            .and_then(|e| e.transforms.get(attribute).cloned())
    }

    /// Replaces a rule with the same condition, otherwise appends
    pub fn set_color_override(&self, entity: &EntityRef, rule: ColorOverride) {
        self.edit(entity, |e| {
            match e.color_overrides.iter().position(|c| c.same_condition(&rule)) {
                Some(pos) => e.color_overrides[pos] = rule,
                None => e.color_overrides.push(rule),
            }
        });
    }

    pub fn remove_color_overrides(&self, entity: &EntityRef, attribute: &str) -> usize {
        self.edit(entity, |e| {
            let before = e.color_overrides.len();
            e.color_overrides.retain(|c| c.attribute != attribute);
            before - e.color_overrides.len()
        })
    }

    pub fn set_description_columns(&self, entity: &EntityRef, columns: Vec<String>) {
        self.edit(entity, |e| {
            e.dictionary = if columns.is_empty() {
                None
            } else {
                Some(DictionarySettings {
                    description_columns: columns,
                })
            };
        });
    }

    /// Asks the edit workflow for a virtual foreign key on `owner`
    ///
    /// Only NO_ACTION is offered, and virtual keys may be referenced.
    #[instrument(skip(self, workflow), fields(owner = %owner))]
    pub async fn define_foreign_key(
        &self,
        owner: &EntityRef,
        workflow: &dyn EditWorkflow,
    ) -> EngineResult<Option<VirtualForeignKey>> {
        let dialect = DialectProfile::VIRTUAL;
        let request = EditRequest {
            title: DEFINE_FOREIGN_KEY_TITLE.to_string(),
            prototype: EditPrototype::VirtualForeignKey {
                owner: owner.clone(),
            },
            allowed_modify_rules: dialect.modify_rules.to_vec(),
            allow_custom_keys: true,
        };

        let descriptor = match workflow.edit(request).await {
            EditOutcome::Cancelled => {
                metrics::record_cancellation();
                return Ok(None);
            }
            EditOutcome::Confirmed(descriptor) => descriptor,
        };

        let referenced_key = descriptor
            .referenced_key
            .ok_or_else(|| EngineError::validation("No referenced unique key selected"))?;
        for rule in [descriptor.delete_rule, descriptor.update_rule] {
            if !dialect.allows(rule) {
                return Err(EngineError::validation(format!(
                    "Modify rule {} is not supported by virtual keys",
                    rule
                )));
            }
        }
        let (attributes, referenced): (Vec<String>, Vec<String>) = descriptor
            .columns
            .into_iter()
            .map(|p| (p.column, p.referenced_column))
            .unzip();

        self.add_foreign_key(owner, &attributes, &referenced, referenced_key)
            .map(Some)
    }

    /// Persists every entity touched since the last flush
    ///
    /// Entities that failed to save stay dirty for the next attempt. An edit
    /// landing while its entity is being saved marks it dirty again.
    pub fn flush(&self) -> EngineResult<usize> {
        let pending: Vec<EntityRef> = self.dirty.lock().iter().cloned().collect();
        let mut written = 0;

        for entity in pending {
            // Cleared before the read so a concurrent edit re-marks it
            self.dirty.lock().remove(&entity);
            let current = self.get(&entity);
            let result = match current {
                Some(virtual_entity) if !virtual_entity.is_empty() => {
                    self.store.save(&virtual_entity)
                }
                _ => self.store.delete(&entity).map(|_| ()),
            };
            if let Err(e) = result {
                self.dirty.lock().insert(entity.clone());
                warn!(entity = %entity, error = %e, "Virtual schema flush failed");
                return Err(e);
            }
            written += 1;
        }

        if written > 0 {
            info!(entities = written, "Virtual schema flushed");
        }
        Ok(written)
    }

    /// Replaces the in-memory overlay of `entity` with the stored one
    pub fn restore(&self, entity: &EntityRef) -> EngineResult<Option<VirtualEntity>> {
        let stored = self.store.load(entity)?;
        if let Some(virtual_entity) = &stored {
            self.entities
                .write()
                .insert(entity.clone(), virtual_entity.clone());
            self.dirty.lock().remove(entity);
        }
        Ok(stored)
    }

    /// Drops the overlay of `entity`; the stored copy goes on the next flush
    pub fn discard(&self, entity: &EntityRef) -> bool {
        let removed = self.entities.write().remove(entity).is_some();
        if removed {
            self.dirty.lock().insert(entity.clone());
        }
        removed
    }
}

/// Exact match first, then ASCII case-insensitive
fn resolve_name(name: &str, live: &[TableColumn]) -> Option<String> {
    live.iter()
        .find(|c| c.name == name)
        .or_else(|| live.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
        .map(|c| c.name.clone())
}
