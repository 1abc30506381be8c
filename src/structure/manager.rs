// SPDX-License-Identifier: Apache-2.0

//! Constraint Manager
//!
//! Dialect-independent lifecycle for new constraints:
//! 1. `propose`: empty foreign key bound to its owner
//! 2. `populate`: hand the prototype to the edit workflow
//! 3. `assign_name`: derive a collision-free name
//! 4. `finalize`: validate and queue a create command
//!
//! Nothing reaches the command context until every check has passed, and a
//! cancelled workflow leaves no trace anywhere.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::NamingPolicy;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::registry::CacheRegistry;
use crate::engine::types::{
    ConstraintRef, EntityRef, ForeignKey, ForeignKeyColumn, ModifyRule, Namespace, ObjectKey,
    ObjectKind, SchemaObject, UniqueKey, UniqueKeyKind,
};
use crate::metrics;
use crate::structure::command::{CommandAction, CommandContext, CommandId, StructureCommand};
use crate::structure::dialect::DialectProfile;
use crate::structure::naming::ConstraintNamer;
use crate::structure::workflow::{
    ColumnPair, EditOutcome, EditPrototype, EditRequest, EditWorkflow, ForeignKeyDescriptor,
};

const CREATE_FOREIGN_KEY_TITLE: &str = "Create foreign key";

/// In-memory foreign key that has not been queued yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDraft {
    pub owner: EntityRef,
    pub name: Option<String>,
    pub referenced_key: Option<ConstraintRef>,
    pub delete_rule: ModifyRule,
    pub update_rule: ModifyRule,
    pub columns: Vec<ForeignKeyColumn>,
}

impl ForeignKeyDraft {
    pub fn new(owner: EntityRef) -> Self {
        Self {
            owner,
            name: None,
            referenced_key: None,
            delete_rule: ModifyRule::NoAction,
            update_rule: ModifyRule::NoAction,
            columns: Vec::new(),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.column.clone()).collect()
    }
}

/// Result of handing a draft to the edit workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateOutcome {
    Populated(ForeignKeyDraft),
    Cancelled,
}

/// Result of the full create flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Queued {
        command: CommandId,
        foreign_key: ForeignKey,
    },
    Cancelled,
}

pub struct ConstraintManager {
    registry: Arc<CacheRegistry>,
    workflow: Arc<dyn EditWorkflow>,
    dialect: DialectProfile,
    namer: ConstraintNamer,
}

impl ConstraintManager {
    pub fn new(
        registry: Arc<CacheRegistry>,
        workflow: Arc<dyn EditWorkflow>,
        dialect: DialectProfile,
        naming: NamingPolicy,
    ) -> Self {
        Self {
            registry,
            workflow,
            namer: ConstraintNamer::new(naming, dialect),
            dialect,
        }
    }

    pub fn dialect(&self) -> &DialectProfile {
        &self.dialect
    }

    /// Empty foreign key bound to `owner`, both rules NO_ACTION, no columns
    pub fn propose(&self, owner: EntityRef) -> ForeignKeyDraft {
        metrics::record_proposal();
        debug!(owner = %owner, "Foreign key proposed");
        ForeignKeyDraft::new(owner)
    }

    /// Asks the edit workflow to fill in the draft
    ///
    /// Suspends until the operator answers. A cancellation drops the draft.
    #[instrument(skip(self, draft), fields(owner = %draft.owner))]
    pub async fn populate(&self, draft: ForeignKeyDraft) -> EngineResult<PopulateOutcome> {
        let request = EditRequest {
            title: CREATE_FOREIGN_KEY_TITLE.to_string(),
            prototype: EditPrototype::ForeignKey(draft.clone()),
            allowed_modify_rules: self.dialect.modify_rules.to_vec(),
            allow_custom_keys: false,
        };

        match self.workflow.edit(request).await {
            EditOutcome::Cancelled => {
                metrics::record_cancellation();
                info!("Foreign key creation cancelled");
                Ok(PopulateOutcome::Cancelled)
            }
            EditOutcome::Confirmed(descriptor) => {
                let draft = self.apply_descriptor(draft, descriptor)?;
                Ok(PopulateOutcome::Populated(draft))
            }
        }
    }

    fn apply_descriptor(
        &self,
        mut draft: ForeignKeyDraft,
        descriptor: ForeignKeyDescriptor,
    ) -> EngineResult<ForeignKeyDraft> {
        let referenced_key = descriptor
            .referenced_key
            .ok_or_else(|| EngineError::validation("No referenced unique key selected"))?;
        for rule in [descriptor.delete_rule, descriptor.update_rule] {
            if !self.dialect.allows(rule) {
                return Err(EngineError::validation(format!(
                    "Modify rule {} is not supported by {}",
                    rule, self.dialect.id
                )));
            }
        }

        Self::build_columns(&mut draft, &descriptor.columns)?;
        draft.referenced_key = Some(referenced_key);
        draft.delete_rule = descriptor.delete_rule;
        draft.update_rule = descriptor.update_rule;
        Ok(draft)
    }

    /// Appends column pairs with ordinals continuing from the current count
    ///
    /// The whole list is checked before anything is appended.
    pub fn build_columns(draft: &mut ForeignKeyDraft, pairs: &[ColumnPair]) -> EngineResult<()> {
        if pairs.is_empty() {
            return Err(EngineError::validation(
                "A foreign key needs at least one column",
            ));
        }
        if let Some(pair) = pairs
            .iter()
            .find(|p| p.column.trim().is_empty() || p.referenced_column.trim().is_empty())
        {
            return Err(EngineError::validation(format!(
                "Incomplete column pair ({:?} -> {:?})",
                pair.column, pair.referenced_column
            )));
        }

        let start = draft.columns.len() as u32;
        draft
            .columns
            .extend(pairs.iter().enumerate().map(|(i, pair)| ForeignKeyColumn {
                ordinal_position: start + i as u32 + 1,
                column: pair.column.clone(),
                referenced_column: pair.referenced_column.clone(),
            }));
        Ok(())
    }

    /// Names the draft after its owner and columns
    ///
    /// Collisions are checked against the container's cached constraints and
    /// the names already queued in `context`.
    pub async fn assign_name(
        &self,
        draft: &mut ForeignKeyDraft,
        context: &CommandContext,
    ) -> EngineResult<String> {
        let existing = self.taken_names(&draft.owner.namespace, context).await?;
        let name = self
            .namer
            .foreign_key_name(&draft.owner, &draft.column_names(), &existing)?;
        debug!(owner = %draft.owner, name = %name, "Constraint name assigned");
        draft.name = Some(name.clone());
        Ok(name)
    }

    /// Validates the draft and queues its create command
    pub async fn finalize(
        &self,
        draft: ForeignKeyDraft,
        context: &mut CommandContext,
    ) -> EngineResult<(CommandId, ForeignKey)> {
        let name = draft
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| EngineError::validation("Foreign key has no name"))?;
        let referenced_key = draft
            .referenced_key
            .ok_or_else(|| EngineError::validation("No referenced unique key selected"))?;
        if draft.columns.is_empty() {
            return Err(EngineError::validation(
                "A foreign key needs at least one column",
            ));
        }
        let ordinals_valid = draft
            .columns
            .iter()
            .enumerate()
            .all(|(i, c)| c.ordinal_position == i as u32 + 1);
        if !ordinals_valid {
            return Err(EngineError::validation(
                "Column ordinals must run 1..N without gaps",
            ));
        }
        if !self.unique_key_exists(&referenced_key, context).await? {
            return Err(EngineError::validation(format!(
                "Referenced unique key {} does not exist",
                referenced_key
            )));
        }

        let existing = self.taken_names(&draft.owner.namespace, context).await?;
        if self.namer.is_taken(&name, &existing) {
            return Err(EngineError::validation(format!(
                "Constraint '{}' already exists in {}",
                name, draft.owner.namespace
            )));
        }

        let foreign_key = ForeignKey {
            name,
            owner: draft.owner,
            referenced_key,
            delete_rule: draft.delete_rule,
            update_rule: draft.update_rule,
            columns: draft.columns,
        };
        let command = context.enqueue(StructureCommand::create(SchemaObject::ForeignKey(
            foreign_key.clone(),
        )));
        Ok((command, foreign_key))
    }

    /// propose, populate, assign_name and finalize in one go
    #[instrument(skip(self, context), fields(owner = %owner))]
    pub async fn create_foreign_key(
        &self,
        owner: EntityRef,
        context: &mut CommandContext,
    ) -> EngineResult<CreateOutcome> {
        let draft = self.propose(owner);
        let mut draft = match self.populate(draft).await? {
            PopulateOutcome::Populated(draft) => draft,
            PopulateOutcome::Cancelled => return Ok(CreateOutcome::Cancelled),
        };
        self.assign_name(&mut draft, context).await?;
        let (command, foreign_key) = self.finalize(draft, context).await?;
        info!(name = %foreign_key.name, "Foreign key queued");
        Ok(CreateOutcome::Queued {
            command,
            foreign_key,
        })
    }

    /// Names and queues a unique key over `columns`
    pub async fn create_unique_key(
        &self,
        entity: EntityRef,
        kind: UniqueKeyKind,
        columns: Vec<String>,
        context: &mut CommandContext,
    ) -> EngineResult<(CommandId, UniqueKey)> {
        if columns.is_empty() || columns.iter().any(|c| c.trim().is_empty()) {
            return Err(EngineError::validation(
                "A unique key needs at least one named column",
            ));
        }
        let existing = self.taken_names(&entity.namespace, context).await?;
        let name = self.namer.unique_key_name(&entity, &columns, &existing)?;
        let unique_key = UniqueKey {
            name,
            entity,
            kind,
            columns,
        };
        let command = context.enqueue(StructureCommand::create(SchemaObject::UniqueKey(
            unique_key.clone(),
        )));
        Ok((command, unique_key))
    }

    /// Queues a drop of an existing constraint
    pub fn drop_constraint(
        &self,
        object: SchemaObject,
        context: &mut CommandContext,
    ) -> EngineResult<CommandId> {
        if !object.kind().is_constraint() {
            return Err(EngineError::validation(format!(
                "{} is not a constraint",
                object.key()
            )));
        }
        Ok(context.enqueue(StructureCommand::drop(object)))
    }

    /// Whether `reference` names a unique key, cached or queued in `context`
    ///
    /// The latest queued command on the key wins over the cache.
    async fn unique_key_exists(
        &self,
        reference: &ConstraintRef,
        context: &CommandContext,
    ) -> EngineResult<bool> {
        let is_target = |object: &SchemaObject| {
            matches!(object, SchemaObject::UniqueKey(key) if key.entity == reference.entity)
        };

        if let Some(command) = context.latest_pending(&ObjectKey::unique_key(reference)) {
            return Ok(command.action != CommandAction::Drop && is_target(&command.object));
        }
        let snapshot = self
            .registry
            .cache_for(&reference.entity.namespace, ObjectKind::UniqueKey)?
            .objects()
            .await?;
        Ok(snapshot.find(&reference.name).is_some_and(is_target))
    }

    async fn taken_names(
        &self,
        namespace: &Namespace,
        context: &CommandContext,
    ) -> EngineResult<HashSet<String>> {
        let mut existing = self.registry.constraint_names(namespace).await?;
        existing.extend(context.pending_constraint_names(namespace));
        Ok(existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::traits::SchemaSource;
    use crate::structure::command::CommandExecutor;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct FixedSource;

    #[async_trait]
    impl SchemaSource for FixedSource {
        fn source_id(&self) -> &'static str {
            "fixed"
        }

        async fn load_objects(
            &self,
            namespace: &Namespace,
            kind: ObjectKind,
        ) -> EngineResult<Vec<SchemaObject>> {
            let customers = EntityRef::new(namespace.clone(), "customers");
            Ok(match kind {
                ObjectKind::UniqueKey => vec![SchemaObject::UniqueKey(UniqueKey {
                    name: "PK_customers".to_string(),
                    entity: customers.clone(),
                    kind: UniqueKeyKind::PrimaryKey,
                    columns: vec!["id".to_string()],
                })],
                ObjectKind::ForeignKey => vec![SchemaObject::ForeignKey(ForeignKey {
                    name: "FK_orders_customer_id".to_string(),
                    owner: EntityRef::new(namespace.clone(), "orders"),
                    referenced_key: ConstraintRef::new(customers, "PK_customers"),
                    delete_rule: ModifyRule::NoAction,
                    update_rule: ModifyRule::NoAction,
                    columns: vec![],
                })],
                ObjectKind::Entity => vec![],
            })
        }
    }

    struct NoopExecutor;

    #[async_trait]
    impl CommandExecutor for NoopExecutor {
        async fn execute(&self, _command: &StructureCommand) -> EngineResult<()> {
            Ok(())
        }
    }

    /// Replays scripted outcomes and records every request it receives
    struct ScriptedWorkflow {
        outcomes: Mutex<Vec<EditOutcome>>,
        requests: Mutex<Vec<EditRequest>>,
    }

    impl ScriptedWorkflow {
        fn new(outcomes: Vec<EditOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EditWorkflow for ScriptedWorkflow {
        async fn edit(&self, request: EditRequest) -> EditOutcome {
            self.requests.lock().push(request);
            let mut outcomes = self.outcomes.lock();
            if outcomes.is_empty() {
                EditOutcome::Cancelled
            } else {
                outcomes.remove(0)
            }
        }
    }

    fn ns() -> Namespace {
        Namespace::with_schema("sales", "dbo")
    }

    fn orders() -> EntityRef {
        EntityRef::new(ns(), "orders")
    }

    fn pk_customers() -> ConstraintRef {
        ConstraintRef::new(EntityRef::new(ns(), "customers"), "PK_customers")
    }

    fn confirmed(pairs: &[(&str, &str)], delete_rule: ModifyRule) -> EditOutcome {
        EditOutcome::Confirmed(ForeignKeyDescriptor {
            referenced_key: Some(pk_customers()),
            columns: pairs.iter().map(|(a, b)| ColumnPair::new(*a, *b)).collect(),
            delete_rule,
            update_rule: ModifyRule::NoAction,
        })
    }

    fn setup(outcomes: Vec<EditOutcome>) -> (ConstraintManager, CommandContext, Arc<ScriptedWorkflow>) {
        let registry = Arc::new(CacheRegistry::new(Arc::new(FixedSource)));
        registry.register_container(ns());
        let workflow = Arc::new(ScriptedWorkflow::new(outcomes));
        let manager = ConstraintManager::new(
            Arc::clone(&registry),
            workflow.clone(),
            DialectProfile::SQLSERVER,
            NamingPolicy::default(),
        );
        let context = CommandContext::new(registry, Arc::new(NoopExecutor));
        (manager, context, workflow)
    }

    #[test]
    fn test_propose_defaults() {
        let (manager, _, _) = setup(vec![]);
        let draft = manager.propose(orders());

        assert_eq!(draft.owner, orders());
        assert_eq!(draft.delete_rule, ModifyRule::NoAction);
        assert_eq!(draft.update_rule, ModifyRule::NoAction);
        assert!(draft.columns.is_empty());
        assert!(draft.referenced_key.is_none());
        assert!(draft.name.is_none());
    }

    #[test]
    fn test_build_columns_assigns_ordinals_in_input_order() {
        let mut draft = ForeignKeyDraft::new(orders());
        let pairs = vec![
            ColumnPair::new("region", "region"),
            ColumnPair::new("customer_no", "number"),
            ColumnPair::new("branch", "branch"),
        ];
        ConstraintManager::build_columns(&mut draft, &pairs).unwrap();

        let ordinals: Vec<u32> = draft.columns.iter().map(|c| c.ordinal_position).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert_eq!(draft.column_names(), vec!["region", "customer_no", "branch"]);
        assert_eq!(draft.columns[1].referenced_column, "number");
    }

    #[test]
    fn test_build_columns_rejects_empty_and_incomplete_lists() {
        let mut draft = ForeignKeyDraft::new(orders());
        assert!(matches!(
            ConstraintManager::build_columns(&mut draft, &[]),
            Err(EngineError::ValidationError { .. })
        ));

        let pairs = vec![ColumnPair::new("a", "a"), ColumnPair::new("b", " ")];
        assert!(ConstraintManager::build_columns(&mut draft, &pairs).is_err());
        assert!(draft.columns.is_empty());
    }

    #[tokio::test]
    async fn test_populate_passes_dialect_rules_to_workflow() {
        let (manager, _, workflow) = setup(vec![confirmed(&[("customer_id", "id")], ModifyRule::Cascade)]);
        let outcome = manager.populate(manager.propose(orders())).await.unwrap();

        assert!(matches!(outcome, PopulateOutcome::Populated(_)));
        let requests = workflow.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].title, "Create foreign key");
        assert_eq!(requests[0].allowed_modify_rules, ModifyRule::ALL.to_vec());
        assert_eq!(requests[0].prototype.owner(), &orders());
    }

    #[tokio::test]
    async fn test_cancel_leaves_queue_and_cache_untouched() {
        let (manager, mut context, _) = setup(vec![EditOutcome::Cancelled]);
        let fk_cache = manager.registry.cache_for(&ns(), ObjectKind::ForeignKey).unwrap();
        fk_cache.load().await.unwrap();
        let before = fk_cache.snapshot();

        let outcome = manager.create_foreign_key(orders(), &mut context).await.unwrap();

        assert_eq!(outcome, CreateOutcome::Cancelled);
        assert!(context.is_empty());
        let after = fk_cache.snapshot();
        assert_eq!(after.generation(), before.generation());
        assert_eq!(after.objects(), before.objects());
    }

    #[tokio::test]
    async fn test_missing_referenced_key_is_validation_error() {
        let outcome = EditOutcome::Confirmed(ForeignKeyDescriptor {
            referenced_key: None,
            columns: vec![ColumnPair::new("customer_id", "id")],
            delete_rule: ModifyRule::NoAction,
            update_rule: ModifyRule::NoAction,
        });
        let (manager, mut context, _) = setup(vec![outcome]);

        let result = manager.create_foreign_key(orders(), &mut context).await;
        assert!(matches!(result, Err(EngineError::ValidationError { .. })));
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_disallowed_rule_is_validation_error() {
        let registry = Arc::new(CacheRegistry::new(Arc::new(FixedSource)));
        registry.register_container(ns());
        let workflow = Arc::new(ScriptedWorkflow::new(vec![confirmed(
            &[("customer_id", "id")],
            ModifyRule::SetDefault,
        )]));
        let manager = ConstraintManager::new(
            Arc::clone(&registry),
            workflow,
            DialectProfile::MYSQL,
            NamingPolicy::default(),
        );
        let mut context = CommandContext::new(registry, Arc::new(NoopExecutor));

        let result = manager.create_foreign_key(orders(), &mut context).await;
        assert!(matches!(result, Err(EngineError::ValidationError { .. })));
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_orders_to_customers() {
        let (manager, mut context, _) = setup(vec![confirmed(&[("customer_id", "id")], ModifyRule::Cascade)]);

        let outcome = manager.create_foreign_key(orders(), &mut context).await.unwrap();
        let CreateOutcome::Queued { foreign_key, .. } = outcome else {
            panic!("expected a queued foreign key");
        };

        assert_eq!(foreign_key.columns.len(), 1);
        assert_eq!(foreign_key.columns[0].ordinal_position, 1);
        assert_eq!(foreign_key.delete_rule, ModifyRule::Cascade);
        assert_eq!(foreign_key.update_rule, ModifyRule::NoAction);
        assert_eq!(foreign_key.referenced_key, pk_customers());
        // FK_orders_customer_id is already cached
        assert_eq!(foreign_key.name, "FK_orders_customer_id_2");
        assert_eq!(context.len(), 1);
    }

    #[tokio::test]
    async fn test_names_unique_within_one_batch() {
        let (manager, mut context, _) = setup(vec![
            confirmed(&[("customer_id", "id")], ModifyRule::NoAction),
            confirmed(&[("customer_id", "id")], ModifyRule::NoAction),
        ]);

        let first = manager.create_foreign_key(orders(), &mut context).await.unwrap();
        let second = manager.create_foreign_key(orders(), &mut context).await.unwrap();

        let name = |o: CreateOutcome| match o {
            CreateOutcome::Queued { foreign_key, .. } => foreign_key.name,
            CreateOutcome::Cancelled => panic!("unexpected cancel"),
        };
        assert_eq!(name(first), "FK_orders_customer_id_2");
        assert_eq!(name(second), "FK_orders_customer_id_3");
    }

    #[tokio::test]
    async fn test_finalize_rejects_duplicate_name() {
        let (manager, mut context, _) = setup(vec![]);
        let mut draft = manager.propose(orders());
        ConstraintManager::build_columns(&mut draft, &[ColumnPair::new("customer_id", "id")]).unwrap();
        draft.referenced_key = Some(pk_customers());
        draft.name = Some("fk_orders_customer_id".to_string());

        let result = manager.finalize(draft, &mut context).await;
        assert!(matches!(result, Err(EngineError::ValidationError { .. })));
        assert!(context.is_empty());
    }

    fn ready_draft(referenced_key: ConstraintRef) -> ForeignKeyDraft {
        let mut draft = ForeignKeyDraft::new(orders());
        ConstraintManager::build_columns(&mut draft, &[ColumnPair::new("customer_id", "id")]).unwrap();
        draft.referenced_key = Some(referenced_key);
        draft.name = Some("FK_orders_customer".to_string());
        draft
    }

    #[tokio::test]
    async fn test_finalize_rejects_unknown_referenced_key() {
        let (manager, mut context, _) = setup(vec![]);
        let customers = EntityRef::new(ns(), "customers");

        let missing = ready_draft(ConstraintRef::new(customers.clone(), "PK_nowhere"));
        let result = manager.finalize(missing, &mut context).await;
        assert!(matches!(result, Err(EngineError::ValidationError { .. })));

        // A foreign key name is not a valid reference target
        let not_a_key = ready_draft(ConstraintRef::new(customers, "FK_orders_customer_id"));
        let result = manager.finalize(not_a_key, &mut context).await;
        assert!(matches!(result, Err(EngineError::ValidationError { .. })));

        // Right name, wrong entity
        let wrong_entity = ready_draft(ConstraintRef::new(orders(), "PK_customers"));
        assert!(manager.finalize(wrong_entity, &mut context).await.is_err());
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_finalize_accepts_key_queued_earlier_in_batch() {
        let (manager, mut context, _) = setup(vec![]);
        let customers = EntityRef::new(ns(), "customers");
        let (_, key) = manager
            .create_unique_key(
                customers,
                UniqueKeyKind::Unique,
                vec!["email".to_string()],
                &mut context,
            )
            .await
            .unwrap();

        let draft = ready_draft(key.constraint_ref());
        manager.finalize(draft, &mut context).await.unwrap();
        assert_eq!(context.len(), 2);
    }

    #[tokio::test]
    async fn test_finalize_rejects_key_dropped_earlier_in_batch() {
        let (manager, mut context, _) = setup(vec![]);
        let cached = SchemaObject::UniqueKey(UniqueKey {
            name: "PK_customers".to_string(),
            entity: EntityRef::new(ns(), "customers"),
            kind: UniqueKeyKind::PrimaryKey,
            columns: vec!["id".to_string()],
        });
        manager.drop_constraint(cached, &mut context).unwrap();

        let result = manager.finalize(ready_draft(pk_customers()), &mut context).await;
        assert!(matches!(result, Err(EngineError::ValidationError { .. })));
        assert_eq!(context.len(), 1);
    }

    #[tokio::test]
    async fn test_create_unique_key_and_drop() {
        let (manager, mut context, _) = setup(vec![]);

        let (_, key) = manager
            .create_unique_key(
                EntityRef::new(ns(), "customers"),
                UniqueKeyKind::Unique,
                vec!["email".to_string()],
                &mut context,
            )
            .await
            .unwrap();
        assert_eq!(key.name, "UK_customers_email");

        let entity = SchemaObject::Entity(crate::engine::types::Entity {
            entity: orders(),
            collection_type: Default::default(),
            columns: vec![],
        });
        assert!(manager.drop_constraint(entity, &mut context).is_err());
        manager
            .drop_constraint(SchemaObject::UniqueKey(key), &mut context)
            .unwrap();
        assert_eq!(context.len(), 2);
    }
}
