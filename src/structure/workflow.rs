//! Edit workflow port
//!
//! Constraint creation needs a human to pick the referenced key, the column
//! pairs and the modify rules. The core sends one `EditRequest` and waits
//! for exactly one `EditOutcome`; the interactive surface behind the trait
//! is not part of this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::types::{ConstraintRef, EntityRef, ModifyRule};
use crate::structure::manager::ForeignKeyDraft;

/// What is being edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditPrototype {
    /// Physical foreign key, committed through a command context
    ForeignKey(ForeignKeyDraft),
    /// Client-side foreign key on a virtual entity
    VirtualForeignKey { owner: EntityRef },
}

impl EditPrototype {
    pub fn owner(&self) -> &EntityRef {
        match self {
            Self::ForeignKey(draft) => &draft.owner,
            Self::VirtualForeignKey { owner } => owner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    pub title: String,
    pub prototype: EditPrototype,
    pub allowed_modify_rules: Vec<ModifyRule>,
    /// Whether the referenced key may be a virtual (client-side) key
    pub allow_custom_keys: bool,
}

/// One (own attribute, referenced attribute) pair, by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPair {
    pub column: String,
    pub referenced_column: String,
}

impl ColumnPair {
    pub fn new(column: impl Into<String>, referenced_column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            referenced_column: referenced_column.into(),
        }
    }
}

/// Everything the operator picked for a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    pub referenced_key: Option<ConstraintRef>,
    pub columns: Vec<ColumnPair>,
    pub delete_rule: ModifyRule,
    pub update_rule: ModifyRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    Confirmed(ForeignKeyDescriptor),
    Cancelled,
}

/// Synchronous human-interaction port
///
/// Implementations block (or suspend) until the operator confirms or
/// cancels. There is no timeout and no programmatic cancellation.
#[async_trait]
pub trait EditWorkflow: Send + Sync {
    async fn edit(&self, request: EditRequest) -> EditOutcome;
}
