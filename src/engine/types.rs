//! Universal structure types for the QoreDB structure engine
//!
//! These types provide a normalized representation of relational structure
//! (entities, unique keys, foreign keys) independent of the engine dialect.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace represents the container level above entities
/// - For PostgreSQL: database + schema
/// - For SQL Server: database + schema
/// - For MySQL: database
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    pub database: String,
    pub schema: Option<String>,
}

impl Namespace {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: None,
        }
    }

    pub fn with_schema(database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: Some(schema.into()),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", self.database, schema),
            None => f.write_str(&self.database),
        }
    }
}

/// Identity of an entity (table/view) inside a container
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub namespace: Namespace,
    pub name: String,
}

impl EntityRef {
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Type of entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    #[default]
    Table,
    View,
    MaterializedView,
}

/// Column metadata for an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    /// Column name
    pub name: String,
    /// Data type (database-specific)
    pub data_type: String,
    /// Whether the column allows NULL values
    pub nullable: bool,
    /// Default value expression (if any)
    pub default_value: Option<String>,
    /// Whether this column is part of the primary key
    pub is_primary_key: bool,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default_value: None,
            is_primary_key: false,
        }
    }
}

/// A named relation within a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: EntityRef,
    pub collection_type: CollectionType,
    pub columns: Vec<TableColumn>,
}

impl Entity {
    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Kind of schema object held by a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Entity,
    UniqueKey,
    ForeignKey,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [Self::Entity, Self::UniqueKey, Self::ForeignKey];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::UniqueKey => "unique_key",
            Self::ForeignKey => "foreign_key",
        }
    }

    /// Returns true if objects of this kind share the constraint namespace
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::UniqueKey | Self::ForeignKey)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action taken on referencing rows when the referenced row is deleted/updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifyRule {
    #[default]
    NoAction,
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
}

impl ModifyRule {
    pub const ALL: [ModifyRule; 5] = [
        Self::NoAction,
        Self::Cascade,
        Self::Restrict,
        Self::SetNull,
        Self::SetDefault,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ModifyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate key flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UniqueKeyKind {
    PrimaryKey,
    #[default]
    Unique,
}

/// Candidate key over an ordered attribute set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueKey {
    pub name: String,
    pub entity: EntityRef,
    pub kind: UniqueKeyKind,
    pub columns: Vec<String>,
}

impl UniqueKey {
    pub fn constraint_ref(&self) -> ConstraintRef {
        ConstraintRef::new(self.entity.clone(), self.name.clone())
    }
}

/// Reference to a named constraint on an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintRef {
    pub entity: EntityRef,
    pub name: String,
}

impl ConstraintRef {
    pub fn new(entity: EntityRef, name: impl Into<String>) -> Self {
        Self {
            entity,
            name: name.into(),
        }
    }
}

impl fmt::Display for ConstraintRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.name)
    }
}

/// One (own column, referenced column) pair of a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyColumn {
    /// 1-based position, fixed at creation time
    pub ordinal_position: u32,
    /// The column in the owning entity
    pub column: String,
    /// The column in the referenced unique key
    pub referenced_column: String,
}

/// Foreign key definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub owner: EntityRef,
    pub referenced_key: ConstraintRef,
    pub delete_rule: ModifyRule,
    pub update_rule: ModifyRule,
    pub columns: Vec<ForeignKeyColumn>,
}

/// Any object a schema cache can hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaObject {
    Entity(Entity),
    UniqueKey(UniqueKey),
    ForeignKey(ForeignKey),
}

impl SchemaObject {
    pub fn name(&self) -> &str {
        match self {
            Self::Entity(e) => &e.entity.name,
            Self::UniqueKey(uk) => &uk.name,
            Self::ForeignKey(fk) => &fk.name,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Entity(_) => ObjectKind::Entity,
            Self::UniqueKey(_) => ObjectKind::UniqueKey,
            Self::ForeignKey(_) => ObjectKind::ForeignKey,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        match self {
            Self::Entity(e) => &e.entity.namespace,
            Self::UniqueKey(uk) => &uk.entity.namespace,
            Self::ForeignKey(fk) => &fk.owner.namespace,
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            namespace: self.namespace().clone(),
            kind: self.kind(),
            name: self.name().to_string(),
        }
    }
}

/// Identity of a schema object inside the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: Namespace,
    pub kind: ObjectKind,
    pub name: String,
}

impl ObjectKey {
    /// Key of the unique key a constraint reference points at
    pub fn unique_key(reference: &ConstraintRef) -> Self {
        Self {
            namespace: reference.entity.namespace.clone(),
            kind: ObjectKind::UniqueKey,
            name: reference.name.clone(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.kind, self.namespace, self.name)
    }
}
