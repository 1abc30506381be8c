// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::types::{ConstraintRef, EntityRef, ModifyRule};

/// Client-side unique key, attributes stored by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualUniqueKey {
    pub name: String,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualForeignKeyColumn {
    pub attribute: String,
    pub referenced_attribute: String,
}

/// Client-side foreign key
///
/// Columns are kept by name so the overlay survives reconnects where live
/// attribute objects are recreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualForeignKey {
    pub id: Uuid,
    pub name: String,
    pub referenced_key: ConstraintRef,
    #[serde(default)]
    pub delete_rule: ModifyRule,
    #[serde(default)]
    pub update_rule: ModifyRule,
    pub columns: Vec<VirtualForeignKeyColumn>,
}

/// Value transform settings for one attribute
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    pub included_transformers: Vec<String>,
    pub excluded_transformers: Vec<String>,
    pub custom_transformer: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl TransformSettings {
    pub fn is_empty(&self) -> bool {
        self.included_transformers.is_empty()
            && self.excluded_transformers.is_empty()
            && self.custom_transformer.is_none()
            && self.properties.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorOperator {
    Equals,
    NotEquals,
    Greater,
    GreaterEquals,
    Less,
    LessEquals,
    IsNull,
    IsNotNull,
    Between,
    Like,
}

/// Conditional cell/row coloring rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorOverride {
    pub attribute: String,
    pub operator: ColorOperator,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
    pub foreground: Option<String>,
    pub background: Option<String>,
    #[serde(default)]
    pub whole_row: bool,
}

impl ColorOverride {
    /// Rules with the same attribute, operator and values replace each other
    pub fn same_condition(&self, other: &ColorOverride) -> bool {
        self.attribute == other.attribute
            && self.operator == other.operator
            && self.values == other.values
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionarySettings {
    pub description_columns: Vec<String>,
}

/// Client-side structure layered over one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualEntity {
    pub entity: EntityRef,
    #[serde(default)]
    pub unique_key: Option<VirtualUniqueKey>,
    #[serde(default)]
    pub foreign_keys: Vec<VirtualForeignKey>,
    #[serde(default)]
    pub transforms: BTreeMap<String, TransformSettings>,
    #[serde(default)]
    pub color_overrides: Vec<ColorOverride>,
    #[serde(default)]
    pub dictionary: Option<DictionarySettings>,
}

impl VirtualEntity {
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            unique_key: None,
            foreign_keys: Vec::new(),
            transforms: BTreeMap::new(),
            color_overrides: Vec::new(),
            dictionary: None,
        }
    }

    pub fn color_overrides_for(&self, attribute: &str) -> Vec<&ColorOverride> {
        self.color_overrides
            .iter()
            .filter(|c| c.attribute == attribute)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.unique_key.is_none()
            && self.foreign_keys.is_empty()
            && self.transforms.is_empty()
            && self.color_overrides.is_empty()
            && self.dictionary.is_none()
    }
}

/// Virtual identifier resolved against a live attribute set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedIdentifier {
    pub attributes: Vec<String>,
    /// Stored names that no longer resolve
    pub unresolved: Vec<String>,
}

impl ResolvedIdentifier {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Virtual foreign key column resolved against live attributes
///
/// `None` marks a side that no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub attribute: Option<String>,
    pub referenced_attribute: Option<String>,
}

/// The on-disk format for one container's overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayDocument {
    pub version: u32,
    pub entities: Vec<VirtualEntity>,
}

impl Default for OverlayDocument {
    fn default() -> Self {
        Self {
            version: 1,
            entities: Vec::new(),
        }
    }
}
