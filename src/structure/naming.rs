// SPDX-License-Identifier: Apache-2.0

//! Constraint name generation
//!
//! Names are derived from the owning entity and the column list, then
//! suffixed `_2`, `_3`, ... until they no longer collide with an existing
//! name. The same inputs and the same existing-name set always produce the
//! same result.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::NamingPolicy;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::EntityRef;
use crate::structure::dialect::DialectProfile;

fn non_word() -> Option<&'static Regex> {
    static NON_WORD: OnceLock<Option<Regex>> = OnceLock::new();
    NON_WORD
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").ok())
        .as_ref()
}

/// Generates collision-free constraint names for one dialect
#[derive(Debug, Clone)]
pub struct ConstraintNamer {
    policy: NamingPolicy,
    dialect: DialectProfile,
}

impl ConstraintNamer {
    pub fn new(policy: NamingPolicy, dialect: DialectProfile) -> Self {
        Self { policy, dialect }
    }

    pub fn foreign_key_name(
        &self,
        owner: &EntityRef,
        columns: &[String],
        existing: &HashSet<String>,
    ) -> EngineResult<String> {
        self.generate(&self.policy.foreign_key_prefix, owner, columns, existing)
    }

    pub fn unique_key_name(
        &self,
        owner: &EntityRef,
        columns: &[String],
        existing: &HashSet<String>,
    ) -> EngineResult<String> {
        self.generate(&self.policy.unique_key_prefix, owner, columns, existing)
    }

    /// Whether `name` is already used, honouring the dialect's case folding
    pub fn is_taken(&self, name: &str, existing: &HashSet<String>) -> bool {
        let folded = self.fold(name);
        existing.iter().any(|n| self.fold(n) == folded)
    }

    fn generate(
        &self,
        prefix: &str,
        owner: &EntityRef,
        columns: &[String],
        existing: &HashSet<String>,
    ) -> EngineResult<String> {
        let base = base_name(prefix, &owner.name, columns);
        if base.is_empty() {
            return Err(EngineError::validation(format!(
                "Cannot derive a constraint name for {}",
                owner
            )));
        }

        let limit = self
            .dialect
            .max_identifier_length
            .min(self.policy.max_identifier_length)
            .max(1);
        let taken: HashSet<String> = existing.iter().map(|n| self.fold(n)).collect();

        for attempt in 1..=self.policy.max_attempts {
            let suffix = if attempt == 1 {
                String::new()
            } else {
                format!("_{}", attempt)
            };
            let candidate = fit(&base, &suffix, limit);
            if !taken.contains(&self.fold(&candidate)) {
                return Ok(candidate);
            }
        }

        Err(EngineError::naming_conflict(base, self.policy.max_attempts))
    }

    fn fold(&self, name: &str) -> String {
        if self.dialect.case_insensitive_names {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }
}

fn base_name(prefix: &str, owner: &str, columns: &[String]) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(columns.len() + 2);
    parts.push(prefix);
    parts.push(owner);
    parts.extend(columns.iter().map(String::as_str));

    let raw = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let sanitized = match non_word() {
        Some(pattern) => pattern.replace_all(&raw, "_").into_owned(),
        None => raw,
    };
    sanitized.trim_matches('_').to_string()
}

/// Truncates `base` so that `base + suffix` fits in `limit` characters
fn fit(base: &str, suffix: &str, limit: usize) -> String {
    let keep = limit.saturating_sub(suffix.chars().count());
    let truncated: String = base.chars().take(keep).collect();
    let mut name = truncated.trim_end_matches('_').to_string();
    name.push_str(suffix);
    name
}
