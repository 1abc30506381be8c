// SPDX-License-Identifier: Apache-2.0

//! Command Context
//!
//! Ordered queue of pending structural changes. `commit` runs the batch as a
//! single ordered pass:
//! 1. Order commands so every dependency runs no later than its dependent
//! 2. Execute them one by one through the `CommandExecutor` port
//! 3. Reflect each successful command in its schema cache
//!
//! Execution stops at the first failure. Commands already applied stay
//! applied, the rest of the batch is abandoned.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::registry::CacheRegistry;
use crate::engine::types::{Namespace, ObjectKey, SchemaObject};
use crate::metrics;

/// Unique identifier for a queued command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub Uuid);

impl CommandId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Create,
    Alter,
    Drop,
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Alter => "alter",
            Self::Drop => "drop",
        })
    }
}

/// A pending structural change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureCommand {
    pub id: CommandId,
    pub action: CommandAction,
    pub object: SchemaObject,
}

impl StructureCommand {
    pub fn new(action: CommandAction, object: SchemaObject) -> Self {
        Self {
            id: CommandId::new(),
            action,
            object,
        }
    }

    pub fn create(object: SchemaObject) -> Self {
        Self::new(CommandAction::Create, object)
    }

    pub fn drop(object: SchemaObject) -> Self {
        Self::new(CommandAction::Drop, object)
    }

    pub fn describe(&self) -> String {
        format!("{} {}", self.action, self.object.key())
    }

    fn is_drop(&self) -> bool {
        self.action == CommandAction::Drop
    }

    /// Unique key a foreign key command points at
    fn referenced_key(&self) -> Option<ObjectKey> {
        match &self.object {
            SchemaObject::ForeignKey(fk) => Some(ObjectKey::unique_key(&fk.referenced_key)),
            _ => None,
        }
    }
}

/// Port that applies a single command to the physical data source
///
/// Dialect-specific DDL generation and transport live behind this trait.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &StructureCommand) -> EngineResult<()>;
}

/// Successful commit summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitReport {
    /// Commands in the order they were applied
    pub applied: Vec<CommandId>,
    pub elapsed_ms: f64,
}

/// Commit stopped at `failed`; nothing after it in the batch was attempted
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("Commit failed at {operation}: {cause}")]
pub struct CommitFailure {
    pub failed: CommandId,
    pub operation: String,
    #[source]
    pub cause: EngineError,
    pub applied: Vec<CommandId>,
    pub abandoned: Vec<CommandId>,
}

pub struct CommandContext {
    registry: Arc<CacheRegistry>,
    executor: Arc<dyn CommandExecutor>,
    commands: Vec<StructureCommand>,
}

impl CommandContext {
    pub fn new(registry: Arc<CacheRegistry>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            registry,
            executor,
            commands: Vec::new(),
        }
    }

    /// Queues a command and returns its id
    pub fn enqueue(&mut self, command: StructureCommand) -> CommandId {
        let id = command.id;
        debug!(command = %command.describe(), "Command queued");
        metrics::record_enqueue();
        self.commands.push(command);
        id
    }

    /// Removes a queued command; returns false if it is not queued
    pub fn discard(&mut self, id: CommandId) -> bool {
        let before = self.commands.len();
        self.commands.retain(|c| c.id != id);
        self.commands.len() != before
    }

    pub fn pending(&self) -> &[StructureCommand] {
        &self.commands
    }

    /// Constraint names that queued create/alter commands will introduce
    pub fn pending_constraint_names(&self, namespace: &Namespace) -> HashSet<String> {
        self.commands
            .iter()
            .filter(|c| !c.is_drop())
            .filter(|c| c.object.kind().is_constraint() && c.object.namespace() == namespace)
            .map(|c| c.object.name().to_string())
            .collect()
    }

    /// Latest queued command on `key`, if any
    pub fn latest_pending(&self, key: &ObjectKey) -> Option<&StructureCommand> {
        self.commands.iter().rev().find(|c| &c.object.key() == key)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Executes the whole queue in dependency order
    ///
    /// The queue is empty afterwards whether or not the commit succeeded.
    #[instrument(skip(self), fields(commands = self.commands.len()))]
    pub async fn commit(&mut self) -> Result<CommitReport, CommitFailure> {
        let started = Instant::now();
        let commands = std::mem::take(&mut self.commands);

        let order = match self.prepare(&commands) {
            Ok(order) => order,
            Err((index, cause)) => {
                warn!(error = %cause, "Commit rejected before execution");
                metrics::record_commit(started.elapsed().as_secs_f64() * 1000.0, 0, false);
                return Err(CommitFailure {
                    failed: commands[index].id,
                    operation: commands[index].describe(),
                    cause,
                    applied: Vec::new(),
                    abandoned: commands.iter().map(|c| c.id).collect(),
                });
            }
        };

        let mut applied = Vec::with_capacity(order.len());
        for (position, &index) in order.iter().enumerate() {
            let command = &commands[index];
            if let Err(cause) = self.executor.execute(command).await {
                error!(command = %command.describe(), error = %cause, "Command failed");
                metrics::record_commit(
                    started.elapsed().as_secs_f64() * 1000.0,
                    applied.len(),
                    false,
                );
                return Err(CommitFailure {
                    failed: command.id,
                    operation: command.describe(),
                    cause,
                    applied,
                    abandoned: order[position + 1..]
                        .iter()
                        .map(|&i| commands[i].id)
                        .collect(),
                });
            }

            if let Err(err) = self.apply_to_cache(command).await {
                warn!(command = %command.describe(), error = %err, "Cache not updated after command");
            }
            applied.push(command.id);
        }

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::record_commit(elapsed_ms, applied.len(), true);
        info!(applied = applied.len(), elapsed_ms, "Commit completed");
        Ok(CommitReport {
            applied,
            elapsed_ms,
        })
    }

    /// Validates the batch and computes its execution order
    fn prepare(&self, commands: &[StructureCommand]) -> Result<Vec<usize>, (usize, EngineError)> {
        for (index, command) in commands.iter().enumerate() {
            if let Err(err) = self
                .registry
                .cache_for(command.object.namespace(), command.object.kind())
            {
                return Err((index, err));
            }
        }
        execution_order(commands)
    }

    async fn apply_to_cache(&self, command: &StructureCommand) -> EngineResult<()> {
        let cache = self
            .registry
            .cache_for(command.object.namespace(), command.object.kind())?;
        match command.action {
            CommandAction::Create | CommandAction::Alter => cache.add(command.object.clone()).await,
            CommandAction::Drop => {
                cache.remove(command.object.name()).await;
                Ok(())
            }
        }
    }
}

/// Command on the unique key that a foreign key command at `index` is bound to
///
/// The latest command on that key queued before `index`, else the first one
/// queued after it.
fn bound_key_command(commands: &[StructureCommand], index: usize) -> Option<usize> {
    let key = commands[index].referenced_key()?;
    let on_key = |i: &usize| commands[*i].object.key() == key;
    (0..index)
        .rev()
        .find(on_key)
        .or_else(|| (index + 1..commands.len()).find(on_key))
}

/// Stable topological order: among ready commands the earliest queued runs first
///
/// Edges:
/// - commands on the same object keep their queue order
/// - a foreign key create/alter waits for the create/alter of the key it is bound to
/// - a foreign key drop runs before the drop of the key it is bound to
fn execution_order(commands: &[StructureCommand]) -> Result<Vec<usize>, (usize, EngineError)> {
    let count = commands.len();
    let mut blockers = vec![0usize; count];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut add_edge = |before: usize, after: usize| {
        if !dependents[before].contains(&after) {
            dependents[before].push(after);
            blockers[after] += 1;
        }
    };

    for i in 0..count {
        for j in i + 1..count {
            if commands[i].object.key() == commands[j].object.key() {
                add_edge(i, j);
            }
        }
    }

    for index in 0..count {
        let Some(bound) = bound_key_command(commands, index) else {
            continue;
        };
        match (commands[index].is_drop(), commands[bound].is_drop()) {
            (false, false) => add_edge(bound, index),
            (true, true) => add_edge(index, bound),
            _ => {}
        }
    }

    let mut done = vec![false; count];
    let mut order = Vec::with_capacity(count);
    while order.len() < count {
        let next = (0..count).find(|&i| !done[i] && blockers[i] == 0);
        let Some(next) = next else {
            let stuck = (0..count).find(|&i| !done[i]).unwrap_or(0);
            return Err((
                stuck,
                EngineError::validation(format!(
                    "Dependency cycle involving {}",
                    commands[stuck].describe()
                )),
            ));
        };
        done[next] = true;
        order.push(next);
        for &dependent in &dependents[next] {
            blockers[dependent] -= 1;
        }
    }

    Ok(order)
}
