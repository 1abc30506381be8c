// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the QoreDB structure engine
//!
//! Cache, constraint, command and overlay failures are all mapped to these
//! unified error types so callers can surface them verbatim.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all structure operations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EngineError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Naming conflict: no free name derived from '{base}' after {attempts} attempts")]
    NamingConflict { base: String, attempts: u32 },

    #[error("Attribute '{attribute}' no longer resolves on {entity}")]
    ResolutionError { entity: String, attribute: String },

    #[error("Execution error: {message}")]
    ExecutionError { message: String },

    #[error("Persistence error: {message}")]
    PersistenceError { message: String },

    #[error("Failed to load {kind} objects for {container}: {message}")]
    LoadFailed {
        container: String,
        kind: String,
        message: String,
    },

    #[error("Container not registered: {container}")]
    ContainerNotFound { container: String },

    #[error("Feature not supported: {message}")]
    NotSupported { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError { message: msg.into() }
    }

    pub fn naming_conflict(base: impl Into<String>, attempts: u32) -> Self {
        Self::NamingConflict {
            base: base.into(),
            attempts,
        }
    }

    pub fn unresolved(entity: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::ResolutionError {
            entity: entity.into(),
            attribute: attribute.into(),
        }
    }

    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::ExecutionError { message: msg.into() }
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceError { message: msg.into() }
    }

    pub fn load_failed(
        container: impl Into<String>,
        kind: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::LoadFailed {
            container: container.into(),
            kind: kind.into(),
            message: msg.into(),
        }
    }

    pub fn container_not_found(container: impl Into<String>) -> Self {
        Self::ContainerNotFound {
            container: container.into(),
        }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported { message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }

    /// Returns true if the failure can be fixed by re-editing the object
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ValidationError { .. } | Self::NamingConflict { .. }
        )
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
