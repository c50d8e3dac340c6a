// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Decomposition
//!
//! Provides the decomposition service port for the system.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption boundary to the external service that turns
//!   a request into candidate work units

// The decomposition service is an external capability (typically an LLM
// behind an HTTP API). The planner only sees this trait; adapters live in
// infrastructure/decomposition/.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::atom::{Atom, AtomId, AtomKind};
use crate::domain::graph::Cycle;
use crate::domain::layer::LayerName;

/// Domain interface for decomposition services
#[async_trait]
pub trait DecompositionService: Send + Sync {
    /// Decompose a request into raw, unordered work units
    async fn decompose(
        &self,
        request: &str,
        context: &str,
    ) -> Result<DecompositionResult, DecompositionError>;

    /// Ask for a semantic fix of a dependency cycle.
    ///
    /// The default proposes nothing, which makes the planner fall back to its
    /// deterministic repair.
    async fn propose_cycle_repair(
        &self,
        _cycle: &Cycle,
        _atoms: &[Atom],
    ) -> Result<CycleRepairProposal, DecompositionError> {
        Ok(CycleRepairProposal::default())
    }
}

/// A candidate work unit as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWorkUnit {
    pub id: String,

    pub description: String,

    #[serde(default, alias = "dependencyIds", alias = "dependencies")]
    pub dependency_ids: Vec<String>,

    /// Symbol name; derived from the description when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Explicit kind; wins over lexical inference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AtomKind>,

    /// Explicit layer; wins over lexical inference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<LayerName>,
}

impl RawWorkUnit {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        dependency_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            dependency_ids: dependency_ids.into_iter().map(Into::into).collect(),
            name: None,
            kind: None,
            layer: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionResult {
    #[serde(default)]
    pub units: Vec<RawWorkUnit>,
}

/// One dependency edge to drop: `atom_id` stops depending on `dependency_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRemoval {
    pub atom_id: AtomId,
    pub dependency_id: AtomId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRepairProposal {
    #[serde(default)]
    pub remove_edges: Vec<EdgeRemoval>,
}

impl CycleRepairProposal {
    pub fn is_empty(&self) -> bool {
        self.remove_edges.is_empty()
    }
}

/// Errors that can occur while talking to the decomposition service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecompositionError {
    #[error("Transient decomposition failure: {0}")]
    Transient(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

impl DecompositionError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DecompositionError::Transient(_))
    }
}
