// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Atom Domain Model
//!
//! An atom is the smallest unit of work tracked by the orchestrator: one
//! type, interface or file that the generation pipeline must produce.
//! Atoms form a directed acyclic graph through their `dependencies`.
//!
//! # Architectural Context
//!
//! - **Bounded Context:** Planning Context
//! - **Aggregate Root:** SolutionManifest (atoms are entities inside it)
//!
//! # Design Principles
//!
//! 1. **Closed variants:** kind and status are enums, never free-form strings
//! 2. **Open layers:** layer names stay strings, checked against the live policy
//! 3. **Self-Validating:** constructors reject empty ids and self-loops

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::layer::LayerName;

// ============================================================================
// Value Objects: Identifiers
// ============================================================================

/// Identifier of an atom, unique within a manifest and immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomId(String);

impl AtomId {
    /// Create a new AtomId
    ///
    /// # Validation Rules
    /// - Must not be empty or whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, AtomError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AtomError::InvalidId("Atom id cannot be empty".to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Value Objects: Kind & Status
// ============================================================================

/// What an atom produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomKind {
    #[serde(rename = "DTO", alias = "Dto")]
    Dto,
    Interface,
    Implementation,
    Test,
}

impl std::fmt::Display for AtomKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AtomKind::Dto => "DTO",
            AtomKind::Interface => "Interface",
            AtomKind::Implementation => "Implementation",
            AtomKind::Test => "Test",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for AtomKind {
    type Err = AtomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dto" => Ok(AtomKind::Dto),
            "interface" => Ok(AtomKind::Interface),
            "implementation" | "impl" => Ok(AtomKind::Implementation),
            "test" => Ok(AtomKind::Test),
            other => Err(AtomError::UnknownKind(other.to_string())),
        }
    }
}

/// Lifecycle status of an atom.
///
/// Common path: `Pending -> InProgress -> (Review) -> Completed`.
/// `Failed` is reachable from `InProgress`/`Review`; retry returns to `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AtomStatus {
    #[default]
    Pending,
    InProgress,
    Review,
    Completed,
    Failed,
}

impl AtomStatus {
    pub const ALL: [AtomStatus; 5] = [
        AtomStatus::Pending,
        AtomStatus::InProgress,
        AtomStatus::Review,
        AtomStatus::Completed,
        AtomStatus::Failed,
    ];

    /// Whether `next` lies on the common lifecycle path from `self`.
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(&self, next: AtomStatus) -> bool {
        use AtomStatus::*;

        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Pending, InProgress)
                | (InProgress, Review)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (Review, Completed)
                | (Review, Failed)
                | (Review, InProgress)
                | (Failed, InProgress)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AtomStatus::Completed)
    }
}

impl std::fmt::Display for AtomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AtomStatus::Pending => "Pending",
            AtomStatus::InProgress => "InProgress",
            AtomStatus::Review => "Review",
            AtomStatus::Completed => "Completed",
            AtomStatus::Failed => "Failed",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for AtomStatus {
    type Err = AtomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "pending" => Ok(AtomStatus::Pending),
            "inprogress" => Ok(AtomStatus::InProgress),
            "review" => Ok(AtomStatus::Review),
            "completed" | "done" => Ok(AtomStatus::Completed),
            "failed" => Ok(AtomStatus::Failed),
            _ => Err(AtomError::UnknownStatus(s.to_string())),
        }
    }
}

// ============================================================================
// Entity: Atom
// ============================================================================

/// A unit of work.
///
/// # Invariants
/// - `id` is non-empty
/// - `dependencies` never contains `id` (no self-loop)
/// - `dependencies` holds no duplicates
///
/// Dependencies may reference atoms that do not exist yet; forward references
/// are legal while planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    pub id: AtomId,

    /// Symbol this atom produces (type, interface or file unit)
    pub name: String,

    pub kind: AtomKind,

    /// Architectural layer; mutable until execution starts
    pub layer: LayerName,

    /// Atom ids that must exist and compile first
    #[serde(default)]
    pub dependencies: Vec<AtomId>,

    #[serde(default)]
    pub status: AtomStatus,

    /// Set once the atom's output is materialized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Free-text description the atom was planned from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Atom {
    pub fn new(id: AtomId, name: impl Into<String>, kind: AtomKind, layer: LayerName) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            layer,
            dependencies: Vec::new(),
            status: AtomStatus::Pending,
            file_path: None,
            description: String::new(),
        }
    }

    /// Replace the dependency list, dropping duplicates while keeping first-seen order.
    ///
    /// # Errors
    /// Returns [`AtomError::SelfDependency`] when `deps` contains the atom's own id.
    pub fn with_dependencies(
        mut self,
        deps: impl IntoIterator<Item = AtomId>,
    ) -> Result<Self, AtomError> {
        let mut unique: Vec<AtomId> = Vec::new();
        for dep in deps {
            if dep == self.id {
                return Err(AtomError::SelfDependency(self.id.clone()));
            }
            if !unique.contains(&dep) {
                unique.push(dep);
            }
        }
        self.dependencies = unique;
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(&self, id: &AtomId) -> bool {
        self.dependencies.iter().any(|d| d == id)
    }

    pub fn has_self_dependency(&self) -> bool {
        self.depends_on(&self.id)
    }

    /// Remove a dependency edge. Returns true when an edge was removed.
    pub fn remove_dependency(&mut self, id: &AtomId) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| d != id);
        before != self.dependencies.len()
    }
}

// ============================================================================
// Domain Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtomError {
    #[error("Invalid atom id: {0}")]
    InvalidId(String),

    #[error("Atom '{0}' cannot depend on itself")]
    SelfDependency(AtomId),

    #[error("Atom '{0}' not found")]
    NotFound(AtomId),

    #[error("Unknown atom kind: {0}")]
    UnknownKind(String),

    #[error("Unknown atom status: {0}")]
    UnknownStatus(String),

    #[error("Invalid status transition for atom '{id}': {from} -> {to}")]
    InvalidTransition {
        id: AtomId,
        from: AtomStatus,
        to: AtomStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AtomId {
        AtomId::new(s).unwrap()
    }

    #[test]
    fn test_atom_id_validation() {
        assert!(AtomId::new("a1").is_ok());
        assert!(AtomId::new("").is_err());
        assert!(AtomId::new("   ").is_err());
    }

    #[test]
    fn test_self_dependency_rejected() {
        let atom = Atom::new(id("a1"), "Order", AtomKind::Dto, LayerName::core());
        let result = atom.with_dependencies(vec![id("a2"), id("a1")]);
        assert_eq!(result, Err(AtomError::SelfDependency(id("a1"))));
    }

    #[test]
    fn test_duplicate_dependencies_collapse() {
        let atom = Atom::new(id("a3"), "OrderService", AtomKind::Implementation, LayerName::infrastructure())
            .with_dependencies(vec![id("a1"), id("a2"), id("a1")])
            .unwrap();
        assert_eq!(atom.dependencies, vec![id("a1"), id("a2")]);
    }

    #[test]
    fn test_status_transitions() {
        use AtomStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Review));
        assert!(Review.can_transition_to(Completed));
        assert!(Failed.can_transition_to(InProgress));
        assert!(Completed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Failed));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("in-progress".parse::<AtomStatus>().unwrap(), AtomStatus::InProgress);
        assert_eq!("InProgress".parse::<AtomStatus>().unwrap(), AtomStatus::InProgress);
        assert_eq!("completed".parse::<AtomStatus>().unwrap(), AtomStatus::Completed);
        assert!("shipped".parse::<AtomStatus>().is_err());
    }

    #[test]
    fn test_kind_serializes_as_dto() {
        let json = serde_json::to_string(&AtomKind::Dto).unwrap();
        assert_eq!(json, "\"DTO\"");
        let back: AtomKind = serde_json::from_str("\"DTO\"").unwrap();
        assert_eq!(back, AtomKind::Dto);
    }
}
