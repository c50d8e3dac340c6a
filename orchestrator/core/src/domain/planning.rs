// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Planning Domain Model
//!
//! Value objects describing one planning request: its identity, the states it
//! moves through, and the corrections and repairs applied along the way.
//!
//! # State Machine
//!
//! ```text
//! Decomposing -> Classifying -> Sorting -> Done
//!                                  |  ^
//!                                  v  |
//!                              Repairing
//!                                  |
//!                                  v
//!                               Failed
//! ```
//!
//! `Repairing` loops back only to `Sorting`. Delegated repair that consults
//! the decomposition service is a sub-call, not a return to `Decomposing`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::atom::AtomId;

// ============================================================================
// Value Objects: Identifiers
// ============================================================================

/// Unique identifier of a planning request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanningRequestId(pub Uuid);

impl PlanningRequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PlanningRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanningRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Value Objects: State Machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanningState {
    Decomposing,
    Classifying,
    Sorting,
    Repairing,
    Done,
    Failed,
}

impl PlanningState {
    pub fn can_transition_to(&self, next: PlanningState) -> bool {
        use PlanningState::*;
        matches!(
            (self, next),
            (Decomposing, Classifying)
                | (Decomposing, Failed)
                | (Classifying, Sorting)
                | (Sorting, Done)
                | (Sorting, Repairing)
                | (Sorting, Failed)
                | (Repairing, Sorting)
                | (Repairing, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanningState::Done | PlanningState::Failed)
    }
}

impl std::fmt::Display for PlanningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// Value Objects: Corrections & Repairs
// ============================================================================

/// Dependencies stripped by abstractions-first enforcement. Informational,
/// never a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCorrection {
    pub atom_id: AtomId,
    pub removed_dependencies: Vec<AtomId>,
    pub reason: CorrectionReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionReason {
    /// DTO or interface depended on an implementation
    AbstractionOnImplementation,
    /// DTO in the zero-dependency layer had dependencies
    CoreDtoNotDependencyFree,
    /// Interface in the zero-dependency layer depended on something other than a core DTO
    CoreInterfaceOutsideCoreDtos,
}

impl std::fmt::Display for CorrectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            CorrectionReason::AbstractionOnImplementation => {
                "abstractions may not depend on implementations"
            }
            CorrectionReason::CoreDtoNotDependencyFree => "core DTOs must be dependency-free",
            CorrectionReason::CoreInterfaceOutsideCoreDtos => {
                "core interfaces may depend only on core DTOs"
            }
        };
        write!(f, "{}", text)
    }
}

/// One edge removed while repairing a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairRecord {
    pub attempt: u32,
    pub cycle: Vec<AtomId>,
    pub atom_id: AtomId,
    pub removed_dependency: AtomId,
    pub strategy: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repairing_only_returns_to_sorting() {
        use PlanningState::*;
        assert!(Repairing.can_transition_to(Sorting));
        assert!(Repairing.can_transition_to(Failed));
        assert!(!Repairing.can_transition_to(Decomposing));
        assert!(!Repairing.can_transition_to(Done));
    }

    #[test]
    fn test_terminal_states() {
        assert!(PlanningState::Done.is_terminal());
        assert!(PlanningState::Failed.is_terminal());
        assert!(!PlanningState::Sorting.is_terminal());
    }
}
