// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Planner
//!
//! Turns an unordered external decomposition into a fully ordered atom list
//! that honors the layer policy.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Collaborators:**
//!   - Domain: DecompositionService (port), GraphSorter, Dependency Validator
//!   - Application: AtomClassifier, abstractions-first pass, CycleRepairer
//!   - Infrastructure: EventBus
//!
//! # Protocol
//!
//! ```text
//! Decomposing -> Classifying -> Sorting -> Done
//!                                  |  ^
//!                                  v  |
//!                              Repairing   (bounded by max_repair_attempts)
//!                                  |
//!                                  v
//!                               Failed
//! ```
//!
//! The decomposition call is the only suspension point and the only step that
//! can be cancelled. Repairs mutate a local copy of the atom list; the store
//! is written only by [`Planner::plan_into`], after a plan completes.

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::abstractions_first;
use crate::application::classifier::AtomClassifier;
use crate::application::knowledge_store::KnowledgeStore;
use crate::application::repair::CycleRepairer;
use crate::domain::atom::Atom;
use crate::domain::config::PlannerConfig;
use crate::domain::decomposition::{DecompositionError, DecompositionService, RawWorkUnit};
use crate::domain::events::PlanningEvent;
use crate::domain::graph::{Cycle, GraphError, GraphSorter, SortOutcome};
use crate::domain::layer::LayerPolicy;
use crate::domain::planning::{PlanningRequestId, PlanningState, PolicyCorrection, RepairRecord};
use crate::domain::validation::{self, ValidationIssue};
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("Dependency cycle {cycle} remains after {attempts} repair attempts")]
    CycleDetected { cycle: Cycle, attempts: u32 },

    #[error("Decomposition failed: {0}")]
    Decomposition(#[from] DecompositionError),

    #[error("Planning cancelled")]
    Cancelled,

    #[error("Invalid plan input: {0}")]
    Graph(#[from] GraphError),
}

/// Result of a completed planning request
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub request_id: PlanningRequestId,
    /// Dependency-respecting order
    pub atoms: Vec<Atom>,
    pub corrections: Vec<PolicyCorrection>,
    pub repairs: Vec<RepairRecord>,
    /// Repair attempts used
    pub attempts: u32,
    pub trace: Vec<PlanningState>,
    /// Validator findings on the final plan; never fatal
    pub issues: Vec<ValidationIssue>,
}

pub struct Planner {
    config: PlannerConfig,
    policy: LayerPolicy,
    decomposition: Arc<dyn DecompositionService>,
    repairer: CycleRepairer,
    event_bus: Arc<EventBus>,
}

impl Planner {
    pub fn new(
        config: PlannerConfig,
        policy: LayerPolicy,
        decomposition: Arc<dyn DecompositionService>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let repairer = CycleRepairer::from_kind(config.repair_strategy, decomposition.clone());
        Self {
            config,
            policy,
            decomposition,
            repairer,
            event_bus,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub async fn plan(&self, request: &str, context: &str) -> Result<PlanOutcome, PlanningError> {
        self.plan_with_cancellation(request, context, CancellationToken::new())
            .await
    }

    /// Plan, abandoning the request as soon as `cancel` fires.
    pub async fn plan_with_cancellation(
        &self,
        request: &str,
        context: &str,
        cancel: CancellationToken,
    ) -> Result<PlanOutcome, PlanningError> {
        let request_id = PlanningRequestId::new();
        let mut run = PlanRun::new(request_id, self.event_bus.clone());
        run.started();
        run.enter(PlanningState::Decomposing);

        info!(request_id = %request_id, "Requesting decomposition");
        let decomposed = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(run.fail(PlanningError::Cancelled));
            }
            result = self.decomposition.decompose(request, context) => result,
        };

        let units = match decomposed {
            Ok(result) => result.units,
            Err(e) => {
                error!(request_id = %request_id, "Decomposition failed: {}", e);
                return Err(run.fail(PlanningError::Decomposition(e)));
            }
        };

        debug!(request_id = %request_id, unit_count = units.len(), "Decomposition received");
        self.order(run, &units, &cancel).await
    }

    /// Classify, normalize, sort and repair already-decomposed units.
    pub async fn plan_units(&self, units: &[RawWorkUnit]) -> Result<PlanOutcome, PlanningError> {
        let run = PlanRun::new(PlanningRequestId::new(), self.event_bus.clone());
        run.started();
        self.order(run, units, &CancellationToken::new()).await
    }

    /// Plan and persist the ordered result in one store critical section.
    pub async fn plan_into(
        &self,
        store: &KnowledgeStore,
        request: &str,
        context: &str,
    ) -> Result<PlanOutcome, PlanningError> {
        let outcome = self.plan(request, context).await?;
        store.upsert_plan(outcome.atoms.clone());
        Ok(outcome)
    }

    async fn order(
        &self,
        mut run: PlanRun,
        units: &[RawWorkUnit],
        cancel: &CancellationToken,
    ) -> Result<PlanOutcome, PlanningError> {
        let request_id = run.request_id;

        run.enter(PlanningState::Classifying);
        let classified = AtomClassifier::new(self.policy.clone()).classify(units);

        let (mut atoms, corrections) = if self.config.enforce_abstractions_first {
            let normalized = abstractions_first::enforce(classified, &self.policy);
            for correction in &normalized.corrections {
                self.event_bus
                    .publish_planning_event(PlanningEvent::PolicyCorrectionApplied {
                        request_id,
                        atom_id: correction.atom_id.clone(),
                        removed_dependencies: correction.removed_dependencies.clone(),
                        reason: correction.reason.to_string(),
                        corrected_at: Utc::now(),
                    });
            }
            (normalized.atoms, normalized.corrections)
        } else {
            (classified, Vec::new())
        };

        let mut repairs: Vec<RepairRecord> = Vec::new();
        let mut attempts: u32 = 0;

        loop {
            run.enter(PlanningState::Sorting);

            let cycle = match GraphSorter::sort(&atoms) {
                Ok(SortOutcome::Ordered(ordered)) => {
                    atoms = ordered;
                    break;
                }
                Ok(SortOutcome::CycleDetected(cycle)) => cycle,
                Err(e) => return Err(run.fail(PlanningError::Graph(e))),
            };

            warn!(request_id = %request_id, cycle = %cycle, attempt = attempts, "Dependency cycle detected");
            self.event_bus
                .publish_planning_event(PlanningEvent::CycleDetected {
                    request_id,
                    cycle: cycle.nodes().to_vec(),
                    attempt: attempts,
                    detected_at: Utc::now(),
                });

            if attempts >= self.config.max_repair_attempts {
                return Err(run.fail(PlanningError::CycleDetected { cycle, attempts }));
            }
            if cancel.is_cancelled() {
                return Err(run.fail(PlanningError::Cancelled));
            }

            attempts += 1;
            run.enter(PlanningState::Repairing);

            let applied = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(run.fail(PlanningError::Cancelled));
                }
                applied = self.repairer.repair(&cycle, &mut atoms) => applied,
            };

            if applied.is_empty() {
                return Err(run.fail(PlanningError::CycleDetected { cycle, attempts }));
            }

            for edge in applied.removed {
                info!(
                    request_id = %request_id,
                    atom_id = %edge.atom_id,
                    removed_dependency = %edge.dependency_id,
                    strategy = applied.strategy,
                    "Cycle repair removed dependency"
                );
                self.event_bus
                    .publish_planning_event(PlanningEvent::CycleRepaired {
                        request_id,
                        atom_id: edge.atom_id.clone(),
                        removed_dependency: edge.dependency_id.clone(),
                        strategy: applied.strategy.to_string(),
                        repaired_at: Utc::now(),
                    });
                repairs.push(RepairRecord {
                    attempt: attempts,
                    cycle: cycle.nodes().to_vec(),
                    atom_id: edge.atom_id,
                    removed_dependency: edge.dependency_id,
                    strategy: applied.strategy.to_string(),
                });
            }
        }

        let issues = validation::validate_atoms(&atoms, &self.policy).issues;
        for issue in &issues {
            warn!(request_id = %request_id, "Plan validation: {}", issue);
        }

        run.enter(PlanningState::Done);
        info!(
            request_id = %request_id,
            atom_count = atoms.len(),
            repair_attempts = attempts,
            corrections = corrections.len(),
            "Planning completed"
        );
        self.event_bus
            .publish_planning_event(PlanningEvent::PlanningCompleted {
                request_id,
                atom_count: atoms.len(),
                repair_attempts: attempts,
                completed_at: Utc::now(),
            });

        Ok(PlanOutcome {
            request_id,
            atoms,
            corrections,
            repairs,
            attempts,
            trace: run.trace,
            issues,
        })
    }
}

/// State trace and event plumbing for one request
struct PlanRun {
    request_id: PlanningRequestId,
    trace: Vec<PlanningState>,
    event_bus: Arc<EventBus>,
}

impl PlanRun {
    fn new(request_id: PlanningRequestId, event_bus: Arc<EventBus>) -> Self {
        Self {
            request_id,
            trace: Vec::new(),
            event_bus,
        }
    }

    fn started(&self) {
        self.event_bus
            .publish_planning_event(PlanningEvent::PlanningStarted {
                request_id: self.request_id,
                started_at: Utc::now(),
            });
    }

    fn enter(&mut self, next: PlanningState) {
        if let Some(current) = self.trace.last() {
            if !current.can_transition_to(next) {
                warn!(request_id = %self.request_id, from = %current, to = %next, "Unexpected planning transition");
            }
        }
        debug!(request_id = %self.request_id, state = %next, "Planning state");
        self.trace.push(next);
    }

    fn fail(&mut self, err: PlanningError) -> PlanningError {
        self.enter(PlanningState::Failed);
        self.event_bus
            .publish_planning_event(PlanningEvent::PlanningFailed {
                request_id: self.request_id,
                reason: err.to_string(),
                failed_at: Utc::now(),
            });
        err
    }
}
