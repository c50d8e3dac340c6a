// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Planner protocol tests against a scripted decomposition service.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use strata_core::application::{KnowledgeStore, KnowledgeStoreOptions, Planner, PlanningError};
use strata_core::domain::atom::{Atom, AtomId, AtomKind, AtomStatus};
use strata_core::domain::config::{PlannerConfig, RepairStrategyKind};
use strata_core::domain::decomposition::{
    CycleRepairProposal, DecompositionError, DecompositionResult, DecompositionService,
    EdgeRemoval, RawWorkUnit,
};
use strata_core::domain::events::PlanningEvent;
use strata_core::domain::graph::Cycle;
use strata_core::domain::layer::{LayerName, LayerPolicy};
use strata_core::domain::planning::{CorrectionReason, PlanningState};
use strata_core::domain::validation::{Severity, ValidationIssue};
use strata_core::infrastructure::event_bus::{DomainEvent, EventBus};
use strata_core::infrastructure::repositories::InMemoryManifestRepository;

/// Returns a fixed set of units, or a fixed error
struct ScriptedService {
    units: Vec<RawWorkUnit>,
    error: Option<DecompositionError>,
    delay: Option<Duration>,
    proposal: Mutex<Option<CycleRepairProposal>>,
    repair_calls: Mutex<u32>,
}

impl ScriptedService {
    fn with_units(units: Vec<RawWorkUnit>) -> Self {
        Self {
            units,
            error: None,
            delay: None,
            proposal: Mutex::new(None),
            repair_calls: Mutex::new(0),
        }
    }

    fn failing(error: DecompositionError) -> Self {
        Self {
            error: Some(error),
            ..Self::with_units(Vec::new())
        }
    }
}

#[async_trait]
impl DecompositionService for ScriptedService {
    async fn decompose(
        &self,
        _request: &str,
        _context: &str,
    ) -> Result<DecompositionResult, DecompositionError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(DecompositionResult {
                units: self.units.clone(),
            }),
        }
    }

    async fn propose_cycle_repair(
        &self,
        _cycle: &Cycle,
        _atoms: &[Atom],
    ) -> Result<CycleRepairProposal, DecompositionError> {
        *self.repair_calls.lock() += 1;
        Ok(self.proposal.lock().take().unwrap_or_default())
    }
}

fn unit(id: &str, description: &str, deps: &[&str]) -> RawWorkUnit {
    RawWorkUnit::new(id, description, deps.iter().copied())
}

fn planner_with(service: Arc<ScriptedService>, config: PlannerConfig, bus: Arc<EventBus>) -> Planner {
    Planner::new(config, LayerPolicy::default_three_layer(), service, bus)
}

fn ids(atoms: &[Atom]) -> Vec<&str> {
    atoms.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn test_scenario_c_core_dto_dependencies_cleared() {
    let service = Arc::new(ScriptedService::with_units(vec![
        unit("customer", "Customer DTO", &[]),
        unit("order", "Order DTO", &["customer", "pricing"]),
        unit("pricing", "Pricing engine", &[]),
    ]));
    let bus = Arc::new(EventBus::with_default_capacity());
    let mut events = bus.subscribe();

    let outcome = planner_with(service, PlannerConfig::default(), bus)
        .plan("shop", "")
        .await
        .expect("policy corrections never fail a plan");

    let order = outcome.atoms.iter().find(|a| a.id.as_str() == "order").unwrap();
    assert_eq!(order.layer, LayerName::core());
    assert!(order.dependencies.is_empty());

    assert!(outcome.corrections.iter().any(|c| c.atom_id.as_str() == "order"));
    let reasons: Vec<CorrectionReason> = outcome.corrections.iter().map(|c| c.reason).collect();
    assert!(reasons.contains(&CorrectionReason::AbstractionOnImplementation));
    assert!(reasons.contains(&CorrectionReason::CoreDtoNotDependencyFree));

    let corrections_published = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, DomainEvent::Planning(PlanningEvent::PolicyCorrectionApplied { .. })))
        .count();
    assert_eq!(corrections_published, outcome.corrections.len());
}

#[tokio::test]
async fn test_abstractions_first_can_be_disabled() {
    let service = Arc::new(ScriptedService::with_units(vec![
        unit("customer", "Customer DTO", &[]),
        unit("order", "Order DTO", &["customer"]),
    ]));
    let config = PlannerConfig {
        enforce_abstractions_first: false,
        ..PlannerConfig::default()
    };

    let outcome = planner_with(service, config, Arc::new(EventBus::default()))
        .plan("shop", "")
        .await
        .unwrap();

    assert!(outcome.corrections.is_empty());
    assert_eq!(ids(&outcome.atoms), vec!["customer", "order"]);
}

#[tokio::test]
async fn test_cycle_repaired_within_budget() {
    let service = Arc::new(ScriptedService::with_units(vec![
        unit("billing", "Billing service", &["invoices"]),
        unit("invoices", "Invoice storage", &["billing", "audit"]),
        unit("audit", "Audit log storage", &[]),
    ]));
    let bus = Arc::new(EventBus::with_default_capacity());
    let mut events = bus.subscribe();

    let outcome = planner_with(service, PlannerConfig::default(), bus)
        .plan("billing", "")
        .await
        .unwrap();

    // The widest atom loses its last-listed dependency first
    assert_eq!(outcome.repairs[0].atom_id.as_str(), "invoices");
    assert_eq!(outcome.repairs[0].removed_dependency.as_str(), "audit");
    assert!(outcome.attempts >= 1 && outcome.attempts <= 3);
    assert_eq!(outcome.atoms.len(), 3);
    assert_eq!(outcome.trace.last(), Some(&PlanningState::Done));

    let drained = events.drain();
    assert!(drained
        .iter()
        .any(|e| matches!(e, DomainEvent::Planning(PlanningEvent::CycleRepaired { .. }))));
    assert!(drained
        .iter()
        .any(|e| matches!(e, DomainEvent::Planning(PlanningEvent::PlanningCompleted { .. }))));
}

#[tokio::test]
async fn test_exhausted_repairs_propagate_cycle() {
    // The widest atom sits outside the cycle, so every repair misses it
    let service = Arc::new(ScriptedService::with_units(vec![
        unit("a", "Billing service", &["b"]),
        unit("b", "Invoice storage", &["a"]),
        unit("wide", "Reporting service", &["x1", "x2", "x3", "x4", "x5"]),
    ]));
    let config = PlannerConfig {
        max_repair_attempts: 2,
        ..PlannerConfig::default()
    };
    let bus = Arc::new(EventBus::with_default_capacity());
    let mut events = bus.subscribe();

    let err = planner_with(service, config, bus)
        .plan("billing", "")
        .await
        .unwrap_err();

    match err {
        PlanningError::CycleDetected { cycle, attempts } => {
            assert_eq!(attempts, 2);
            assert!(cycle.contains(&AtomId::new("a").unwrap()));
            assert!(cycle.contains(&AtomId::new("b").unwrap()));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(events
        .drain()
        .iter()
        .any(|e| matches!(e, DomainEvent::Planning(PlanningEvent::PlanningFailed { .. }))));
}

#[tokio::test]
async fn test_decomposition_failure_propagates_unchanged() {
    let service = Arc::new(ScriptedService::failing(DecompositionError::Transient(
        "rate limited".to_string(),
    )));

    let err = planner_with(service, PlannerConfig::default(), Arc::new(EventBus::default()))
        .plan("anything", "")
        .await
        .unwrap_err();

    match err {
        PlanningError::Decomposition(e) => {
            assert_eq!(e, DecompositionError::Transient("rate limited".to_string()))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_cancellation_during_decomposition() {
    let service = Arc::new(ScriptedService {
        delay: Some(Duration::from_secs(30)),
        ..ScriptedService::with_units(vec![unit("a", "Order DTO", &[])])
    });
    let planner = planner_with(service, PlannerConfig::default(), Arc::new(EventBus::default()));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = planner
        .plan_with_cancellation("slow", "", cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, PlanningError::Cancelled));
}

#[tokio::test]
async fn test_cancelled_plan_never_touches_store() {
    let service = Arc::new(ScriptedService::with_units(vec![unit("a", "Order DTO", &[])]));
    let planner = planner_with(service, PlannerConfig::default(), Arc::new(EventBus::default()));
    let store = KnowledgeStore::open(
        Arc::new(InMemoryManifestRepository::new()),
        Arc::new(EventBus::default()),
        KnowledgeStoreOptions::default(),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = planner.plan_with_cancellation("x", "", cancel).await;

    assert!(matches!(result, Err(PlanningError::Cancelled)));
    assert!(store.atoms().is_empty());
}

#[tokio::test]
async fn test_delegated_repair_uses_proposal() {
    let service = Arc::new(ScriptedService::with_units(vec![
        unit("a", "Billing service", &["b"]),
        unit("b", "Invoice storage", &["a"]),
    ]));
    *service.proposal.lock() = Some(CycleRepairProposal {
        remove_edges: vec![EdgeRemoval {
            atom_id: AtomId::new("b").unwrap(),
            dependency_id: AtomId::new("a").unwrap(),
        }],
    });
    let config = PlannerConfig {
        repair_strategy: RepairStrategyKind::Delegate,
        ..PlannerConfig::default()
    };

    let outcome = planner_with(service.clone(), config, Arc::new(EventBus::default()))
        .plan("billing", "")
        .await
        .unwrap();

    assert_eq!(*service.repair_calls.lock(), 1);
    assert_eq!(outcome.repairs[0].strategy, "delegated");
    assert_eq!(ids(&outcome.atoms), vec!["b", "a"]);
}

#[tokio::test]
async fn test_delegated_repair_falls_back_when_proposal_is_empty() {
    let service = Arc::new(ScriptedService::with_units(vec![
        unit("a", "Billing service", &["b"]),
        unit("b", "Invoice storage", &["a"]),
    ]));
    let config = PlannerConfig {
        repair_strategy: RepairStrategyKind::Delegate,
        ..PlannerConfig::default()
    };

    let outcome = planner_with(service, config, Arc::new(EventBus::default()))
        .plan("billing", "")
        .await
        .unwrap();

    assert_eq!(outcome.repairs[0].strategy, "drop-last-dependency");
    assert_eq!(outcome.repairs[0].atom_id.as_str(), "a");
}

#[tokio::test]
async fn test_plan_into_persists_ordered_atoms() {
    let service = Arc::new(ScriptedService::with_units(vec![
        unit("svc", "Order service implementation", &["repo"]),
        unit("repo", "IOrderRepository interface", &["dto"]),
        unit("dto", "Order DTO", &[]),
    ]));
    let planner = planner_with(service, PlannerConfig::default(), Arc::new(EventBus::default()));
    let repo = InMemoryManifestRepository::new();
    let store = KnowledgeStore::open(
        Arc::new(repo.clone()),
        Arc::new(EventBus::default()),
        KnowledgeStoreOptions::default(),
    );

    let outcome = planner.plan_into(&store, "orders", "").await.unwrap();

    assert_eq!(ids(&outcome.atoms), vec!["dto", "repo", "svc"]);
    assert_eq!(store.atoms().len(), 3);
    assert_eq!(repo.stored().unwrap().atoms.len(), 3);
    assert!(store
        .atoms()
        .iter()
        .all(|a| a.status == AtomStatus::Pending));

    let ready: Vec<String> = store.ready_atoms().iter().map(|a| a.id.to_string()).collect();
    assert_eq!(ready, vec!["dto"]);
    assert_eq!(store.get_atom(&AtomId::new("repo").unwrap()).unwrap().kind, AtomKind::Interface);
}

#[tokio::test]
async fn test_core_interface_on_core_dto_plans_without_errors() {
    let service = Arc::new(ScriptedService::with_units(vec![
        unit("dto", "Order DTO", &[]),
        unit("repo", "IOrderRepository interface", &["dto"]),
    ]));
    let planner = planner_with(service, PlannerConfig::default(), Arc::new(EventBus::default()));
    let store = KnowledgeStore::open(
        Arc::new(InMemoryManifestRepository::new()),
        Arc::new(EventBus::default()),
        KnowledgeStoreOptions::default(),
    );

    let outcome = planner.plan_into(&store, "orders", "").await.unwrap();

    assert!(outcome.corrections.is_empty());
    assert!(outcome
        .issues
        .iter()
        .all(|issue| issue.severity() == Severity::Warning));
    assert!(outcome
        .issues
        .iter()
        .any(|issue| matches!(issue, ValidationIssue::InterfaceOnLayerDto { .. })));
    assert!(!store.validate_all().has_errors());

    // The per-atom check stays literal against the allow-list
    let repo = store.get_atom(&AtomId::new("repo").unwrap()).unwrap();
    assert!(!store.validate_layer_dependencies(&repo));
}
