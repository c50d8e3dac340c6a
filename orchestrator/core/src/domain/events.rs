// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::atom::{AtomId, AtomStatus};
use crate::domain::manifest::SignatureKey;
use crate::domain::planning::PlanningRequestId;

/// Knowledge store events. `PersistenceFailed` is the observable signal of a
/// failed load or save; the store itself never propagates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreEvent {
    ManifestLoaded {
        project: String,
        atom_count: usize,
        loaded_at: DateTime<Utc>,
    },
    ManifestInitialized {
        project: String,
        reason: String,
        initialized_at: DateTime<Utc>,
    },
    ManifestSaved {
        atom_count: usize,
        saved_at: DateTime<Utc>,
    },
    PersistenceFailed {
        operation: String, // "load" or "save"
        error: String,
        failed_at: DateTime<Utc>,
    },
    AtomUpserted {
        atom_id: AtomId,
        status: AtomStatus,
        upserted_at: DateTime<Utc>,
    },
    AtomStatusChanged {
        atom_id: AtomId,
        from: AtomStatus,
        to: AtomStatus,
        changed_at: DateTime<Utc>,
    },
    SignatureRegistered {
        key: SignatureKey,
        signature_kind: String, // "interface" or "dto"
        registered_at: DateTime<Utc>,
    },
}

/// Planner events, one stream per planning request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlanningEvent {
    PlanningStarted {
        request_id: PlanningRequestId,
        started_at: DateTime<Utc>,
    },
    PolicyCorrectionApplied {
        request_id: PlanningRequestId,
        atom_id: AtomId,
        removed_dependencies: Vec<AtomId>,
        reason: String,
        corrected_at: DateTime<Utc>,
    },
    CycleDetected {
        request_id: PlanningRequestId,
        cycle: Vec<AtomId>,
        attempt: u32,
        detected_at: DateTime<Utc>,
    },
    CycleRepaired {
        request_id: PlanningRequestId,
        atom_id: AtomId,
        removed_dependency: AtomId,
        strategy: String,
        repaired_at: DateTime<Utc>,
    },
    PlanningCompleted {
        request_id: PlanningRequestId,
        atom_count: usize,
        repair_attempts: u32,
        completed_at: DateTime<Utc>,
    },
    PlanningFailed {
        request_id: PlanningRequestId,
        reason: String,
        failed_at: DateTime<Utc>,
    },
}
