// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Knowledge Store ("Blackboard")
//!
//! Single authoritative, durably-backed view of the `SolutionManifest`.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Serialize every read and write of the manifest
//! - **Collaborators:**
//!   - Domain: SolutionManifest, LayerPolicy, Dependency Validator
//!   - Infrastructure: ManifestRepository, EventBus
//!
//! # Concurrency
//!
//! One store owns one mutex guarding both the in-memory manifest and the
//! durable-write path. Every operation takes the lock exactly once, so an
//! upsert and its auto-save are atomic with respect to any other operation and
//! there is no re-entry. Operations are short and blocking; the planner never
//! calls into the store while it is suspended on the decomposition service.
//!
//! # Error Handling
//!
//! Persistence failures are logged and published as
//! `StoreEvent::PersistenceFailed`; they never roll back in-memory state.
//! `load` never fails: it falls back to a fresh default manifest.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::atom::{Atom, AtomError, AtomId, AtomStatus};
use crate::domain::config::StrataConfigManifest;
use crate::domain::events::StoreEvent;
use crate::domain::layer::{Layer, LayerPolicy};
use crate::domain::manifest::{
    DtoSignature, InterfaceSignature, ProjectMetadata, SemanticSignatureTable, SignatureKey,
    SolutionManifest,
};
use crate::domain::repository::{ManifestRepository, RepositoryError};
use crate::domain::validation::{self, ValidationReport};
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, Clone)]
pub struct KnowledgeStoreOptions {
    /// Persist after every mutating operation
    pub auto_save: bool,
    /// Metadata for a manifest initialized from scratch
    pub default_project: ProjectMetadata,
}

impl KnowledgeStoreOptions {
    pub fn from_config(config: &StrataConfigManifest) -> Self {
        let project = &config.spec.project;
        Self {
            auto_save: config.spec.knowledge_store.auto_save,
            default_project: ProjectMetadata::new(
                &project.name,
                &project.root_namespace,
                &project.target_framework,
            ),
        }
    }
}

impl Default for KnowledgeStoreOptions {
    fn default() -> Self {
        Self {
            auto_save: true,
            default_project: ProjectMetadata::default(),
        }
    }
}

/// How `load` obtained the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { atom_count: usize },
    Initialized { reason: String },
}

/// Atom counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub review: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.review + self.completed + self.failed
    }

    pub fn get(&self, status: AtomStatus) -> usize {
        match status {
            AtomStatus::Pending => self.pending,
            AtomStatus::InProgress => self.in_progress,
            AtomStatus::Review => self.review,
            AtomStatus::Completed => self.completed,
            AtomStatus::Failed => self.failed,
        }
    }

    fn record(&mut self, status: AtomStatus) {
        match status {
            AtomStatus::Pending => self.pending += 1,
            AtomStatus::InProgress => self.in_progress += 1,
            AtomStatus::Review => self.review += 1,
            AtomStatus::Completed => self.completed += 1,
            AtomStatus::Failed => self.failed += 1,
        }
    }
}

/// Signature-only context for generating an atom: the public shapes of its
/// completed dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyContext {
    pub interfaces: Vec<InterfaceSignature>,
    pub dtos: Vec<DtoSignature>,
}

impl DependencyContext {
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.dtos.is_empty()
    }
}

pub struct KnowledgeStore {
    manifest: Mutex<SolutionManifest>,
    repository: Arc<dyn ManifestRepository>,
    event_bus: Arc<EventBus>,
    options: KnowledgeStoreOptions,
}

impl KnowledgeStore {
    /// Open the store for a workspace: load durable state, or initialize the
    /// default three-layer manifest and persist it.
    pub fn open(
        repository: Arc<dyn ManifestRepository>,
        event_bus: Arc<EventBus>,
        options: KnowledgeStoreOptions,
    ) -> Self {
        let store = Self {
            manifest: Mutex::new(SolutionManifest::with_default_layers(
                options.default_project.clone(),
            )),
            repository,
            event_bus,
            options,
        };
        store.load();
        store
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Reload from durable storage. Missing or unreadable state falls back to
    /// a fresh default manifest, which is persisted immediately.
    pub fn load(&self) -> LoadOutcome {
        let mut manifest = self.manifest.lock();

        match self.repository.load() {
            Ok(Some(stored)) => {
                let atom_count = stored.atoms.len();
                info!(
                    location = %self.repository.describe(),
                    project = %stored.project.name,
                    atom_count,
                    "Manifest loaded"
                );
                self.event_bus.publish_store_event(StoreEvent::ManifestLoaded {
                    project: stored.project.name.clone(),
                    atom_count,
                    loaded_at: Utc::now(),
                });
                *manifest = stored;
                LoadOutcome::Loaded { atom_count }
            }
            Ok(None) => self.initialize_locked(&mut manifest, "no stored manifest".to_string()),
            Err(e) => {
                error!(
                    location = %self.repository.describe(),
                    "Failed to load manifest, falling back to defaults: {}", e
                );
                self.publish_persistence_failure("load", &e);
                self.initialize_locked(&mut manifest, format!("stored manifest unreadable: {}", e))
            }
        }
    }

    /// Stamp `last_updated` and write the full manifest.
    ///
    /// A failure is logged and published; in-memory state stays authoritative
    /// until the next successful save.
    pub fn save(&self) -> Result<(), RepositoryError> {
        let mut manifest = self.manifest.lock();
        self.persist_locked(&mut manifest)
    }

    fn initialize_locked(&self, manifest: &mut SolutionManifest, reason: String) -> LoadOutcome {
        *manifest = SolutionManifest::with_default_layers(self.options.default_project.clone());
        info!(
            location = %self.repository.describe(),
            project = %manifest.project.name,
            "Initializing manifest with default layer policy ({})", reason
        );
        self.event_bus.publish_store_event(StoreEvent::ManifestInitialized {
            project: manifest.project.name.clone(),
            reason: reason.clone(),
            initialized_at: Utc::now(),
        });
        // Failure is already logged and published
        let _ = self.persist_locked(manifest);
        LoadOutcome::Initialized { reason }
    }

    fn persist_locked(&self, manifest: &mut SolutionManifest) -> Result<(), RepositoryError> {
        manifest.touch();
        match self.repository.save(manifest) {
            Ok(()) => {
                debug!(atom_count = manifest.atoms.len(), "Manifest saved");
                self.event_bus.publish_store_event(StoreEvent::ManifestSaved {
                    atom_count: manifest.atoms.len(),
                    saved_at: Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                error!(
                    location = %self.repository.describe(),
                    "Failed to save manifest: {}", e
                );
                self.publish_persistence_failure("save", &e);
                Err(e)
            }
        }
    }

    fn auto_save_locked(&self, manifest: &mut SolutionManifest) {
        if self.options.auto_save {
            let _ = self.persist_locked(manifest);
        }
    }

    fn publish_persistence_failure(&self, operation: &str, error: &RepositoryError) {
        self.event_bus.publish_store_event(StoreEvent::PersistenceFailed {
            operation: operation.to_string(),
            error: error.to_string(),
            failed_at: Utc::now(),
        });
    }

    // ========================================================================
    // Atoms
    // ========================================================================

    /// Insert or replace by id
    pub fn upsert_atom(&self, atom: Atom) {
        let mut manifest = self.manifest.lock();
        self.upsert_locked(&mut manifest, atom);
        self.auto_save_locked(&mut manifest);
    }

    /// Upsert a planner result in one critical section with a single save
    pub fn upsert_plan(&self, atoms: Vec<Atom>) {
        let mut manifest = self.manifest.lock();
        let count = atoms.len();
        for atom in atoms {
            self.upsert_locked(&mut manifest, atom);
        }
        info!(atom_count = count, "Plan stored");
        self.auto_save_locked(&mut manifest);
    }

    fn upsert_locked(&self, manifest: &mut SolutionManifest, atom: Atom) {
        if !manifest.layers.contains(&atom.layer) {
            warn!(
                atom_id = %atom.id,
                layer = %atom.layer,
                "Atom assigned to undeclared layer"
            );
        }
        self.event_bus.publish_store_event(StoreEvent::AtomUpserted {
            atom_id: atom.id.clone(),
            status: atom.status,
            upserted_at: Utc::now(),
        });
        manifest.atoms.insert(atom.id.clone(), atom);
    }

    pub fn get_atom(&self, id: &AtomId) -> Option<Atom> {
        self.manifest.lock().atoms.get(id).cloned()
    }

    pub fn remove_atom(&self, id: &AtomId) -> Option<Atom> {
        let mut manifest = self.manifest.lock();
        let removed = manifest.atoms.remove(id);
        if removed.is_some() {
            self.auto_save_locked(&mut manifest);
        }
        removed
    }

    /// Set an atom's status. Unknown ids are a no-op; returns whether an atom
    /// was updated. Off-path transitions are applied but logged.
    pub fn update_atom_status(&self, id: &AtomId, status: AtomStatus) -> bool {
        let mut manifest = self.manifest.lock();
        let Some(atom) = manifest.atoms.get_mut(id) else {
            debug!(atom_id = %id, "Status update for unknown atom ignored");
            return false;
        };

        let from = atom.status;
        if !from.can_transition_to(status) {
            warn!(atom_id = %id, %from, to = %status, "Atom status change is off the lifecycle path");
        }
        atom.status = status;

        self.event_bus.publish_store_event(StoreEvent::AtomStatusChanged {
            atom_id: id.clone(),
            from,
            to: status,
            changed_at: Utc::now(),
        });
        self.auto_save_locked(&mut manifest);
        true
    }

    /// Strict variant of [`update_atom_status`](Self::update_atom_status)
    pub fn transition_atom(&self, id: &AtomId, status: AtomStatus) -> Result<(), AtomError> {
        let mut manifest = self.manifest.lock();
        let atom = manifest
            .atoms
            .get_mut(id)
            .ok_or_else(|| AtomError::NotFound(id.clone()))?;

        let from = atom.status;
        if !from.can_transition_to(status) {
            return Err(AtomError::InvalidTransition {
                id: id.clone(),
                from,
                to: status,
            });
        }
        atom.status = status;

        self.event_bus.publish_store_event(StoreEvent::AtomStatusChanged {
            atom_id: id.clone(),
            from,
            to: status,
            changed_at: Utc::now(),
        });
        self.auto_save_locked(&mut manifest);
        Ok(())
    }

    /// Record where an atom's output was materialized
    pub fn set_atom_file_path(&self, id: &AtomId, path: impl Into<PathBuf>) -> bool {
        let mut manifest = self.manifest.lock();
        let Some(atom) = manifest.atoms.get_mut(id) else {
            return false;
        };
        atom.file_path = Some(path.into());
        self.auto_save_locked(&mut manifest);
        true
    }

    pub fn atoms(&self) -> Vec<Atom> {
        self.manifest.lock().atoms.values().cloned().collect()
    }

    pub fn atoms_by_status(&self, status: AtomStatus) -> Vec<Atom> {
        self.manifest
            .lock()
            .atoms
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect()
    }

    /// Pending atoms whose dependencies are all completed, by id
    pub fn ready_atoms(&self) -> Vec<Atom> {
        let manifest = self.manifest.lock();
        manifest
            .atoms
            .values()
            .filter(|a| a.status == AtomStatus::Pending)
            .filter(|a| Self::dependencies_satisfied_in(&manifest, a))
            .cloned()
            .collect()
    }

    pub fn progress(&self) -> StatusCounts {
        let manifest = self.manifest.lock();
        let mut counts = StatusCounts::default();
        for atom in manifest.atoms.values() {
            counts.record(atom.status);
        }
        counts
    }

    // ========================================================================
    // Readiness & Layer Checks
    // ========================================================================

    /// True iff every dependency resolves to an existing, completed atom.
    ///
    /// Stricter than the graph sorter: an unresolvable id is not satisfied.
    pub fn dependencies_satisfied(&self, atom: &Atom) -> bool {
        let manifest = self.manifest.lock();
        Self::dependencies_satisfied_in(&manifest, atom)
    }

    fn dependencies_satisfied_in(manifest: &SolutionManifest, atom: &Atom) -> bool {
        atom.dependencies.iter().all(|dep| {
            manifest
                .atoms
                .get(dep)
                .map(|d| d.status == AtomStatus::Completed)
                .unwrap_or(false)
        })
    }

    /// True iff every existing dependency lives in a layer the atom's layer may
    /// depend on. An atom in an undeclared layer passes with a warning.
    pub fn validate_layer_dependencies(&self, atom: &Atom) -> bool {
        let manifest = self.manifest.lock();

        if !manifest.layers.contains(&atom.layer) {
            warn!(
                atom_id = %atom.id,
                layer = %atom.layer,
                "Layer not declared in policy, skipping layer validation"
            );
            return true;
        }

        let violations =
            validation::layer_violations(atom, &manifest.layers, |id| manifest.atoms.get(id));

        for (dep_id, dep_layer) in &violations {
            debug!(
                atom_id = %atom.id,
                layer = %atom.layer,
                dependency_id = %dep_id,
                dependency_layer = %dep_layer,
                "Layer dependency not allowed"
            );
        }

        violations.is_empty()
    }

    /// Run the full dependency validator over the stored atoms
    pub fn validate_all(&self) -> ValidationReport {
        let manifest = self.manifest.lock();
        let atoms: Vec<Atom> = manifest.atoms.values().cloned().collect();
        validation::validate_atoms(&atoms, &manifest.layers)
    }

    // ========================================================================
    // Layers & Project
    // ========================================================================

    pub fn layers(&self) -> LayerPolicy {
        self.manifest.lock().layers.clone()
    }

    /// Insert or replace a layer definition
    pub fn set_layer(&self, layer: Layer) {
        let mut manifest = self.manifest.lock();
        info!(layer = %layer.name, "Layer policy updated");
        manifest.layers.insert(layer);
        self.auto_save_locked(&mut manifest);
    }

    pub fn project(&self) -> ProjectMetadata {
        self.manifest.lock().project.clone()
    }

    pub fn set_project(&self, project: ProjectMetadata) {
        let mut manifest = self.manifest.lock();
        manifest.project = project;
        self.auto_save_locked(&mut manifest);
    }

    pub fn manifest_snapshot(&self) -> SolutionManifest {
        self.manifest.lock().clone()
    }

    // ========================================================================
    // Semantic Signature Table
    // ========================================================================

    pub fn add_interface_signature(&self, signature: InterfaceSignature) {
        let mut manifest = self.manifest.lock();
        let key = signature.key();
        manifest.signatures.add_interface(signature);
        self.publish_signature(key, "interface");
        self.auto_save_locked(&mut manifest);
    }

    pub fn add_dto_signature(&self, signature: DtoSignature) {
        let mut manifest = self.manifest.lock();
        let key = signature.key();
        manifest.signatures.add_dto(signature);
        self.publish_signature(key, "dto");
        self.auto_save_locked(&mut manifest);
    }

    fn publish_signature(&self, key: SignatureKey, kind: &str) {
        debug!(signature = %key, kind, "Signature registered");
        self.event_bus.publish_store_event(StoreEvent::SignatureRegistered {
            key,
            signature_kind: kind.to_string(),
            registered_at: Utc::now(),
        });
    }

    /// Read-only snapshot of the signature table
    pub fn signature_table(&self) -> SemanticSignatureTable {
        self.manifest.lock().signatures.clone()
    }

    pub fn interface_signature(&self, key: &SignatureKey) -> Option<InterfaceSignature> {
        self.manifest.lock().signatures.interface(key).cloned()
    }

    pub fn dto_signature(&self, key: &SignatureKey) -> Option<DtoSignature> {
        self.manifest.lock().signatures.dto(key).cloned()
    }

    /// Signatures of the atom's completed dependencies, matched by symbol name
    pub fn signatures_for_dependencies(&self, atom: &Atom) -> DependencyContext {
        let manifest = self.manifest.lock();
        let mut context = DependencyContext::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for dep in atom
            .dependencies
            .iter()
            .filter_map(|id| manifest.atoms.get(id))
            .filter(|d| d.status == AtomStatus::Completed)
        {
            if !seen.insert(dep.name.as_str()) {
                continue;
            }
            context
                .interfaces
                .extend(manifest.signatures.interfaces_named(&dep.name).cloned());
            context
                .dtos
                .extend(manifest.signatures.dtos_named(&dep.name).cloned());
        }

        context
    }
}
