// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workspace wiring
//!
//! Builds the knowledge store, event bus and decomposition service for one
//! workspace from a loaded configuration. A store lives exactly as long as
//! its `Workspace`.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use strata_core::application::{KnowledgeStore, KnowledgeStoreOptions, LoadOutcome};
use strata_core::domain::config::StrataConfigManifest;
use strata_core::domain::decomposition::DecompositionService;
use strata_core::domain::repository::StorageBackend;
use strata_core::infrastructure::decomposition::create_decomposition_service;
use strata_core::infrastructure::event_bus::EventBus;
use strata_core::infrastructure::repositories::create_repository;

pub struct Workspace {
    pub config: StrataConfigManifest,
    pub root: PathBuf,
    pub event_bus: Arc<EventBus>,
    pub store: KnowledgeStore,
}

impl Workspace {
    /// Open with project defaults taken from the configuration
    pub fn open(config: StrataConfigManifest, root_override: Option<PathBuf>) -> Result<Self> {
        let options = KnowledgeStoreOptions::from_config(&config);
        Self::open_with(config, root_override, options)
    }

    pub fn open_with(
        config: StrataConfigManifest,
        root_override: Option<PathBuf>,
        options: KnowledgeStoreOptions,
    ) -> Result<Self> {
        let root = root_override.unwrap_or_else(|| config.spec.workspace.root.clone());
        let manifest_path = root.join(&config.spec.workspace.manifest_file);
        debug!("Opening workspace manifest at {}", manifest_path.display());

        let event_bus = Arc::new(EventBus::with_default_capacity());
        let repository = create_repository(&StorageBackend::JsonFile(manifest_path));
        let store = KnowledgeStore::open(repository, event_bus.clone(), options);

        Ok(Self {
            config,
            root,
            event_bus,
            store,
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.config.spec.workspace.manifest_file)
    }

    /// Re-read durable state, reporting how the manifest was obtained
    pub fn reload(&self) -> LoadOutcome {
        self.store.load()
    }

    pub fn decomposition_service(&self) -> Result<Arc<dyn DecompositionService>> {
        create_decomposition_service(&self.config.spec.decomposition, &self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_manifest_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let workspace =
            Workspace::open(StrataConfigManifest::default(), Some(dir.path().to_path_buf())).unwrap();

        assert!(workspace.manifest_path().exists());
        assert_eq!(workspace.store.layers().len(), 3);
        assert!(matches!(workspace.reload(), LoadOutcome::Loaded { atom_count: 0 }));
    }
}
