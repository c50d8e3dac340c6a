// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the `ManifestRepository` abstraction
//! defined in the domain layer, following the Repository pattern from DDD.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve the SolutionManifest aggregate
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **JsonFileManifestRepository** - One pretty-printed JSON file per workspace,
//!   replaced atomically on every save
//! - **InMemoryManifestRepository** - Thread-safe, ephemeral storage for tests
//!   and dry runs; can be told to fail saves
//!
//! # Usage
//!
//! ```no_run
//! use strata_core::infrastructure::repositories::create_repository;
//! use strata_core::domain::repository::StorageBackend;
//!
//! let repo = create_repository(&StorageBackend::JsonFile(".strata/manifest.json".into()));
//! ```

pub mod json_file;

pub use json_file::JsonFileManifestRepository;

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::manifest::SolutionManifest;
use crate::domain::repository::{ManifestRepository, RepositoryError, StorageBackend};

/// Build the repository for a storage backend
pub fn create_repository(backend: &StorageBackend) -> Arc<dyn ManifestRepository> {
    match backend {
        StorageBackend::InMemory => Arc::new(InMemoryManifestRepository::new()),
        StorageBackend::JsonFile(path) => Arc::new(JsonFileManifestRepository::new(path.clone())),
    }
}

#[derive(Clone, Default)]
pub struct InMemoryManifestRepository {
    manifest: Arc<RwLock<Option<SolutionManifest>>>,
    fail_saves: Arc<AtomicBool>,
    save_count: Arc<AtomicUsize>,
}

impl InMemoryManifestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-seeded with a stored manifest
    pub fn with_manifest(manifest: SolutionManifest) -> Self {
        let repo = Self::new();
        *repo.manifest.write() = Some(manifest);
        repo
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Copy of what is currently stored
    pub fn stored(&self) -> Option<SolutionManifest> {
        self.manifest.read().clone()
    }
}

impl ManifestRepository for InMemoryManifestRepository {
    fn load(&self) -> Result<Option<SolutionManifest>, RepositoryError> {
        Ok(self.manifest.read().clone())
    }

    fn save(&self, manifest: &SolutionManifest) -> Result<(), RepositoryError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepositoryError::Io("simulated write failure".to_string()));
        }
        *self.manifest.write() = Some(manifest.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::ProjectMetadata;

    #[test]
    fn test_in_memory_round_trip() {
        let repo = InMemoryManifestRepository::new();
        assert!(repo.load().unwrap().is_none());

        let manifest = SolutionManifest::with_default_layers(ProjectMetadata::default());
        repo.save(&manifest).unwrap();

        assert_eq!(repo.load().unwrap(), Some(manifest));
        assert_eq!(repo.save_count(), 1);
    }

    #[test]
    fn test_in_memory_failing_saves() {
        let repo = InMemoryManifestRepository::new();
        repo.set_fail_saves(true);

        let manifest = SolutionManifest::with_default_layers(ProjectMetadata::default());
        assert!(repo.save(&manifest).is_err());
        assert!(repo.stored().is_none());
    }
}
