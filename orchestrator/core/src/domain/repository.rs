// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for the `SolutionManifest` aggregate, following the
//! DDD Repository pattern: interface defined in the domain layer, implemented
//! in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `ManifestRepository` | `SolutionManifest` | `JsonFileManifestRepository`, `InMemoryManifestRepository` |
//!
//! ## Storage Backend Abstraction
//!
//! One named resource per workspace holds the whole serialized manifest. The
//! format is an adapter detail but must round-trip every field.
//!
//! The contract is synchronous: the knowledge store calls it from inside its
//! critical section, so a save is atomic with the mutation that triggered it.

use std::path::PathBuf;

use crate::domain::manifest::SolutionManifest;

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    JsonFile(PathBuf),
}

/// Repository interface for the SolutionManifest aggregate
pub trait ManifestRepository: Send + Sync {
    /// Read the stored manifest. `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<SolutionManifest>, RepositoryError>;

    /// Replace the stored manifest
    fn save(&self, manifest: &SolutionManifest) -> Result<(), RepositoryError>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => RepositoryError::NotFound(err.to_string()),
            _ => RepositoryError::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
