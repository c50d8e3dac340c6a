// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! JSON File Manifest Repository
//!
//! Stores the whole manifest as one pretty-printed JSON document. Saves write
//! a sibling temp file and rename it over the target, so a crash mid-write
//! leaves the previous snapshot intact.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::manifest::SolutionManifest;
use crate::domain::repository::{ManifestRepository, RepositoryError};

pub struct JsonFileManifestRepository {
    path: PathBuf,
}

impl JsonFileManifestRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "manifest.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ManifestRepository for JsonFileManifestRepository {
    fn load(&self) -> Result<Option<SolutionManifest>, RepositoryError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let manifest: SolutionManifest = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), "Manifest read from disk");
        Ok(Some(manifest))
    }

    fn save(&self, manifest: &SolutionManifest) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RepositoryError::Io(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(manifest)?;
        let temp = self.temp_path();
        std::fs::write(&temp, json).map_err(|e| {
            RepositoryError::Io(format!("Failed to write {}: {}", temp.display(), e))
        })?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            RepositoryError::Io(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(path = %self.path.display(), "Manifest written to disk");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::ProjectMetadata;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileManifestRepository::new(dir.path().join("nope.json"));
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".strata").join("manifest.json");
        let repo = JsonFileManifestRepository::new(&path);

        let manifest = SolutionManifest::with_default_layers(ProjectMetadata::new("Shop", "Shop", "net8.0"));
        repo.save(&manifest).unwrap();

        assert!(path.exists());
        assert!(!repo.temp_path().exists());
        assert_eq!(repo.load().unwrap(), Some(manifest));
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "{ not json").unwrap();

        let repo = JsonFileManifestRepository::new(&path);
        assert!(matches!(repo.load(), Err(RepositoryError::Serialization(_))));
    }
}
