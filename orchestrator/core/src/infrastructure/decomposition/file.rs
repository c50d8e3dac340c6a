// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// File Decomposition Adapter
//
// Reads pre-computed work units from a JSON or YAML document shaped like
// `{units: [{id, description, dependencyIds}]}`. The request text is ignored.
// Used for offline planning and reproducible runs.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::decomposition::{DecompositionError, DecompositionResult, DecompositionService};

pub struct FileDecompositionService {
    path: PathBuf,
}

impl FileDecompositionService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

/// Parse a units document. JSON is valid YAML, so YAML is the fallback.
pub fn parse_units(content: &str, json: bool) -> Result<DecompositionResult, DecompositionError> {
    if json {
        serde_json::from_str(content)
            .map_err(|e| DecompositionError::InvalidResponse(format!("Invalid units JSON: {}", e)))
    } else {
        serde_yaml::from_str(content)
            .map_err(|e| DecompositionError::InvalidResponse(format!("Invalid units YAML: {}", e)))
    }
}

#[async_trait]
impl DecompositionService for FileDecompositionService {
    async fn decompose(
        &self,
        _request: &str,
        _context: &str,
    ) -> Result<DecompositionResult, DecompositionError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DecompositionError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;

        let result = parse_units(&content, self.is_json())?;
        debug!(path = %self.path.display(), unit_count = result.units.len(), "Units loaded from file");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_yaml_units() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.yaml");
        std::fs::write(
            &path,
            "units:\n  - id: a1\n    description: Order DTO\n  - id: a2\n    description: Order service\n    dependencyIds: [a1]\n",
        )
        .unwrap();

        let result = FileDecompositionService::new(&path)
            .decompose("ignored", "")
            .await
            .unwrap();
        assert_eq!(result.units.len(), 2);
        assert!(result.units[0].dependency_ids.is_empty());
        assert_eq!(result.units[1].dependency_ids, vec!["a1".to_string()]);
    }

    #[tokio::test]
    async fn test_reads_json_units_with_hints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.json");
        std::fs::write(
            &path,
            r#"{"units":[{"id":"a1","description":"x","dependencies":[],"kind":"DTO","layer":"Core"}]}"#,
        )
        .unwrap();

        let result = FileDecompositionService::new(&path)
            .decompose("", "")
            .await
            .unwrap();
        assert_eq!(result.units[0].kind, Some(crate::domain::atom::AtomKind::Dto));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let err = FileDecompositionService::new("/nonexistent/units.yaml")
            .decompose("", "")
            .await
            .unwrap_err();
        assert!(matches!(err, DecompositionError::Unavailable(_)));
    }
}
