// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Decomposition Service Adapters
//
// Anti-corruption layer between the planner's DecompositionService port and
// whatever produces work units: an HTTP decomposition endpoint or a units
// file on disk.

pub mod file;
pub mod http;

pub use file::FileDecompositionService;
pub use http::HttpDecompositionService;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::domain::config::{DecompositionConfig, DecompositionProviderKind};
use crate::domain::decomposition::DecompositionService;

/// Build the decomposition service selected by configuration.
///
/// A relative `units_file` is resolved against `workspace_root`.
pub fn create_decomposition_service(
    config: &DecompositionConfig,
    workspace_root: &Path,
) -> anyhow::Result<Arc<dyn DecompositionService>> {
    let service: Arc<dyn DecompositionService> = match config.provider {
        DecompositionProviderKind::Http => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| anyhow::anyhow!("decomposition.endpoint is required for the http provider"))?;
            let api_key = config.resolve_api_key()?;
            info!("Using HTTP decomposition service at {}", endpoint);
            Arc::new(HttpDecompositionService::new(
                endpoint,
                api_key,
                Duration::from_secs(config.timeout_seconds),
            )?)
        }
        DecompositionProviderKind::File => {
            let units_file = config
                .units_file
                .clone()
                .ok_or_else(|| anyhow::anyhow!("decomposition.units_file is required for the file provider"))?;
            let path = if units_file.is_relative() {
                workspace_root.join(units_file)
            } else {
                units_file
            };
            info!("Using units file {}", path.display());
            Arc::new(FileDecompositionService::new(path))
        }
    };

    Ok(service)
}
