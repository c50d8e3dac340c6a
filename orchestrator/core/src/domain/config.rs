// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Orchestrator Configuration Types
//
// Defines the configuration schema for a Strata workspace, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Workspace location and manifest file name
// - Project defaults for freshly initialized manifests
// - Planner policy (abstractions-first, bounded cycle repair)
// - Knowledge store auto-save
// - Decomposition service selection
// - Observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "strata.dev/v1";
pub const CONFIG_KIND: &str = "StrataConfig";

/// Top-level Kubernetes-style configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrataConfigManifest {
    /// API version (must be "strata.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "StrataConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: StrataConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfigSpec {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub project: ProjectDefaults,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub knowledge_store: KnowledgeStoreConfig,

    #[serde(default)]
    pub decomposition: DecompositionConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Workspace root directory
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,

    /// Manifest file name, relative to `root`
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
}

impl WorkspaceConfig {
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest_file)
    }
}

/// Metadata used when a workspace manifest is initialized from scratch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDefaults {
    #[serde(default = "default_project_name")]
    pub name: String,

    #[serde(default = "default_project_name")]
    pub root_namespace: String,

    #[serde(default = "default_target_framework")]
    pub target_framework: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Apply DTO -> Interface -> Implementation -> Test normalization
    #[serde(default = "default_true")]
    pub enforce_abstractions_first: bool,

    /// Maximum cycle-repair attempts before a plan fails
    #[serde(default = "default_max_repair_attempts")]
    pub max_repair_attempts: u32,

    #[serde(default)]
    pub repair_strategy: RepairStrategyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RepairStrategyKind {
    /// Drop the last-listed dependency of the atom with the most dependencies
    #[default]
    DropLastDependency,
    /// Ask the decomposition service first, fall back to drop-last-dependency
    Delegate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStoreConfig {
    /// Persist after every mutating operation
    #[serde(default = "default_true")]
    pub auto_save: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionConfig {
    #[serde(default)]
    pub provider: DecompositionProviderKind,

    /// Service base URL (http provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Units file (file provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_file: Option<PathBuf>,

    /// Request timeout in seconds (http provider)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl DecompositionConfig {
    /// Resolve `api_key`, following "env:VAR_NAME" indirection
    pub fn resolve_api_key(&self) -> anyhow::Result<Option<String>> {
        match &self.api_key {
            Some(k) => match k.strip_prefix("env:") {
                Some(var_name) => std::env::var(var_name)
                    .map(Some)
                    .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name)),
                None => Ok(Some(k.clone())),
            },
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionProviderKind {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_max_repair_attempts() -> u32 {
    3
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_manifest_file() -> String {
    ".strata/manifest.json".to_string()
}

fn default_project_name() -> String {
    "Solution".to_string()
}

fn default_target_framework() -> String {
    "net8.0".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            manifest_file: default_manifest_file(),
        }
    }
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            root_namespace: default_project_name(),
            target_framework: default_target_framework(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enforce_abstractions_first: true,
            max_repair_attempts: default_max_repair_attempts(),
            repair_strategy: RepairStrategyKind::default(),
        }
    }
}

impl Default for KnowledgeStoreConfig {
    fn default() -> Self {
        Self { auto_save: true }
    }
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            provider: DecompositionProviderKind::File,
            endpoint: None,
            api_key: None,
            units_file: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for StrataConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: CONFIG_KIND.to_string(),
            metadata: ManifestMetadata {
                name: "strata-workspace".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: StrataConfigSpec::default(),
        }
    }
}

impl StrataConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. STRATA_CONFIG_PATH environment variable
    /// 2. ./strata-config.yaml (working directory)
    /// 3. ~/.strata/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("STRATA_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./strata-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".strata").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STRATA_MAX_REPAIR_ATTEMPTS") {
            match val.trim().parse::<u32>() {
                Ok(attempts) => {
                    tracing::info!("Environment override: STRATA_MAX_REPAIR_ATTEMPTS={}", attempts);
                    self.spec.planner.max_repair_attempts = attempts;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for STRATA_MAX_REPAIR_ATTEMPTS: '{}'. Expected an integer. Ignoring.",
                    val
                ),
            }
        }

        if let Some(flag) = Self::env_flag("STRATA_AUTO_SAVE") {
            self.spec.knowledge_store.auto_save = flag;
        }

        if let Some(flag) = Self::env_flag("STRATA_ENFORCE_ABSTRACTIONS_FIRST") {
            self.spec.planner.enforce_abstractions_first = flag;
        }
    }

    fn env_flag(name: &str) -> Option<bool> {
        let val = std::env::var(name).ok()?;
        match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => {
                tracing::info!("Environment override: {}=true", name);
                Some(true)
            }
            "false" | "0" | "no" | "off" => {
                tracing::info!("Environment override: {}=false", name);
                Some(false)
            }
            _ => {
                tracing::warn!(
                    "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                    name,
                    val
                );
                None
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != CONFIG_KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, CONFIG_KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.workspace.manifest_file.trim().is_empty() {
            anyhow::bail!("spec.workspace.manifest_file cannot be empty");
        }

        if self.spec.project.name.trim().is_empty() {
            anyhow::bail!("spec.project.name cannot be empty");
        }

        let decomposition = &self.spec.decomposition;
        if decomposition.provider == DecompositionProviderKind::Http
            && decomposition.endpoint.as_deref().map_or(true, |e| e.trim().is_empty())
        {
            anyhow::bail!("spec.decomposition.endpoint is required for the http provider");
        }

        if decomposition.timeout_seconds == 0 {
            anyhow::bail!("spec.decomposition.timeout_seconds must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = StrataConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, CONFIG_KIND);
        assert!(manifest.spec.planner.enforce_abstractions_first);
        assert_eq!(manifest.spec.planner.max_repair_attempts, 3);
        assert!(manifest.spec.knowledge_store.auto_save);
        assert_eq!(
            manifest.spec.workspace.manifest_path(),
            PathBuf::from("./.strata/manifest.json")
        );
    }

    #[test]
    fn test_yaml_with_partial_spec_uses_defaults() {
        let yaml = r#"
apiVersion: strata.dev/v1
kind: StrataConfig
metadata:
  name: shop
spec:
  planner:
    max_repair_attempts: 5
    repair_strategy: delegate
  decomposition:
    provider: http
    endpoint: http://localhost:8080
"#;
        let manifest = StrataConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.planner.max_repair_attempts, 5);
        assert_eq!(manifest.spec.planner.repair_strategy, RepairStrategyKind::Delegate);
        assert!(manifest.spec.planner.enforce_abstractions_first);
        assert_eq!(manifest.spec.decomposition.provider, DecompositionProviderKind::Http);
        assert_eq!(manifest.spec.decomposition.timeout_seconds, 120);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut manifest = StrataConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "WrongKind".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = CONFIG_KIND.to_string();

        manifest.spec.decomposition.provider = DecompositionProviderKind::Http;
        assert!(manifest.validate().is_err());
        manifest.spec.decomposition.endpoint = Some("http://localhost:9000".to_string());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_api_key_literal() {
        let config = DecompositionConfig {
            api_key: Some("sk-test".to_string()),
            ..DecompositionConfig::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), Some("sk-test".to_string()));
    }
}
