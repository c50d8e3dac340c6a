// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use strata_core::domain::config::StrataConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective configuration as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./strata-config.yaml)
        #[arg(short, long, default_value = "./strata-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, yaml: bool) -> Result<()> {
    let config = StrataConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if yaml {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. STRATA_CONFIG_PATH: {}",
            std::env::var("STRATA_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./strata-config.yaml");
        println!("  4. ~/.strata/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    let spec = &config.spec;
    println!("{}", "Workspace:".bold());
    println!("  Root: {}", spec.workspace.root.display());
    println!("  Manifest: {}", spec.workspace.manifest_path().display());
    println!();

    println!("{}", "Project defaults:".bold());
    println!("  Name: {}", spec.project.name);
    println!("  Root namespace: {}", spec.project.root_namespace);
    println!("  Target framework: {}", spec.project.target_framework);
    println!();

    println!("{}", "Planner:".bold());
    println!(
        "  Abstractions first: {}",
        spec.planner.enforce_abstractions_first
    );
    println!("  Max repair attempts: {}", spec.planner.max_repair_attempts);
    println!("  Repair strategy: {:?}", spec.planner.repair_strategy);
    println!();

    println!("{}", "Knowledge store:".bold());
    println!("  Auto-save: {}", spec.knowledge_store.auto_save);
    println!();

    println!("{}", "Decomposition:".bold());
    println!("  Provider: {:?}", spec.decomposition.provider);
    if let Some(endpoint) = &spec.decomposition.endpoint {
        println!("  Endpoint: {}", endpoint);
    }
    if let Some(units) = &spec.decomposition.units_file {
        println!("  Units file: {}", units.display());
    }
    println!("  Timeout: {}s", spec.decomposition.timeout_seconds);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = StrataConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse_and_validate() {
        for template in [
            include_str!("../../templates/config-minimal.yaml"),
            include_str!("../../templates/config-with-examples.yaml"),
        ] {
            let config = StrataConfigManifest::from_yaml_str(template).unwrap();
            config.validate().unwrap();
        }
    }
}
