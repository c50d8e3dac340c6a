// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Manifest inspection and status commands
//!
//! Commands: init, atoms, ready, status, validate, layers

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use strata_core::application::{KnowledgeStoreOptions, LoadOutcome};
use strata_core::domain::atom::{AtomId, AtomStatus};
use strata_core::domain::config::StrataConfigManifest;
use strata_core::domain::manifest::ProjectMetadata;

use super::render;
use crate::workspace::Workspace;

pub fn init(
    config: StrataConfigManifest,
    root: Option<PathBuf>,
    name: Option<String>,
    namespace: Option<String>,
    framework: Option<String>,
) -> Result<()> {
    let mut options = KnowledgeStoreOptions::from_config(&config);
    let defaults = options.default_project.clone();
    let name = name.unwrap_or(defaults.name);
    let namespace = namespace.unwrap_or_else(|| name.clone());
    let framework = framework.unwrap_or(defaults.target_framework);
    options.default_project = ProjectMetadata::new(&name, &namespace, &framework);

    let workspace = Workspace::open_with(config, root, options)?;
    let project = workspace.store.project();

    match workspace.reload() {
        LoadOutcome::Loaded { atom_count } => {
            println!(
                "{}",
                format!("✓ Workspace ready: {}", workspace.manifest_path().display()).green()
            );
            println!("  Project: {} ({})", project.name.bold(), project.target_framework);
            println!("  Atoms:   {}", atom_count);
        }
        LoadOutcome::Initialized { reason } => {
            println!(
                "{}",
                format!("! Manifest could not be persisted ({})", reason).yellow()
            );
        }
    }

    Ok(())
}

pub fn atoms(
    config: StrataConfigManifest,
    root: Option<PathBuf>,
    status: Option<String>,
    json: bool,
) -> Result<()> {
    let workspace = Workspace::open(config, root)?;

    let atoms = match status {
        Some(s) => {
            let status: AtomStatus = s.parse().context("Invalid --status")?;
            workspace.store.atoms_by_status(status)
        }
        None => workspace.store.atoms(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&atoms)?);
    } else {
        render::print_atoms(&atoms);
        let progress = workspace.store.progress();
        println!();
        println!(
            "{} total, {} completed, {} in progress, {} failed",
            progress.total(),
            progress.completed,
            progress.in_progress,
            progress.failed
        );
    }

    Ok(())
}

pub fn ready(config: StrataConfigManifest, root: Option<PathBuf>, json: bool) -> Result<()> {
    let workspace = Workspace::open(config, root)?;
    let ready = workspace.store.ready_atoms();

    if json {
        println!("{}", serde_json::to_string_pretty(&ready)?);
    } else {
        render::print_atoms(&ready);
    }

    Ok(())
}

pub fn status(
    config: StrataConfigManifest,
    root: Option<PathBuf>,
    id: &str,
    status: &str,
    strict: bool,
) -> Result<()> {
    let workspace = Workspace::open(config, root)?;
    let id = AtomId::new(id)?;
    let status: AtomStatus = status.parse()?;

    if strict {
        workspace.store.transition_atom(&id, status)?;
    } else if !workspace.store.update_atom_status(&id, status) {
        bail!("Atom '{}' not found", id);
    }

    println!("✓ {} -> {}", id, render::status_label(status));
    Ok(())
}

pub fn validate(config: StrataConfigManifest, root: Option<PathBuf>) -> Result<()> {
    let workspace = Workspace::open(config, root)?;
    let report = workspace.store.validate_all();

    if report.is_clean() {
        println!("{}", "✓ No dependency issues".green());
        return Ok(());
    }

    println!("{}", "Dependency issues:".bold());
    for issue in &report.issues {
        render::print_issue(issue);
    }

    if report.has_errors() {
        bail!("{} error(s) found", report.errors().count());
    }
    Ok(())
}

pub fn layers(config: StrataConfigManifest, root: Option<PathBuf>) -> Result<()> {
    let workspace = Workspace::open(config, root)?;
    let policy = workspace.store.layers();

    println!("{}", "Layer policy:".bold());
    for layer in policy.layers() {
        let allowed: Vec<&str> = layer.allowed_dependencies.iter().map(|l| l.as_str()).collect();
        let allowed = if allowed.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            allowed.join(", ")
        };
        println!("  {} -> {}", layer.name.as_str().bold(), allowed);
        if !layer.description.is_empty() {
            println!("    {}", layer.description.dimmed());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::domain::atom::{Atom, AtomKind};
    use strata_core::domain::layer::LayerName;

    fn seeded_workspace(dir: &std::path::Path) -> Workspace {
        let workspace =
            Workspace::open(StrataConfigManifest::default(), Some(dir.to_path_buf())).unwrap();
        workspace.store.upsert_atom(Atom::new(
            AtomId::new("a1").unwrap(),
            "Order",
            AtomKind::Dto,
            LayerName::core(),
        ));
        workspace
    }

    #[test]
    fn test_status_updates_persist() {
        let dir = tempfile::tempdir().unwrap();
        drop(seeded_workspace(dir.path()));

        status(
            StrataConfigManifest::default(),
            Some(dir.path().to_path_buf()),
            "a1",
            "InProgress",
            true,
        )
        .unwrap();

        let reopened =
            Workspace::open(StrataConfigManifest::default(), Some(dir.path().to_path_buf())).unwrap();
        let atom = reopened.store.get_atom(&AtomId::new("a1").unwrap()).unwrap();
        assert_eq!(atom.status, AtomStatus::InProgress);
    }

    #[test]
    fn test_strict_status_rejects_skipping_ahead() {
        let dir = tempfile::tempdir().unwrap();
        drop(seeded_workspace(dir.path()));

        let result = status(
            StrataConfigManifest::default(),
            Some(dir.path().to_path_buf()),
            "a1",
            "Completed",
            true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_atom_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = status(
            StrataConfigManifest::default(),
            Some(dir.path().to_path_buf()),
            "ghost",
            "Completed",
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_accepts_core_interface_on_core_dto() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = seeded_workspace(dir.path());
        let mut repo = Atom::new(
            AtomId::new("repo").unwrap(),
            "IOrderRepository",
            AtomKind::Interface,
            LayerName::core(),
        );
        repo.dependencies = vec![AtomId::new("a1").unwrap()];
        workspace.store.upsert_atom(repo);
        drop(workspace);

        validate(StrataConfigManifest::default(), Some(dir.path().to_path_buf())).unwrap();
    }
}
