// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `strata plan`: decompose a request, order the atoms, store the plan

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use strata_core::application::{PlanOutcome, Planner};
use strata_core::domain::config::StrataConfigManifest;
use strata_core::domain::decomposition::DecompositionService;
use strata_core::infrastructure::decomposition::FileDecompositionService;

use super::render;
use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// What to build
    #[arg(short, long)]
    pub request: String,

    /// Extra context passed to the decomposition service
    #[arg(long, default_value = "")]
    pub context: String,

    /// Read work units from this JSON/YAML file instead of the configured service
    #[arg(long, value_name = "FILE")]
    pub units: Option<PathBuf>,

    /// Print the plan without storing it
    #[arg(long)]
    pub dry_run: bool,

    /// Print the ordered atoms as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(
    config: StrataConfigManifest,
    root: Option<PathBuf>,
    args: PlanArgs,
) -> Result<()> {
    let workspace = Workspace::open(config, root)?;

    let service: Arc<dyn DecompositionService> = match &args.units {
        Some(path) => Arc::new(FileDecompositionService::new(path.clone())),
        None => workspace
            .decomposition_service()
            .context("Failed to configure decomposition service")?,
    };

    let planner = Planner::new(
        workspace.config.spec.planner.clone(),
        workspace.store.layers(),
        service,
        workspace.event_bus.clone(),
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    info!(request = %args.request, dry_run = args.dry_run, "Planning request");
    let outcome = planner
        .plan_with_cancellation(&args.request, &args.context, cancel)
        .await
        .context("Planning failed")?;

    if !args.dry_run {
        workspace.store.upsert_plan(outcome.atoms.clone());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.atoms)?);
    } else {
        print_outcome(&outcome, args.dry_run, &workspace);
    }

    Ok(())
}

fn print_outcome(outcome: &PlanOutcome, dry_run: bool, workspace: &Workspace) {
    render::print_atoms(&outcome.atoms);
    println!();

    if !outcome.corrections.is_empty() {
        println!("{}", "Policy corrections:".bold());
        for correction in &outcome.corrections {
            let removed: Vec<&str> = correction
                .removed_dependencies
                .iter()
                .map(|d| d.as_str())
                .collect();
            println!(
                "  {} dropped [{}]: {}",
                correction.atom_id,
                removed.join(", "),
                correction.reason
            );
        }
        println!();
    }

    if !outcome.repairs.is_empty() {
        println!("{}", "Cycle repairs:".bold());
        for repair in &outcome.repairs {
            println!(
                "  attempt {}: {} no longer depends on {} ({})",
                repair.attempt, repair.atom_id, repair.removed_dependency, repair.strategy
            );
        }
        println!();
    }

    for issue in &outcome.issues {
        render::print_issue(issue);
    }

    if dry_run {
        println!("{}", "Dry run: plan not stored".yellow());
    } else {
        println!(
            "{}",
            format!(
                "✓ {} atoms stored in {}",
                outcome.atoms.len(),
                workspace.manifest_path().display()
            )
            .green()
        );
    }
}
