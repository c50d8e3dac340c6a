// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Terminal rendering helpers

use colored::{ColoredString, Colorize};

use strata_core::domain::atom::{Atom, AtomStatus};
use strata_core::domain::validation::{Severity, ValidationIssue};

pub fn status_label(status: AtomStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        AtomStatus::Pending => text.dimmed(),
        AtomStatus::InProgress => text.cyan(),
        AtomStatus::Review => text.yellow(),
        AtomStatus::Completed => text.green(),
        AtomStatus::Failed => text.red(),
    }
}

pub fn print_atoms(atoms: &[Atom]) {
    if atoms.is_empty() {
        println!("{}", "No atoms.".dimmed());
        return;
    }

    let id_width = atoms.iter().map(|a| a.id.as_str().len()).max().unwrap_or(2).max(2);
    println!(
        "{:<id_width$}  {:<14}  {:<16}  {:<12}  {}",
        "ID".bold(),
        "KIND".bold(),
        "LAYER".bold(),
        "STATUS".bold(),
        "DEPENDS ON".bold(),
    );
    for atom in atoms {
        let deps: Vec<&str> = atom.dependencies.iter().map(|d| d.as_str()).collect();
        println!(
            "{:<id_width$}  {:<14}  {:<16}  {:<12}  {}",
            atom.id.as_str(),
            atom.kind.to_string(),
            atom.layer.as_str(),
            status_label(atom.status),
            if deps.is_empty() { "-".to_string() } else { deps.join(", ") },
        );
    }
}

pub fn print_issue(issue: &ValidationIssue) {
    match issue.severity() {
        Severity::Error => println!("  {} {}", "error:".red().bold(), issue),
        Severity::Warning => println!("  {} {}", "warning:".yellow().bold(), issue),
    }
}
