// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Dependency Validator
//!
//! Pure checks of architectural layering and dependency legality over an atom
//! set and a layer policy. Nothing here mutates state or logs; callers decide
//! how to surface issues.
//!
//! | Check | Severity |
//! |-------|----------|
//! | Dependency on a layer outside the allow-list | Error |
//! | Self-loop | Error |
//! | Dangling dependency (id not in the set) | Warning |
//! | Interface on a DTO in the same zero-dependency layer | Warning |
//! | Atom in an undeclared layer | Warning |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::atom::{Atom, AtomId, AtomKind};
use crate::domain::layer::{LayerName, LayerPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    LayerViolation {
        atom_id: AtomId,
        atom_layer: LayerName,
        dependency_id: AtomId,
        dependency_layer: LayerName,
    },
    SelfDependency {
        atom_id: AtomId,
    },
    DanglingDependency {
        atom_id: AtomId,
        dependency_id: AtomId,
    },
    UnknownLayer {
        atom_id: AtomId,
        layer: LayerName,
    },
    /// The one edge a zero-dependency layer keeps under abstractions-first:
    /// an interface referencing a DTO of its own layer.
    InterfaceOnLayerDto {
        atom_id: AtomId,
        dependency_id: AtomId,
        layer: LayerName,
    },
}

impl ValidationIssue {
    pub fn severity(&self) -> Severity {
        match self {
            ValidationIssue::LayerViolation { .. } | ValidationIssue::SelfDependency { .. } => {
                Severity::Error
            }
            ValidationIssue::DanglingDependency { .. }
            | ValidationIssue::UnknownLayer { .. }
            | ValidationIssue::InterfaceOnLayerDto { .. } => Severity::Warning,
        }
    }

    pub fn atom_id(&self) -> &AtomId {
        match self {
            ValidationIssue::LayerViolation { atom_id, .. }
            | ValidationIssue::SelfDependency { atom_id }
            | ValidationIssue::DanglingDependency { atom_id, .. }
            | ValidationIssue::UnknownLayer { atom_id, .. }
            | ValidationIssue::InterfaceOnLayerDto { atom_id, .. } => atom_id,
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::LayerViolation {
                atom_id,
                atom_layer,
                dependency_id,
                dependency_layer,
            } => write!(
                f,
                "'{}' ({}) may not depend on '{}' ({})",
                atom_id, atom_layer, dependency_id, dependency_layer
            ),
            ValidationIssue::SelfDependency { atom_id } => {
                write!(f, "'{}' depends on itself", atom_id)
            }
            ValidationIssue::DanglingDependency { atom_id, dependency_id } => {
                write!(f, "'{}' references unknown atom '{}'", atom_id, dependency_id)
            }
            ValidationIssue::UnknownLayer { atom_id, layer } => {
                write!(f, "'{}' is in undeclared layer '{}'", atom_id, layer)
            }
            ValidationIssue::InterfaceOnLayerDto {
                atom_id,
                dependency_id,
                layer,
            } => write!(
                f,
                "interface '{}' references DTO '{}' inside zero-dependency layer {}",
                atom_id, dependency_id, layer
            ),
        }
    }
}

/// Aggregated result of [`validate_atoms`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Boundary check for an open layer name.
pub fn validate_layer_name(policy: &LayerPolicy, name: &LayerName) -> bool {
    policy.contains(name)
}

/// Layer legality of one atom against a lookup of existing atoms.
///
/// Dependencies that do not resolve are skipped. An atom whose own layer is not
/// declared passes; returns the violating dependency ids otherwise.
pub fn layer_violations<'a, F>(atom: &Atom, policy: &LayerPolicy, lookup: F) -> Vec<(AtomId, LayerName)>
where
    F: Fn(&AtomId) -> Option<&'a Atom>,
{
    let Some(layer) = policy.get(&atom.layer) else {
        return Vec::new();
    };

    atom.dependencies
        .iter()
        .filter_map(|dep_id| lookup(dep_id))
        .filter(|dep| !layer.allows(&dep.layer))
        .map(|dep| (dep.id.clone(), dep.layer.clone()))
        .collect()
}

pub fn find_layer_violations(atoms: &[Atom], policy: &LayerPolicy) -> Vec<ValidationIssue> {
    let by_id = index(atoms);
    let mut issues = Vec::new();

    for atom in atoms {
        if !policy.contains(&atom.layer) {
            issues.push(ValidationIssue::UnknownLayer {
                atom_id: atom.id.clone(),
                layer: atom.layer.clone(),
            });
            continue;
        }

        for (dependency_id, dependency_layer) in
            layer_violations(atom, policy, |id| by_id.get(id).copied())
        {
            let dependency_kind = by_id.get(&dependency_id).map(|dep| dep.kind);
            if is_interface_on_layer_dto(atom, dependency_kind, &dependency_layer, policy) {
                issues.push(ValidationIssue::InterfaceOnLayerDto {
                    atom_id: atom.id.clone(),
                    dependency_id,
                    layer: dependency_layer,
                });
                continue;
            }

            issues.push(ValidationIssue::LayerViolation {
                atom_id: atom.id.clone(),
                atom_layer: atom.layer.clone(),
                dependency_id,
                dependency_layer,
            });
        }
    }

    issues
}

/// Interfaces in a zero-dependency layer may reference that layer's DTOs.
/// The literal allow-list still rejects the edge; the report downgrades it.
fn is_interface_on_layer_dto(
    atom: &Atom,
    dependency_kind: Option<AtomKind>,
    dependency_layer: &LayerName,
    policy: &LayerPolicy,
) -> bool {
    atom.kind == AtomKind::Interface
        && dependency_kind == Some(AtomKind::Dto)
        && *dependency_layer == atom.layer
        && policy.is_zero_dependency(&atom.layer)
}

pub fn find_dangling_references(atoms: &[Atom]) -> Vec<ValidationIssue> {
    let by_id = index(atoms);
    atoms
        .iter()
        .flat_map(|atom| {
            atom.dependencies
                .iter()
                .filter(|dep| !by_id.contains_key(dep))
                .map(|dep| ValidationIssue::DanglingDependency {
                    atom_id: atom.id.clone(),
                    dependency_id: dep.clone(),
                })
        })
        .collect()
}

pub fn find_self_loops(atoms: &[Atom]) -> Vec<ValidationIssue> {
    atoms
        .iter()
        .filter(|atom| atom.has_self_dependency())
        .map(|atom| ValidationIssue::SelfDependency {
            atom_id: atom.id.clone(),
        })
        .collect()
}

/// Run every check and collect the issues.
pub fn validate_atoms(atoms: &[Atom], policy: &LayerPolicy) -> ValidationReport {
    let mut issues = find_self_loops(atoms);
    issues.extend(find_layer_violations(atoms, policy));
    issues.extend(find_dangling_references(atoms));
    ValidationReport { issues }
}

fn index(atoms: &[Atom]) -> HashMap<&AtomId, &Atom> {
    atoms.iter().map(|a| (&a.id, a)).collect()
}
