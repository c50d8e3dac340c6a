// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Abstractions-first normalization
//!
//! Pre-pass run before the topological sort. Strips dependencies that would
//! let abstractions lean on implementations or keep the zero-dependency layer
//! from being clean, then groups atoms DTO, Interface, Implementation, Test.
//!
//! Every stripped edge is reported as a [`PolicyCorrection`]. Corrections are
//! informational and never fail a plan.

use std::collections::HashMap;
use tracing::warn;

use crate::domain::atom::{Atom, AtomId, AtomKind};
use crate::domain::layer::{LayerName, LayerPolicy};
use crate::domain::planning::{CorrectionReason, PolicyCorrection};

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub atoms: Vec<Atom>,
    pub corrections: Vec<PolicyCorrection>,
}

/// Apply abstractions-first enforcement to a classified atom set.
pub fn enforce(atoms: Vec<Atom>, policy: &LayerPolicy) -> Normalized {
    let shape: HashMap<AtomId, (AtomKind, LayerName)> = atoms
        .iter()
        .map(|a| (a.id.clone(), (a.kind, a.layer.clone())))
        .collect();
    let kind_of = |id: &AtomId| shape.get(id).map(|(kind, _)| *kind);
    let is_core_dto = |id: &AtomId| {
        shape
            .get(id)
            .map(|(kind, layer)| *kind == AtomKind::Dto && policy.is_zero_dependency(layer))
            .unwrap_or(false)
    };

    let mut dtos = Vec::new();
    let mut interfaces = Vec::new();
    let mut implementations = Vec::new();
    let mut tests = Vec::new();
    let mut corrections = Vec::new();

    for mut atom in atoms {
        match atom.kind {
            AtomKind::Dto => {
                strip(
                    &mut atom,
                    |dep| kind_of(dep) == Some(AtomKind::Implementation),
                    CorrectionReason::AbstractionOnImplementation,
                    &mut corrections,
                );
                if policy.is_zero_dependency(&atom.layer) {
                    strip(
                        &mut atom,
                        |_| true,
                        CorrectionReason::CoreDtoNotDependencyFree,
                        &mut corrections,
                    );
                }
                dtos.push(atom);
            }
            AtomKind::Interface => {
                strip(
                    &mut atom,
                    |dep| kind_of(dep) == Some(AtomKind::Implementation),
                    CorrectionReason::AbstractionOnImplementation,
                    &mut corrections,
                );
                if policy.is_zero_dependency(&atom.layer) {
                    strip(
                        &mut atom,
                        |dep| !is_core_dto(dep),
                        CorrectionReason::CoreInterfaceOutsideCoreDtos,
                        &mut corrections,
                    );
                }
                interfaces.push(atom);
            }
            AtomKind::Implementation => implementations.push(atom),
            AtomKind::Test => tests.push(atom),
        }
    }

    let mut ordered = dtos;
    ordered.append(&mut interfaces);
    ordered.append(&mut implementations);
    ordered.append(&mut tests);

    Normalized {
        atoms: ordered,
        corrections,
    }
}

/// Remove every dependency matching `predicate`, recording one correction.
fn strip(
    atom: &mut Atom,
    predicate: impl Fn(&AtomId) -> bool,
    reason: CorrectionReason,
    corrections: &mut Vec<PolicyCorrection>,
) {
    let (removed, kept): (Vec<AtomId>, Vec<AtomId>) =
        atom.dependencies.drain(..).partition(|dep| predicate(dep));
    atom.dependencies = kept;

    if removed.is_empty() {
        return;
    }

    warn!(
        atom_id = %atom.id,
        layer = %atom.layer,
        removed = ?removed,
        "Policy correction: {}", reason
    );
    corrections.push(PolicyCorrection {
        atom_id: atom.id.clone(),
        removed_dependencies: removed,
        reason,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(id: &str, kind: AtomKind, layer: LayerName, deps: &[&str]) -> Atom {
        let mut atom = Atom::new(AtomId::new(id).unwrap(), id, kind, layer);
        atom.dependencies = deps.iter().map(|d| AtomId::new(*d).unwrap()).collect();
        atom
    }

    fn ids(atoms: &[Atom]) -> Vec<&str> {
        atoms.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_groups_in_fixed_order() {
        let atoms = vec![
            atom("t", AtomKind::Test, LayerName::infrastructure(), &[]),
            atom("impl", AtomKind::Implementation, LayerName::infrastructure(), &[]),
            atom("i", AtomKind::Interface, LayerName::core(), &[]),
            atom("d", AtomKind::Dto, LayerName::core(), &[]),
        ];

        let result = enforce(atoms, &LayerPolicy::default_three_layer());
        assert_eq!(ids(&result.atoms), vec!["d", "i", "impl", "t"]);
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_core_dto_cleared() {
        let atoms = vec![
            atom("other", AtomKind::Dto, LayerName::core(), &[]),
            atom("d", AtomKind::Dto, LayerName::core(), &["other", "missing"]),
        ];

        let result = enforce(atoms, &LayerPolicy::default_three_layer());
        let d = result.atoms.iter().find(|a| a.id.as_str() == "d").unwrap();
        assert!(d.dependencies.is_empty());
        assert_eq!(result.corrections.len(), 1);
        assert_eq!(result.corrections[0].reason, CorrectionReason::CoreDtoNotDependencyFree);
        assert_eq!(result.corrections[0].removed_dependencies.len(), 2);
    }

    #[test]
    fn test_infrastructure_dto_keeps_non_implementation_dependencies() {
        let atoms = vec![
            atom("core", AtomKind::Dto, LayerName::core(), &[]),
            atom("svc", AtomKind::Implementation, LayerName::infrastructure(), &[]),
            atom("d", AtomKind::Dto, LayerName::infrastructure(), &["core", "svc"]),
        ];

        let result = enforce(atoms, &LayerPolicy::default_three_layer());
        let d = result.atoms.iter().find(|a| a.id.as_str() == "d").unwrap();
        assert_eq!(d.dependencies, vec![AtomId::new("core").unwrap()]);
        assert_eq!(result.corrections[0].reason, CorrectionReason::AbstractionOnImplementation);
    }

    #[test]
    fn test_core_interface_keeps_only_core_dtos() {
        let atoms = vec![
            atom("order", AtomKind::Dto, LayerName::core(), &[]),
            atom("view", AtomKind::Dto, LayerName::presentation(), &[]),
            atom("other", AtomKind::Interface, LayerName::core(), &[]),
            atom("repo", AtomKind::Interface, LayerName::core(), &["order", "view", "other"]),
        ];

        let result = enforce(atoms, &LayerPolicy::default_three_layer());
        let repo = result.atoms.iter().find(|a| a.id.as_str() == "repo").unwrap();
        assert_eq!(repo.dependencies, vec![AtomId::new("order").unwrap()]);
        assert_eq!(result.corrections.len(), 1);
        assert_eq!(
            result.corrections[0].reason,
            CorrectionReason::CoreInterfaceOutsideCoreDtos
        );
    }

    #[test]
    fn test_implementations_untouched() {
        let atoms = vec![
            atom("a", AtomKind::Implementation, LayerName::infrastructure(), &["b"]),
            atom("b", AtomKind::Implementation, LayerName::infrastructure(), &["a"]),
        ];

        let result = enforce(atoms, &LayerPolicy::default_three_layer());
        assert_eq!(result.atoms[0].dependencies.len(), 1);
        assert_eq!(result.atoms[1].dependencies.len(), 1);
    }
}
