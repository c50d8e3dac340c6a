// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Cycle repair strategies
//!
//! A repair removes one or more dependency edges from the planner's local
//! atom list so the next sort attempt can make progress. Repairs never touch
//! the Knowledge Store.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::atom::Atom;
use crate::domain::config::RepairStrategyKind;
use crate::domain::decomposition::{DecompositionService, EdgeRemoval};
use crate::domain::graph::Cycle;

pub const DROP_LAST_DEPENDENCY: &str = "drop-last-dependency";
pub const DELEGATED: &str = "delegated";

/// Edges removed by one repair attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairApplied {
    pub removed: Vec<EdgeRemoval>,
    pub strategy: &'static str,
}

impl RepairApplied {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Drop the last-listed dependency of the atom with the most dependencies.
/// Ties go to the earliest atom in the list.
pub fn drop_last_dependency(atoms: &mut [Atom]) -> RepairApplied {
    let mut target: Option<usize> = None;
    for (i, atom) in atoms.iter().enumerate() {
        let best = target.map(|t| atoms[t].dependencies.len()).unwrap_or(0);
        if atom.dependencies.len() > best {
            target = Some(i);
        }
    }

    let removed = target
        .and_then(|i| {
            let atom = &mut atoms[i];
            atom.dependencies.pop().map(|dependency_id| EdgeRemoval {
                atom_id: atom.id.clone(),
                dependency_id,
            })
        })
        .into_iter()
        .collect();

    RepairApplied {
        removed,
        strategy: DROP_LAST_DEPENDENCY,
    }
}

/// Remove the proposed edges that actually exist
fn apply_proposal(atoms: &mut [Atom], proposal: &[EdgeRemoval]) -> Vec<EdgeRemoval> {
    let mut removed = Vec::new();
    for edge in proposal {
        let Some(atom) = atoms.iter_mut().find(|a| a.id == edge.atom_id) else {
            debug!(atom_id = %edge.atom_id, "Proposed repair names an unknown atom");
            continue;
        };
        if atom.remove_dependency(&edge.dependency_id) {
            removed.push(edge.clone());
        }
    }
    removed
}

pub enum CycleRepairer {
    DropLastDependency,
    /// Ask the decomposition service first; fall back when it proposes nothing usable
    Delegated(Arc<dyn DecompositionService>),
}

impl CycleRepairer {
    pub fn from_kind(kind: RepairStrategyKind, service: Arc<dyn DecompositionService>) -> Self {
        match kind {
            RepairStrategyKind::DropLastDependency => CycleRepairer::DropLastDependency,
            RepairStrategyKind::Delegate => CycleRepairer::Delegated(service),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CycleRepairer::DropLastDependency => DROP_LAST_DEPENDENCY,
            CycleRepairer::Delegated(_) => DELEGATED,
        }
    }

    pub async fn repair(&self, cycle: &Cycle, atoms: &mut [Atom]) -> RepairApplied {
        match self {
            CycleRepairer::DropLastDependency => drop_last_dependency(atoms),
            CycleRepairer::Delegated(service) => {
                match service.propose_cycle_repair(cycle, atoms).await {
                    Ok(proposal) => {
                        let removed = apply_proposal(atoms, &proposal.remove_edges);
                        if !removed.is_empty() {
                            info!(cycle = %cycle, edges = removed.len(), "Applied delegated cycle repair");
                            return RepairApplied {
                                removed,
                                strategy: DELEGATED,
                            };
                        }
                        debug!(cycle = %cycle, "Delegated repair removed nothing, falling back");
                    }
                    Err(e) => {
                        warn!(cycle = %cycle, "Delegated cycle repair failed, falling back: {}", e);
                    }
                }
                drop_last_dependency(atoms)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::atom::{AtomId, AtomKind};
    use crate::domain::layer::LayerName;

    fn atom(id: &str, deps: &[&str]) -> Atom {
        let mut atom = Atom::new(
            AtomId::new(id).unwrap(),
            id,
            AtomKind::Implementation,
            LayerName::infrastructure(),
        );
        atom.dependencies = deps.iter().map(|d| AtomId::new(*d).unwrap()).collect();
        atom
    }

    #[test]
    fn test_drops_last_dependency_of_widest_atom() {
        let mut atoms = vec![atom("a", &["b"]), atom("b", &["a", "c"]), atom("c", &[])];
        let applied = drop_last_dependency(&mut atoms);

        assert_eq!(applied.removed.len(), 1);
        assert_eq!(applied.removed[0].atom_id.as_str(), "b");
        assert_eq!(applied.removed[0].dependency_id.as_str(), "c");
        assert_eq!(atoms[1].dependencies, vec![AtomId::new("a").unwrap()]);
    }

    #[test]
    fn test_tie_goes_to_first_atom() {
        let mut atoms = vec![atom("a", &["b"]), atom("b", &["a"])];
        let applied = drop_last_dependency(&mut atoms);

        assert_eq!(applied.removed[0].atom_id.as_str(), "a");
        assert!(atoms[0].dependencies.is_empty());
    }

    #[test]
    fn test_nothing_to_drop() {
        let mut atoms = vec![atom("a", &[])];
        assert!(drop_last_dependency(&mut atoms).is_empty());
    }

    #[test]
    fn test_apply_proposal_ignores_missing_edges() {
        let mut atoms = vec![atom("a", &["b"]), atom("b", &["a"])];
        let proposal = vec![
            EdgeRemoval {
                atom_id: AtomId::new("b").unwrap(),
                dependency_id: AtomId::new("a").unwrap(),
            },
            EdgeRemoval {
                atom_id: AtomId::new("a").unwrap(),
                dependency_id: AtomId::new("zzz").unwrap(),
            },
        ];

        let removed = apply_proposal(&mut atoms, &proposal);
        assert_eq!(removed.len(), 1);
        assert!(atoms[1].dependencies.is_empty());
    }
}
