// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Atom Classifier
//!
//! Turns raw work units into atoms by inferring `kind` and `layer` from
//! lexical cues in the unit description.
//!
//! This is a best-effort heuristic with no notion of confidence. It may
//! misclassify, and nothing downstream treats its output as a guarantee:
//! the dependency validator and the abstractions-first pass run regardless.
//! Explicit hints on the unit always win over inference.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::domain::atom::{Atom, AtomId, AtomKind};
use crate::domain::decomposition::RawWorkUnit;
use crate::domain::layer::{LayerName, LayerPolicy};

const INTERFACE_CUES: &[&str] = &["interface", "contract"];
const DTO_CUES: &[&str] = &["dto", "model", "entity"];
const TEST_CUES: &[&str] = &["test"];

const CORE_CUES: &[&str] = &["dto", "model", "entity", "interface", "contract"];
const INFRASTRUCTURE_CUES: &[&str] = &["implementation", "repository", "service", "storage"];
const PRESENTATION_CUES: &[&str] = &["controller", "api", "ui", "endpoint"];

fn has_cue(text: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| text.contains(cue))
}

/// Kind from description cues. Interface cues win over DTO cues, DTO over test.
pub fn infer_kind(description: &str) -> AtomKind {
    let text = description.to_lowercase();
    if has_cue(&text, INTERFACE_CUES) {
        AtomKind::Interface
    } else if has_cue(&text, DTO_CUES) {
        AtomKind::Dto
    } else if has_cue(&text, TEST_CUES) {
        AtomKind::Test
    } else {
        AtomKind::Implementation
    }
}

/// Layer from description cues; unmatched descriptions land in Infrastructure.
pub fn infer_layer(description: &str) -> LayerName {
    let text = description.to_lowercase();
    if has_cue(&text, CORE_CUES) {
        LayerName::core()
    } else if has_cue(&text, INFRASTRUCTURE_CUES) {
        LayerName::infrastructure()
    } else if has_cue(&text, PRESENTATION_CUES) {
        LayerName::presentation()
    } else {
        LayerName::infrastructure()
    }
}

/// Symbol name for a unit without a name hint.
///
/// Prefers the first identifier-looking word of the description
/// (`IOrderRepository`, `OrderDto`), else PascalCases the unit id.
pub fn derive_name(unit: &RawWorkUnit) -> String {
    let identifier = unit
        .description
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|word| {
            let mut chars = word.chars();
            matches!(chars.next(), Some(c) if c.is_uppercase())
                && chars.any(|c| c.is_uppercase())
        });

    match identifier {
        Some(word) => word.to_string(),
        None => pascal_case(&unit.id),
    }
}

fn pascal_case(raw: &str) -> String {
    raw.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

pub struct AtomClassifier {
    policy: LayerPolicy,
}

impl AtomClassifier {
    pub fn new(policy: LayerPolicy) -> Self {
        Self { policy }
    }

    /// Classify every unit. Never fails: units with an empty id are skipped,
    /// later duplicates of an id are dropped, self-dependencies are removed.
    pub fn classify(&self, units: &[RawWorkUnit]) -> Vec<Atom> {
        let mut seen: HashSet<AtomId> = HashSet::with_capacity(units.len());
        let mut atoms = Vec::with_capacity(units.len());

        for unit in units {
            let id = match AtomId::new(unit.id.clone()) {
                Ok(id) => id,
                Err(e) => {
                    warn!(description = %unit.description, "Skipping work unit: {}", e);
                    continue;
                }
            };
            if !seen.insert(id.clone()) {
                warn!(atom_id = %id, "Duplicate work unit id, keeping the first occurrence");
                continue;
            }
            atoms.push(self.classify_unit(id, unit));
        }

        atoms
    }

    fn classify_unit(&self, id: AtomId, unit: &RawWorkUnit) -> Atom {
        let kind = unit.kind.unwrap_or_else(|| infer_kind(&unit.description));
        let layer = match &unit.layer {
            Some(hint) => {
                if !self.policy.contains(hint) {
                    warn!(atom_id = %id, layer = %hint, "Layer hint not declared in policy, keeping it");
                }
                hint.clone()
            }
            None => infer_layer(&unit.description),
        };
        let name = unit
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| derive_name(unit));

        let mut dependencies: Vec<AtomId> = Vec::with_capacity(unit.dependency_ids.len());
        for raw in &unit.dependency_ids {
            let Ok(dep) = AtomId::new(raw.clone()) else {
                warn!(atom_id = %id, "Ignoring empty dependency id");
                continue;
            };
            if dep == id {
                warn!(atom_id = %id, "Removing self-dependency");
                continue;
            }
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }

        debug!(atom_id = %id, %kind, %layer, name = %name, "Classified work unit");

        let mut atom = Atom::new(id, name, kind, layer).with_description(unit.description.clone());
        atom.dependencies = dependencies;
        atom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_kind() {
        assert_eq!(infer_kind("IOrderRepository interface"), AtomKind::Interface);
        assert_eq!(infer_kind("Payment contract"), AtomKind::Interface);
        assert_eq!(infer_kind("Order DTO"), AtomKind::Dto);
        assert_eq!(infer_kind("Customer entity"), AtomKind::Dto);
        assert_eq!(infer_kind("Unit tests for checkout"), AtomKind::Test);
        assert_eq!(infer_kind("Send emails"), AtomKind::Implementation);
    }

    #[test]
    fn test_infer_layer() {
        assert_eq!(infer_layer("Order model"), LayerName::core());
        assert_eq!(infer_layer("SQL repository"), LayerName::infrastructure());
        assert_eq!(infer_layer("Orders controller"), LayerName::presentation());
        assert_eq!(infer_layer("Send emails"), LayerName::infrastructure());
    }

    #[test]
    fn test_hints_win() {
        let classifier = AtomClassifier::new(LayerPolicy::default_three_layer());
        let mut unit = RawWorkUnit::new("u1", "Order DTO", Vec::<String>::new());
        unit.kind = Some(AtomKind::Implementation);
        unit.layer = Some(LayerName::new("Domain"));
        unit.name = Some("OrderMapper".to_string());

        let atoms = classifier.classify(&[unit]);
        assert_eq!(atoms[0].kind, AtomKind::Implementation);
        assert_eq!(atoms[0].layer, LayerName::new("Domain"));
        assert_eq!(atoms[0].name, "OrderMapper");
    }

    #[test]
    fn test_duplicates_and_self_dependencies_dropped() {
        let classifier = AtomClassifier::new(LayerPolicy::default_three_layer());
        let units = vec![
            RawWorkUnit::new("a", "Order DTO", ["a", "b", "b"]),
            RawWorkUnit::new("a", "Something else", Vec::<String>::new()),
            RawWorkUnit::new("", "No id", Vec::<String>::new()),
        ];

        let atoms = classifier.classify(&units);
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].dependencies, vec![AtomId::new("b").unwrap()]);
    }

    #[test]
    fn test_derive_name() {
        let unit = RawWorkUnit::new("order-dto", "Define the OrderDto record", Vec::<String>::new());
        assert_eq!(derive_name(&unit), "OrderDto");

        let unit = RawWorkUnit::new("order-dto", "define the order record", Vec::<String>::new());
        assert_eq!(derive_name(&unit), "OrderDto");
    }
}
