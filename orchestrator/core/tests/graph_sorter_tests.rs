// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Ordering properties of the graph sorter.
//!
//! Acyclic inputs are generated by letting node i depend only on nodes with a
//! lower index, then shuffling the list before sorting.

use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::{HashMap, HashSet};

use strata_core::domain::atom::{Atom, AtomId, AtomKind};
use strata_core::domain::graph::{GraphSorter, SortOutcome};
use strata_core::domain::layer::LayerName;

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

fn ids(atoms: &[Atom]) -> Vec<&str> {
    atoms.iter().map(|a| a.id.as_str()).collect()
}

// -- Strategy helpers --

/// Shuffled DAG of `sizes` nodes. Roughly a quarter of the backward edges are
/// present and one node in five also references an absent id.
fn arb_dag(sizes: std::ops::RangeInclusive<usize>) -> impl Strategy<Value = Vec<Atom>> {
    sizes
        .prop_flat_map(|size| {
            (
                prop::collection::vec(prop::bool::weighted(0.25), size * size),
                prop::collection::vec(prop::bool::weighted(0.2), size),
            )
        })
        .prop_map(|(edges, absent)| {
            let size = absent.len();
            (0..size)
                .map(|i| {
                    let mut deps: Vec<String> = (0..i)
                        .filter(|j| edges[i * size + j])
                        .map(|j| format!("n{j}"))
                        .collect();
                    if absent[i] {
                        deps.push(format!("absent{i}"));
                    }
                    let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
                    atom(&format!("n{i}"), &deps)
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

fn assert_respects_dependencies(input: &[Atom], output: &[Atom]) {
    assert_eq!(input.len(), output.len());

    let present: HashSet<&AtomId> = input.iter().map(|a| &a.id).collect();
    let position: HashMap<&AtomId, usize> =
        output.iter().enumerate().map(|(i, a)| (&a.id, i)).collect();
    assert_eq!(position.len(), input.len(), "output is not a permutation");

    for atom in output {
        for dep in &atom.dependencies {
            if present.contains(dep) {
                assert!(
                    position[dep] < position[&atom.id],
                    "{} placed before its dependency {}",
                    atom.id,
                    dep
                );
            }
        }
    }
}

#[test]
fn test_scenario_a_diamond() {
    let atoms = vec![
        atom("a1", &[]),
        atom("a2", &["a1"]),
        atom("a3", &["a1"]),
        atom("a4", &["a2", "a3"]),
    ];

    let ordered = GraphSorter::sort(&atoms).unwrap().into_result().unwrap();
    let order = ids(&ordered);
    assert_eq!(order.first(), Some(&"a1"));
    assert_eq!(order.last(), Some(&"a4"));
    assert!(order[1..3].contains(&"a2"));
    assert!(order[1..3].contains(&"a3"));
}

#[test]
fn test_scenario_b_two_cycle() {
    let atoms = vec![atom("a1", &["a2"]), atom("a2", &["a1"])];

    match GraphSorter::sort(&atoms).unwrap() {
        SortOutcome::CycleDetected(cycle) => {
            let nodes: Vec<&str> = cycle.nodes().iter().map(AtomId::as_str).collect();
            assert!(nodes == ["a1", "a2"] || nodes == ["a2", "a1"], "got {nodes:?}");
        }
        SortOutcome::Ordered(order) => panic!("expected a cycle, got {:?}", ids(&order)),
    }
}

proptest! {
    #[test]
    fn acyclic_sets_are_ordered(input in arb_dag(1..=25)) {
        let output = match GraphSorter::sort(&input).unwrap() {
            SortOutcome::Ordered(output) => output,
            SortOutcome::CycleDetected(cycle) => panic!("false cycle {cycle}"),
        };

        assert_respects_dependencies(&input, &output);
        prop_assert!(output.iter().all(|a| !a.id.as_str().starts_with("absent")));
    }

    #[test]
    fn sorting_sorted_output_is_idempotent(input in arb_dag(12..=12)) {
        let once = GraphSorter::sort(&input).unwrap().into_result().unwrap();
        let twice = GraphSorter::sort(&once).unwrap().into_result().unwrap();
        prop_assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn reported_cycles_are_real(
        mut input in arb_dag(10..=10),
        a in any::<Index>(),
        b in any::<Index>()
    ) {
        // Close a back edge between two nodes to force a cycle
        let (a, b) = (a.index(input.len()), b.index(input.len()));
        let (from, to) = (input[a].id.clone(), input[b].id.clone());
        if !input[b].dependencies.contains(&from) {
            input[b].dependencies.push(from.clone());
        }
        if !input[a].dependencies.contains(&to) {
            input[a].dependencies.push(to);
        }

        let edges: HashSet<(AtomId, AtomId)> = input
            .iter()
            .flat_map(|n| n.dependencies.iter().map(|d| (n.id.clone(), d.clone())))
            .collect();

        match GraphSorter::sort(&input).unwrap() {
            SortOutcome::Ordered(output) => assert_respects_dependencies(&input, &output),
            SortOutcome::CycleDetected(cycle) => {
                prop_assert!(!cycle.is_empty(), "empty cycle");
                let distinct: HashSet<&AtomId> = cycle.nodes().iter().collect();
                prop_assert_eq!(distinct.len(), cycle.len(), "repeated node");
                for edge in cycle.edges() {
                    prop_assert!(edges.contains(&edge), "{:?} is not an edge", edge);
                }
            }
        }
    }
}

#[test]
fn test_absent_dependencies_do_not_block() {
    let atoms = vec![atom("b", &["later"]), atom("a", &["b", "ghost"])];

    let ordered = GraphSorter::sort(&atoms).unwrap().into_result().unwrap();
    assert_eq!(ids(&ordered), vec!["b", "a"]);
}
