// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Graph Sorter
//!
//! Linearizes a node set so every node comes after its dependencies, or
//! reports one concrete cycle.
//!
//! # Algorithm
//!
//! Kahn's algorithm. In-degrees count only edges to dependency ids present in
//! the input; an absent id is a forward reference and never blocks a node.
//! Ready nodes are taken in original input order, so a fixed input always
//! yields the same order and an already-sorted input comes back unchanged.
//!
//! When nodes remain after the queue drains, an iterative depth-first search
//! over the remaining nodes extracts one cycle. It tracks a visited set and a
//! recursion-stack set so diamond-shaped sharing is not reported as a cycle.
//!
//! Pure and stateless; safe to call from any number of threads.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::domain::atom::{Atom, AtomId};

/// A node with outgoing dependency edges.
pub trait DependencyNode {
    fn node_id(&self) -> &AtomId;
    fn node_dependencies(&self) -> &[AtomId];
}

impl DependencyNode for Atom {
    fn node_id(&self) -> &AtomId {
        &self.id
    }

    fn node_dependencies(&self) -> &[AtomId] {
        &self.dependencies
    }
}

/// A dependency cycle.
///
/// Each id is a dependency of the one before it, and the first id is a
/// dependency of the last. A self-loop is a cycle of length 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    nodes: Vec<AtomId>,
}

impl Cycle {
    pub fn new(nodes: Vec<AtomId>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[AtomId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &AtomId) -> bool {
        self.nodes.contains(id)
    }

    /// `(dependent, dependency)` pairs, closing edge included
    pub fn edges(&self) -> Vec<(AtomId, AtomId)> {
        let n = self.nodes.len();
        (0..n)
            .map(|i| (self.nodes[i].clone(), self.nodes[(i + 1) % n].clone()))
            .collect()
    }

    /// Human-readable form: `a1 -> a2 -> a1`
    pub fn describe(&self) -> String {
        let mut parts: Vec<&str> = self.nodes.iter().map(AtomId::as_str).collect();
        if let Some(first) = self.nodes.first() {
            parts.push(first.as_str());
        }
        parts.join(" -> ")
    }
}

impl std::fmt::Display for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Result of a sort: callers branch on the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOutcome<T> {
    Ordered(Vec<T>),
    CycleDetected(Cycle),
}

impl<T> SortOutcome<T> {
    pub fn into_result(self) -> Result<Vec<T>, Cycle> {
        match self {
            SortOutcome::Ordered(nodes) => Ok(nodes),
            SortOutcome::CycleDetected(cycle) => Err(cycle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Duplicate node id '{0}' in sort input")]
    DuplicateNode(AtomId),
}

/// Topological sorter over [`DependencyNode`]s.
pub struct GraphSorter;

impl GraphSorter {
    /// Order `nodes` so each appears after all of its present dependencies.
    ///
    /// # Errors
    /// Returns [`GraphError::DuplicateNode`] when two nodes share an id.
    pub fn sort<T>(nodes: &[T]) -> Result<SortOutcome<T>, GraphError>
    where
        T: DependencyNode + Clone,
    {
        let mut index: HashMap<&AtomId, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.node_id(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.node_id().clone()));
            }
        }

        let edges = Self::present_edges(nodes, &index);

        let mut in_degree: Vec<usize> = edges.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (node, deps) in edges.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(node);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order: Vec<usize> = Vec::with_capacity(nodes.len());
        while let Some(Reverse(current)) = ready.pop() {
            order.push(current);
            for &dependent in &dependents[current] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() == nodes.len() {
            return Ok(SortOutcome::Ordered(
                order.into_iter().map(|i| nodes[i].clone()).collect(),
            ));
        }

        let emitted: HashSet<usize> = order.into_iter().collect();
        let remaining: Vec<usize> = (0..nodes.len()).filter(|i| !emitted.contains(i)).collect();
        let cycle = Self::extract_cycle(nodes, &edges, &remaining);

        Ok(SortOutcome::CycleDetected(cycle))
    }

    /// Per node, the deduplicated indices of its dependencies present in the input.
    fn present_edges<T: DependencyNode>(nodes: &[T], index: &HashMap<&AtomId, usize>) -> Vec<Vec<usize>> {
        nodes
            .iter()
            .map(|node| {
                let mut seen = HashSet::new();
                node.node_dependencies()
                    .iter()
                    .filter_map(|dep| index.get(dep).copied())
                    .filter(|dep| seen.insert(*dep))
                    .collect()
            })
            .collect()
    }

    /// Iterative DFS over `remaining` to find one concrete cycle.
    ///
    /// Every remaining node still has a remaining dependency, so a walk from any
    /// of them must close a loop.
    fn extract_cycle<T: DependencyNode>(nodes: &[T], edges: &[Vec<usize>], remaining: &[usize]) -> Cycle {
        let in_remaining: HashSet<usize> = remaining.iter().copied().collect();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut on_stack: HashSet<usize> = HashSet::new();

        for &start in remaining {
            if visited.contains(&start) {
                continue;
            }

            // (node, next edge position)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            visited.insert(start);
            on_stack.insert(start);

            while let Some(frame) = stack.last_mut() {
                let (node, pos) = *frame;
                let next = edges[node]
                    .iter()
                    .skip(pos)
                    .position(|dep| in_remaining.contains(dep))
                    .map(|offset| pos + offset);

                let Some(edge_pos) = next else {
                    on_stack.remove(&node);
                    stack.pop();
                    continue;
                };

                frame.1 = edge_pos + 1;
                let dep = edges[node][edge_pos];

                if on_stack.contains(&dep) {
                    let from = stack
                        .iter()
                        .position(|(n, _)| *n == dep)
                        .unwrap_or(0);
                    let ids = stack[from..]
                        .iter()
                        .map(|(n, _)| nodes[*n].node_id().clone())
                        .collect();
                    return Cycle::new(ids);
                }

                if visited.insert(dep) {
                    on_stack.insert(dep);
                    stack.push((dep, 0));
                }
            }
        }

        // Unreachable for well-formed remaining sets; report what is left.
        Cycle::new(remaining.iter().map(|i| nodes[*i].node_id().clone()).collect())
    }
}
