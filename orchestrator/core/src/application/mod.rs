// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod abstractions_first;
pub mod classifier;
pub mod knowledge_store;
pub mod planner;
pub mod repair;

// Re-export services for convenience
pub use knowledge_store::{DependencyContext, KnowledgeStore, KnowledgeStoreOptions, LoadOutcome, StatusCounts};
pub use planner::{PlanOutcome, Planner, PlanningError};
