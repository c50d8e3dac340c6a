// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Strata Core
//!
//! Dependency-graph orchestration for incremental code generation.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Knowledge store, planner and topological scheduler
//!
//! The [`application::KnowledgeStore`] owns the persisted solution manifest.
//! The [`application::Planner`] turns an external decomposition into an
//! ordered, layer-respecting atom list using [`domain::graph::GraphSorter`].

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
