// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Entities, value objects, ports and pure services of the planning context.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Atoms, layers, the solution manifest, graph ordering and
//!   dependency validation. No I/O lives here.

pub mod atom;
pub mod config;
pub mod decomposition;
pub mod events;
pub mod graph;
pub mod layer;
pub mod manifest;
pub mod planning;
pub mod repository;
pub mod validation;
