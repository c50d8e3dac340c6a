// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for Strata CLI

pub mod config;
pub mod plan;
pub mod render;
pub mod workspace;

pub use self::config::ConfigCommand;
pub use self::plan::PlanArgs;
