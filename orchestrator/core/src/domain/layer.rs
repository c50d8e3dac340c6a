// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Layer Policy
//!
//! Architectural tiers and the allow-list each tier may depend on. Only direct
//! declared allowances are checked; allowances are not transitive.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Layer table shared by the validator and the knowledge store

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const CORE_LAYER: &str = "Core";
pub const INFRASTRUCTURE_LAYER: &str = "Infrastructure";
pub const PRESENTATION_LAYER: &str = "Presentation";

/// Name of an architectural layer. Layer sets are user-configurable, so this
/// stays an open string; membership is checked against the live [`LayerPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerName(String);

impl LayerName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn core() -> Self {
        Self::new(CORE_LAYER)
    }

    pub fn infrastructure() -> Self {
        Self::new(INFRASTRUCTURE_LAYER)
    }

    pub fn presentation() -> Self {
        Self::new(PRESENTATION_LAYER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An architectural tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub name: LayerName,

    #[serde(default)]
    pub description: String,

    /// Layers this layer may depend on directly
    #[serde(default)]
    pub allowed_dependencies: BTreeSet<LayerName>,
}

impl Layer {
    pub fn new(
        name: impl Into<LayerName>,
        description: impl Into<String>,
        allowed: impl IntoIterator<Item = LayerName>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            allowed_dependencies: allowed.into_iter().collect(),
        }
    }

    pub fn allows(&self, target: &LayerName) -> bool {
        self.allowed_dependencies.contains(target)
    }

    pub fn is_zero_dependency(&self) -> bool {
        self.allowed_dependencies.is_empty()
    }
}

/// The layer table: layer name -> Layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct LayerPolicy {
    layers: BTreeMap<LayerName, Layer>,
}

impl LayerPolicy {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Default three-layer policy: zero-dependency Core, Infrastructure on Core,
    /// Presentation on both.
    pub fn default_three_layer() -> Self {
        let mut policy = Self::empty();
        policy.insert(Layer::new(
            LayerName::core(),
            "Domain entities, DTOs and interfaces. No dependencies.",
            [],
        ));
        policy.insert(Layer::new(
            LayerName::infrastructure(),
            "Implementations of core interfaces: repositories, services, storage.",
            [LayerName::core()],
        ));
        policy.insert(Layer::new(
            LayerName::presentation(),
            "Entry points: controllers, APIs, UI.",
            [LayerName::core(), LayerName::infrastructure()],
        ));
        policy
    }

    /// Insert or replace a layer by name. Returns the previous definition.
    pub fn insert(&mut self, layer: Layer) -> Option<Layer> {
        self.layers.insert(layer.name.clone(), layer)
    }

    pub fn remove(&mut self, name: &LayerName) -> Option<Layer> {
        self.layers.remove(name)
    }

    pub fn get(&self, name: &LayerName) -> Option<&Layer> {
        self.layers.get(name)
    }

    pub fn contains(&self, name: &LayerName) -> bool {
        self.layers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &LayerName> {
        self.layers.keys()
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Whether `from` may depend on `to`.
    ///
    /// Returns `None` when `from` is not declared, letting callers apply their
    /// own leniency for unknown layers.
    pub fn may_depend_on(&self, from: &LayerName, to: &LayerName) -> Option<bool> {
        self.get(from).map(|layer| layer.allows(to))
    }

    pub fn is_zero_dependency(&self, name: &LayerName) -> bool {
        self.get(name).map(Layer::is_zero_dependency).unwrap_or(false)
    }
}
