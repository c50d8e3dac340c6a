// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Solution Manifest Domain Model
//!
//! The full persisted state of a workspace: project metadata, layer policy,
//! the atom collection and the Semantic Signature Table.
//!
//! # Architectural Context
//!
//! - **Bounded Context:** Planning Context
//! - **Aggregate Root:** SolutionManifest
//!
//! The signature table lets code generation receive signatures only, never
//! full source, for already-completed dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::atom::{Atom, AtomId};
use crate::domain::layer::LayerPolicy;

// ============================================================================
// Value Objects: Project Metadata
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    pub root_namespace: String,
    pub target_framework: String,
    pub last_updated: DateTime<Utc>,
}

impl ProjectMetadata {
    pub fn new(
        name: impl Into<String>,
        root_namespace: impl Into<String>,
        target_framework: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root_namespace: root_namespace.into(),
            target_framework: target_framework.into(),
            last_updated: Utc::now(),
        }
    }
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self::new("Solution", "Solution", "net8.0")
    }
}

// ============================================================================
// Value Objects: Semantic Signatures
// ============================================================================

/// (name, namespace) key of a signature entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignatureKey {
    pub name: String,
    pub namespace: String,
}

impl SignatureKey {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl std::fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}

/// Public shape of an interface: its method signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSignature {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl InterfaceSignature {
    pub fn key(&self) -> SignatureKey {
        SignatureKey::new(&self.name, &self.namespace)
    }
}

/// Public shape of a DTO: its property signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtoSignature {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub properties: Vec<String>,
}

impl DtoSignature {
    pub fn key(&self) -> SignatureKey {
        SignatureKey::new(&self.name, &self.namespace)
    }
}

/// Semantic Signature Table.
///
/// # Invariants
/// - At most one interface signature per (name, namespace)
/// - At most one DTO signature per (name, namespace)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SemanticSignatureTable {
    #[serde(default)]
    interfaces: Vec<InterfaceSignature>,
    #[serde(default)]
    dtos: Vec<DtoSignature>,
}

impl SemanticSignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace-by-key: an existing entry with the same key is removed before
    /// the new one is appended.
    pub fn add_interface(&mut self, signature: InterfaceSignature) {
        let key = signature.key();
        self.interfaces.retain(|existing| existing.key() != key);
        self.interfaces.push(signature);
    }

    pub fn add_dto(&mut self, signature: DtoSignature) {
        let key = signature.key();
        self.dtos.retain(|existing| existing.key() != key);
        self.dtos.push(signature);
    }

    pub fn interface(&self, key: &SignatureKey) -> Option<&InterfaceSignature> {
        self.interfaces.iter().find(|sig| &sig.key() == key)
    }

    pub fn dto(&self, key: &SignatureKey) -> Option<&DtoSignature> {
        self.dtos.iter().find(|sig| &sig.key() == key)
    }

    pub fn interfaces(&self) -> &[InterfaceSignature] {
        &self.interfaces
    }

    pub fn dtos(&self) -> &[DtoSignature] {
        &self.dtos
    }

    /// All interface signatures named `name`, in any namespace
    pub fn interfaces_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a InterfaceSignature> {
        self.interfaces.iter().filter(move |sig| sig.name == name)
    }

    /// All DTO signatures named `name`, in any namespace
    pub fn dtos_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DtoSignature> {
        self.dtos.iter().filter(move |sig| sig.name == name)
    }

    pub fn len(&self) -> usize {
        self.interfaces.len() + self.dtos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.dtos.is_empty()
    }
}

// ============================================================================
// Aggregate Root: SolutionManifest
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionManifest {
    pub project: ProjectMetadata,

    pub layers: LayerPolicy,

    /// Atom collection keyed by id. Iteration order is by id and carries no meaning.
    #[serde(default)]
    pub atoms: BTreeMap<AtomId, Atom>,

    #[serde(default)]
    pub signatures: SemanticSignatureTable,
}

impl SolutionManifest {
    pub fn new(project: ProjectMetadata, layers: LayerPolicy) -> Self {
        Self {
            project,
            layers,
            atoms: BTreeMap::new(),
            signatures: SemanticSignatureTable::new(),
        }
    }

    /// Fresh manifest with the default three-layer policy
    pub fn with_default_layers(project: ProjectMetadata) -> Self {
        Self::new(project, LayerPolicy::default_three_layer())
    }

    pub fn atom(&self, id: &AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn touch(&mut self) {
        self.project.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_signature_replaced_by_key() {
        let mut table = SemanticSignatureTable::new();
        table.add_interface(InterfaceSignature {
            name: "IOrderRepository".to_string(),
            namespace: "Shop.Core".to_string(),
            methods: vec!["Task<Order> Get(int id)".to_string()],
        });
        table.add_interface(InterfaceSignature {
            name: "IOrderRepository".to_string(),
            namespace: "Shop.Core".to_string(),
            methods: vec!["Task<Order> Get(Guid id)".to_string()],
        });
        table.add_interface(InterfaceSignature {
            name: "IOrderRepository".to_string(),
            namespace: "Shop.Legacy".to_string(),
            methods: vec![],
        });

        assert_eq!(table.interfaces().len(), 2);
        let sig = table
            .interface(&SignatureKey::new("IOrderRepository", "Shop.Core"))
            .unwrap();
        assert_eq!(sig.methods, vec!["Task<Order> Get(Guid id)".to_string()]);
    }

    #[test]
    fn test_dto_signature_replaced_by_key() {
        let mut table = SemanticSignatureTable::new();
        table.add_dto(DtoSignature {
            name: "Order".to_string(),
            namespace: "Shop.Core".to_string(),
            properties: vec!["int Id".to_string()],
        });
        table.add_dto(DtoSignature {
            name: "Order".to_string(),
            namespace: "Shop.Core".to_string(),
            properties: vec!["Guid Id".to_string(), "decimal Total".to_string()],
        });

        assert_eq!(table.dtos().len(), 1);
        assert_eq!(table.dtos()[0].properties.len(), 2);
    }

    #[test]
    fn test_signature_key_display() {
        assert_eq!(SignatureKey::new("Order", "Shop.Core").to_string(), "Shop.Core.Order");
        assert_eq!(SignatureKey::new("Order", "").to_string(), "Order");
    }
}
