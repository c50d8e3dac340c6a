// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP Decomposition Adapter
//
// POST {endpoint}/decompose  {request, context}      -> {units: [...]}
// POST {endpoint}/repair     {cycle, description}    -> {remove_edges: [...]}
//
// No internal retry: transient failures surface to the planner unchanged.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::atom::{Atom, AtomId};
use crate::domain::decomposition::{
    CycleRepairProposal, DecompositionError, DecompositionResult, DecompositionService,
};
use crate::domain::graph::Cycle;

pub struct HttpDecompositionService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct DecomposeRequest<'a> {
    request: &'a str,
    context: &'a str,
}

#[derive(Serialize)]
struct RepairRequest<'a> {
    cycle: &'a [AtomId],
    description: String,
    atoms: Vec<RepairAtom<'a>>,
}

#[derive(Serialize)]
struct RepairAtom<'a> {
    id: &'a AtomId,
    name: &'a str,
    description: &'a str,
    dependencies: &'a [AtomId],
}

impl HttpDecompositionService {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DecompositionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DecompositionError::Provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, DecompositionError>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned + Send,
    {
        let url = self.url(path);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DecompositionError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status == 401 || status == 403 {
                DecompositionError::Authentication(error_text)
            } else if status == 429 || status.is_server_error() {
                DecompositionError::Transient(format!("HTTP {}: {}", status, error_text))
            } else {
                DecompositionError::Provider(format!("HTTP {}: {}", status, error_text))
            });
        }

        response
            .json()
            .await
            .map_err(|e| DecompositionError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl DecompositionService for HttpDecompositionService {
    async fn decompose(
        &self,
        request: &str,
        context: &str,
    ) -> Result<DecompositionResult, DecompositionError> {
        self.post("decompose", &DecomposeRequest { request, context })
            .await
    }

    async fn propose_cycle_repair(
        &self,
        cycle: &Cycle,
        atoms: &[Atom],
    ) -> Result<CycleRepairProposal, DecompositionError> {
        let body = RepairRequest {
            cycle: cycle.nodes(),
            description: cycle.describe(),
            atoms: atoms
                .iter()
                .filter(|a| cycle.contains(&a.id))
                .map(|a| RepairAtom {
                    id: &a.id,
                    name: &a.name,
                    description: &a.description,
                    dependencies: &a.dependencies,
                })
                .collect(),
        };
        self.post("repair", &body).await
    }
}
