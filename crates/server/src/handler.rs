//! Handler implementation for the twinfed RPC service

use crate::protocol::{Health, TwinService};
use std::sync::Arc;
use tarpc::context;
use tracing::{info, warn};
use twinfed::FederationEngine;
use twinfed_types::query::{ErrorBody, QueryResponse, SpaceQuery};

/// Shared by every connection and every transport.
#[derive(Clone)]
pub struct Handler {
    engine: Arc<FederationEngine>,
}

impl Handler {
    pub fn new(engine: Arc<FederationEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &FederationEngine {
        &self.engine
    }

    /// Run one query. Failures come back as the structured error body.
    pub async fn query(&self, query: SpaceQuery) -> Result<QueryResponse, ErrorBody> {
        match self.engine.execute_query(&query).await {
            Ok(response) => {
                info!(
                    space = query.space.as_deref().unwrap_or_default(),
                    spaces = response.spaces.len(),
                    failures = response.failures.len(),
                    "spaces query served"
                );
                Ok(response)
            }
            Err(e) => {
                let body = e.to_body();
                warn!(status = body.status, error = %body.error, "spaces query rejected");
                Err(body)
            }
        }
    }
}

impl TwinService for Handler {
    async fn spaces(
        self,
        _: context::Context,
        query: SpaceQuery,
    ) -> Result<QueryResponse, ErrorBody> {
        self.query(query).await
    }

    async fn health(self, _: context::Context) -> Health {
        Health::healthy()
    }
}
