//! Query orchestration.
//!
//! A request moves through
//! `PARSING_TIME_RANGE -> RESOLVING_GRAPH -> FETCHING_MEASUREMENTS -> AGGREGATING -> DONE`
//! and can fail from any stage. One deadline, derived from
//! [`Config::request_timeout`], covers the whole request:
//! - during traversal an elapsed deadline fails the request
//! - during the fetch it turns the unfinished sensors into failures

use crate::builder::FederationBuilder;
use crate::compute::aggregate::aggregate;
use crate::compute::fetch::{FetchOptions, FetchOutcome, MeasurementFetcher};
use crate::compute::traversal::{GraphResolver, ResolvedSet, TraversalOptions};
use crate::compute::validation::{TimeWindow, validate_query};
use crate::config::Config;
use crate::error::{FederationError, QueryStage, Result};
use crate::storage::{GraphStore, TimeSeriesStore};
use std::sync::Arc;
use tokio::time::Instant;
use twinfed_types::query::{QueryResponse, SpaceQuery};
use uuid::Uuid;

/// Federates one graph store and one time-series store.
///
/// Cheap to share: both stores sit behind `Arc` and are only ever read.
pub struct FederationEngine {
    graph: Arc<dyn GraphStore>,
    series: Arc<dyn TimeSeriesStore>,
    config: Config,
}

impl FederationEngine {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        series: Arc<dyn TimeSeriesStore>,
        config: Config,
    ) -> Self {
        Self {
            graph,
            series,
            config,
        }
    }

    pub fn builder() -> FederationBuilder {
        FederationBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve `space` and return its measurements between two ISO-8601 instants.
    pub async fn execute(
        &self,
        space: &str,
        start_iso: &str,
        end_iso: &str,
    ) -> Result<QueryResponse> {
        self.execute_query(&SpaceQuery::new(space, start_iso, end_iso))
            .await
    }

    /// Same as [`execute`](Self::execute) for a wire-shaped query.
    pub async fn execute_query(&self, query: &SpaceQuery) -> Result<QueryResponse> {
        let request = Request::new();
        let result = self.run(&request, query).await;

        match &result {
            Ok(response) => log::info!(
                "[{}] '{}' done: {} spaces, {} failed sensors in {:?}",
                request.id,
                query.space.as_deref().unwrap_or_default(),
                response.spaces.len(),
                response.failures.len(),
                request.started.elapsed()
            ),
            Err(e) => log::warn!(
                "[{}] query failed in {:?}: {}",
                request.id,
                request.started.elapsed(),
                e
            ),
        }

        result
    }

    async fn run(&self, request: &Request, query: &SpaceQuery) -> Result<QueryResponse> {
        let deadline = request.deadline(&self.config);

        request.enter(QueryStage::ParsingTimeRange);
        let validated = validate_query(query)?;

        request.enter(QueryStage::ResolvingGraph);
        let resolved = self.resolve(&validated.space, deadline).await?;
        log::debug!(
            "[{}] resolved {} sensors, {} documents, {} images over {} nodes",
            request.id,
            resolved.sensors.len(),
            resolved.documents.len(),
            resolved.images.len(),
            resolved.stats.nodes_visited
        );

        if resolved.is_empty() {
            request.enter(QueryStage::Done);
            return Ok(QueryResponse::default());
        }

        let outcome = if resolved.sensors.is_empty() {
            FetchOutcome::default()
        } else {
            request.enter(QueryStage::FetchingMeasurements);
            self.fetch(&resolved, validated.window, deadline).await
        };

        request.enter(QueryStage::Aggregating);
        let spaces = aggregate(&resolved, &outcome.records);

        request.enter(QueryStage::Done);
        Ok(QueryResponse {
            spaces,
            failures: outcome.failures,
        })
    }

    async fn resolve(&self, space: &str, deadline: Instant) -> Result<ResolvedSet> {
        let graph = Arc::clone(&self.graph);
        let options = TraversalOptions {
            max_depth: self.config.max_depth,
            containment_edges: self.config.containment_edges.clone(),
            deadline: Some(deadline.into_std()),
        };
        let space = space.to_string();

        let handle = tokio::task::spawn_blocking(move || {
            GraphResolver::new(graph.as_ref(), options).resolve(&space)
        });

        match tokio::time::timeout_at(deadline, handle).await {
            Ok(Ok(resolved)) => resolved,
            Ok(Err(e)) => Err(FederationError::Internal(format!(
                "graph traversal task failed: {}",
                e
            ))),
            Err(_) => Err(FederationError::DeadlineExceeded {
                stage: QueryStage::ResolvingGraph,
            }),
        }
    }

    async fn fetch(
        &self,
        resolved: &ResolvedSet,
        window: TimeWindow,
        deadline: Instant,
    ) -> FetchOutcome {
        let options = FetchOptions {
            max_concurrency: self.config.max_concurrency,
            deadline: Some(deadline),
            keys: self.config.time_series.clone(),
        };
        MeasurementFetcher::new(Arc::clone(&self.series), options)
            .fetch(&resolved.sensors, window)
            .await
    }
}

/// Per-request bookkeeping.
struct Request {
    id: Uuid,
    started: Instant,
}

impl Request {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Instant::now(),
        }
    }

    fn deadline(&self, config: &Config) -> Instant {
        self.started + config.request_timeout()
    }

    fn enter(&self, stage: QueryStage) {
        log::debug!("[{}] {}", self.id, stage);
    }
}
