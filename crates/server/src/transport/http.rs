//! HTTP transport for the twinfed server
//!
//! Endpoints:
//! - `POST /v1/spaces` with a JSON [`SpaceQuery`] body
//! - `GET  /v1/spaces?space=..&startDate=..&endDate=..`
//! - `GET  /health`
//!
//! Successful queries answer `200` with `{spaces, failures}`. Errors answer
//! with `{error, status}` and the matching status code: `400` for bad input,
//! `500` when the graph store is down, `504` when the deadline elapses
//! before traversal completes.

use crate::handler::Handler;
use crate::protocol::Health;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tracing::info;
use twinfed::FederationEngine;
use twinfed_types::query::{ErrorBody, SpaceQuery};

/// Build the router over a shared engine.
pub fn router(engine: Arc<FederationEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/spaces", get(query_spaces).post(post_spaces))
        .with_state(Handler::new(engine))
}

/// Serve the router until `shutdown` resolves.
pub async fn run_http_server(
    listener: tokio::net::TcpListener,
    engine: Arc<FederationEngine>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("twinfed HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn health() -> Json<Health> {
    Json(Health::healthy())
}

async fn post_spaces(
    State(handler): State<Handler>,
    body: Result<Json<SpaceQuery>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(query)) => run(&handler, query).await,
        Err(rejection) => error_response(ErrorBody {
            error: format!("invalid input: {}", rejection.body_text()),
            status: 400,
        }),
    }
}

async fn query_spaces(
    State(handler): State<Handler>,
    params: Result<Query<SpaceQuery>, QueryRejection>,
) -> Response {
    match params {
        Ok(Query(query)) => run(&handler, query).await,
        Err(rejection) => error_response(ErrorBody {
            error: format!("invalid input: {}", rejection.body_text()),
            status: 400,
        }),
    }
}

async fn run(handler: &Handler, query: SpaceQuery) -> Response {
    match handler.query(query).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(body) => error_response(body),
    }
}

fn error_response(body: ErrorBody) -> Response {
    let status = StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}
