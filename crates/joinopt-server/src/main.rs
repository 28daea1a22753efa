//! # joinopt-server: HTTP Service for the Join-Order Optimizer
//!
//! This binary crate exposes the join-order search as a network service, so a
//! planner written in another language can ask for a join order without linking
//! against the optimizer.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   | HTTP POST /optimize (text encoding) or /optimize/join-graph (JSON)
//!   v
//! joinopt-server (this binary)
//!   |
//!   +-> decode request into a JoinQuery
//!   +-> JoinOrderSearch (subset DP over the memo)
//!   +-> format the best plan
//!   |
//!   | HTTP response
//!   v
//! Client
//! ```
//!
//! ## Endpoints
//!
//! - `GET  /health`                - Health check
//! - `POST /optimize`              - Optimize a query in the text encoding
//!                                   (`?explain=true` for the explain report)
//! - `POST /optimize/join-graph`   - Optimize a join graph given as JSON
//!
//! ## Configuration
//!
//! The listen address and relation limit come from `JOINOPT_LISTEN_ADDR`
//! (default `0.0.0.0:3000`) and `JOINOPT_MAX_RELATIONS` (default 16). Logging is
//! controlled by the `RUST_LOG` environment variable (defaults to `joinopt=debug`).

mod join_graph;
mod routes;
mod state;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::state::{AppState, OptimizerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("joinopt=debug".parse()?))
        .init();

    let config = OptimizerConfig::from_env();
    let addr = config.listen_addr.clone();
    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/optimize", post(routes::optimize_text))
        .route("/optimize/join-graph", post(join_graph::optimize_join_graph))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("joinopt-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
