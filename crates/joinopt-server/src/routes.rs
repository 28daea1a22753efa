//! # HTTP Route Handlers
//!
//! This module defines the Axum route handlers for the optimizer service.
//!
//! ## Optimization Pipeline
//!
//! The core optimization flow (`run_optimization`) is shared between the text and
//! join-graph endpoints:
//!
//! 1. **Consume**: Decode the request body into a `JoinQuery`.
//! 2. **Configure**: Build a `JoinOrderSearch` with the shared cost model and the
//!    configured relation limit.
//! 3. **Optimize**: Run the subset DP on a blocking thread.
//! 4. **Produce**: Format the winning plan for the caller.
//!
//! ## Error Handling
//!
//! Errors are returned as HTTP status codes with descriptive messages:
//! - 400 Bad Request: malformed input or a query that fails validation
//! - 422 Unprocessable Entity: a well-formed query with no feasible or finite-cost plan
//! - 500 Internal Server Error: the search task panicked

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use joinopt_core::catalog::JoinQuery;
use joinopt_core::error::OptimizeError;
use joinopt_core::memo::Memo;
use joinopt_core::plan::CostedPlan;
use joinopt_core::search::JoinOrderSearch;
use joinopt_text::{consumer, producer};

use crate::state::AppState;

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Query string for `POST /optimize`.
#[derive(Debug, Default, Deserialize)]
pub struct TextParams {
    /// Return the explain report instead of the single result line.
    #[serde(default)]
    pub explain: bool,
}

/// POST /optimize — accept the reference text encoding, return `<plan> <cost>`.
pub async fn optimize_text(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TextParams>,
    body: String,
) -> Result<String, (StatusCode, String)> {
    let query = consumer::parse_query(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid input: {}", e)))?;

    let (best, memo) = run_optimization(state, query).await?;

    let mut out = if params.explain {
        producer::format_explain(&best, &memo)
    } else {
        producer::format_result(&best)
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Core optimization logic shared between the text and join-graph endpoints.
///
/// The search is CPU-bound and exponential in the relation count, so it runs on
/// the blocking pool rather than an async worker. The memo is handed back for
/// explain output and statistics.
pub async fn run_optimization(
    state: Arc<AppState>,
    query: JoinQuery,
) -> Result<(CostedPlan, Memo), (StatusCode, String)> {
    let config = state.config.search_config();
    let cost_model = state.cost_model.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        let mut search = JoinOrderSearch::new(&query, cost_model, config);
        let best = search.optimize()?;
        Ok::<_, OptimizeError>((best, std::mem::take(&mut search.memo)))
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Optimization task failed: {}", e),
        )
    })?;

    let (best, memo) = outcome.map_err(|e| (optimize_error_status(&e), e.to_string()))?;
    debug!(
        "Optimized {} relations: cost {:.2}, {} memo entries",
        best.plan.relations().len(),
        best.cost.total,
        memo.num_entries()
    );
    Ok((best, memo))
}

fn optimize_error_status(err: &OptimizeError) -> StatusCode {
    match err {
        OptimizeError::NoFeasiblePlan { .. } | OptimizeError::CostOverflow { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::OptimizerConfig;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(OptimizerConfig::default()))
    }

    const EXAMPLE: &str = "2\n100 50\n2\n1 x 10\n2 y 5\n0\n1\n1 2 x y\n";

    #[tokio::test]
    async fn test_health() {
        let resp = health().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_optimize_text() {
        let out = optimize_text(
            State(state()),
            Query(TextParams::default()),
            EXAMPLE.to_string(),
        )
        .await
        .unwrap();
        assert_eq!(out, "(2 1 {1.x 2.y}) 525.00\n");
    }

    #[tokio::test]
    async fn test_optimize_text_explain() {
        let out = optimize_text(
            State(state()),
            Query(TextParams { explain: true }),
            EXAMPLE.to_string(),
        )
        .await
        .unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "(2 1 {1.x 2.y}) 525.00");
        assert_eq!(lines[1], "HashJoin [1.x = 2.y]");
        assert!(lines.last().unwrap().starts_with("cost=525.00 rows=500.00"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let err = optimize_text(
            State(state()),
            Query(TextParams::default()),
            "2\n10\n".to_string(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_no_feasible_plan_is_unprocessable() {
        let input = "2\n10 20\n1\n1 x 3\n0\n1\n1 2 x y\n";
        let err = optimize_text(State(state()), Query(TextParams::default()), input.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_cost_overflow_is_unprocessable() {
        let input = "2\n1e200 1e200\n0\n0\n0\n";
        let err = optimize_text(State(state()), Query(TextParams::default()), input.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.1.contains("overflows"), "{}", err.1);
    }

    #[tokio::test]
    async fn test_relation_limit_from_config() {
        let state = Arc::new(AppState::new(OptimizerConfig {
            max_relations: 1,
            ..OptimizerConfig::default()
        }));
        let err = optimize_text(State(state), Query(TextParams::default()), EXAMPLE.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains('2'), "{}", err.1);
    }
}
