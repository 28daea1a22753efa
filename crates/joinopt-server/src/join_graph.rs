//! # Join-Graph Optimization Endpoint
//!
//! A JSON protocol for callers that already hold their query as structured data
//! and would rather not render the line-oriented text encoding. It carries the
//! same information:
//!
//! - **Relations**: row count, per-attribute distinct-value counts, and the
//!   attributes that carry a filter
//! - **Joins**: equi-join conditions between pairs of relations
//!
//! Relation indices in this protocol are 0-based positions in `relations`.
//!
//! ## Wire Protocol
//!
//! - Request: `POST /optimize/join-graph` with JSON body (`JoinGraphRequest`)
//! - Response: JSON body (`JoinGraphResponse`) with the rendered plan, its cost,
//!   and the join tree

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use joinopt_core::catalog::{JoinPredicate, JoinQuery};
use joinopt_core::plan::PlanNode;
use joinopt_core::relation_set::RelationId;

use crate::routes::run_optimization;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// JSON wire-protocol types
// ---------------------------------------------------------------------------

/// Request body for `POST /optimize/join-graph`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGraphRequest {
    pub relations: Vec<RelationInfo>,
    /// Equi-join conditions. A request without joins is optimized with cross
    /// products only.
    #[serde(default)]
    pub joins: Vec<JoinEdge>,
}

/// A relation in the join graph with its statistics.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationInfo {
    /// Estimated row count before filters.
    pub row_count: f64,
    #[serde(default)]
    pub attributes: Vec<AttributeInfo>,
    /// Attributes with a filter predicate on this relation.
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeInfo {
    pub name: String,
    /// Number of distinct values.
    pub cardinality: u64,
}

/// An equi-join edge between two relations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEdge {
    pub left_relation: RelationId,
    pub right_relation: RelationId,
    pub left_attribute: String,
    pub right_attribute: String,
}

/// Response body from the join-graph optimization endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGraphResponse {
    /// The plan in the compact rendering used by the text encoding.
    pub plan: String,
    pub cost: f64,
    /// Estimated output rows of the whole plan.
    pub rows: f64,
    pub tree: JoinTreeNode,
    /// Number of subsets the search memoized.
    pub memo_entries: usize,
}

/// A node in the optimized join tree.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JoinTreeNode {
    /// A scan of one relation, by 0-based index.
    Leaf {
        relation: RelationId,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        filters: Vec<String>,
    },
    Join {
        method: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        condition: Option<JoinCondition>,
        left: Box<JoinTreeNode>,
        right: Box<JoinTreeNode>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCondition {
    pub left_relation: RelationId,
    pub left_attribute: String,
    pub right_relation: RelationId,
    pub right_attribute: String,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /optimize/join-graph — pick a join order for a JSON join graph.
pub async fn optimize_join_graph(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JoinGraphRequest>,
) -> Result<Json<JoinGraphResponse>, (StatusCode, String)> {
    if req.relations.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Request must contain at least one relation".to_string(),
        ));
    }

    let query = build_query(&req);
    let (best, memo) = run_optimization(state, query).await?;

    Ok(Json(JoinGraphResponse {
        plan: best.plan.to_string(),
        cost: best.cost.total,
        rows: best.rows,
        tree: plan_to_tree(&best.plan),
        memo_entries: memo.num_entries(),
    }))
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Build a `JoinQuery` from the request. Out-of-range relation indices are kept
/// and rejected later by query validation.
fn build_query(req: &JoinGraphRequest) -> JoinQuery {
    let mut query = JoinQuery::new(req.relations.iter().map(|r| r.row_count));

    for (id, rel) in req.relations.iter().enumerate() {
        for attr in &rel.attributes {
            query.add_cardinality(id, attr.name.as_str(), attr.cardinality);
        }
        for filter in &rel.filters {
            query.add_filter(id, filter.as_str());
        }
    }

    for edge in &req.joins {
        query.add_join(JoinPredicate::new(
            edge.left_relation,
            edge.right_relation,
            edge.left_attribute.as_str(),
            edge.right_attribute.as_str(),
        ));
    }

    query
}

fn plan_to_tree(plan: &PlanNode) -> JoinTreeNode {
    match plan {
        PlanNode::Scan { relation, filters } => JoinTreeNode::Leaf {
            relation: *relation,
            filters: filters.iter().map(|f| f.attribute.clone()).collect(),
        },
        PlanNode::Join {
            method,
            predicate,
            left,
            right,
        } => JoinTreeNode::Join {
            method: method.to_string(),
            condition: predicate.as_ref().map(|p| JoinCondition {
                left_relation: p.left,
                left_attribute: p.left_attribute.clone(),
                right_relation: p.right,
                right_attribute: p.right_attribute.clone(),
            }),
            left: Box::new(plan_to_tree(left)),
            right: Box::new(plan_to_tree(right)),
        },
    }
}
