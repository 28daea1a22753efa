//! Errors reported by the optimizer core.

use crate::relation_set::RelationId;
use thiserror::Error;

/// Reasons a query cannot be optimized.
///
/// A missing cardinality for a candidate hash join is not an error; that split is
/// simply excluded. `NoFeasiblePlan` is only returned when the exclusions leave the
/// full relation set without any plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("query has no relations")]
    EmptyQuery,
    #[error("query has {count} relations, more than the limit of {limit}")]
    TooManyRelations { count: usize, limit: usize },
    #[error("{context} references relation id {relation}, but the query has {count} relations")]
    UnknownRelation {
        relation: RelationId,
        count: usize,
        context: &'static str,
    },
    #[error("invalid statistics for relation id {relation}: {reason}")]
    InvalidStatistics { relation: RelationId, reason: String },
    #[error("no feasible join plan for {relations} relations: every split needs a missing join cardinality")]
    NoFeasiblePlan { relations: usize },
    /// Row estimates grew past the range of `f64`, so no candidate has a finite cost.
    #[error("estimated cost overflows for every join plan of {relations} relations")]
    CostOverflow { relations: usize },
}
