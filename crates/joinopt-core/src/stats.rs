//! # Cardinality Estimation
//!
//! Row estimates for intermediate results are derived bottom-up from base row
//! counts and the attribute statistics in the query.
//!
//! ## Derivation Formulas
//!
//! - **Filter**: `rows = base / V(attr)` for every filter whose attribute has a
//!   cardinality. Filters without statistics are skipped and leave the estimate
//!   unchanged. No rounding: fractional rows are allowed, since selectivity is
//!   treated as a probability.
//! - **Cross product**: `rows = |L| * |R|`.
//! - **Equi-join**: `rows = |L| * |R| / max(V(A.a), V(B.b))`. This is the standard
//!   containment assumption: the smaller domain is fully contained in the larger.

use crate::catalog::{AttributeStats, FilterPredicate, JoinPredicate};

/// Row count after applying `predicates` to a relation with `base` rows.
pub fn filtered_rows(base: f64, predicates: &[FilterPredicate], stats: &AttributeStats) -> f64 {
    predicates
        .iter()
        .filter_map(|p| stats.get(p.relation, &p.attribute))
        .fold(base, |rows, cardinality| rows / cardinality as f64)
}

pub fn cross_rows(left_rows: f64, right_rows: f64) -> f64 {
    left_rows * right_rows
}

/// Row count of an equi-join whose selectivity is `1 / join_cardinality`.
pub fn join_rows(left_rows: f64, right_rows: f64, join_cardinality: f64) -> f64 {
    (left_rows * right_rows) / join_cardinality
}

/// `max(V(A.a), V(B.b))` for a join predicate, or `None` if either side has no
/// statistics. A predicate without both cardinalities cannot be costed.
pub fn join_cardinality(predicate: &JoinPredicate, stats: &AttributeStats) -> Option<f64> {
    let left = stats.get(predicate.left, &predicate.left_attribute)?;
    let right = stats.get(predicate.right, &predicate.right_attribute)?;
    Some(left.max(right) as f64)
}
