//! # Cost Model
//!
//! This module defines the cost abstraction and the textbook cost formulas used to
//! compare join orders.
//!
//! ## Formulas
//!
//! With `L` and `R` the estimated rows of the left and right operands and `Res` the
//! estimated rows of the result:
//!
//! ```text
//! scan         = rows * 2                        (relation has filters)
//!              = rows * 1                        (no filters)
//! nested loop  = (L - 1) * R + Res * 0.1
//! hash join    = R * 1.5 + L * 3.5 + Res * 0.1
//! cross        = R * 0.2 + (L - 1) * R * 0.1
//! ```
//!
//! The constants are fixed. Plan costs compared across runs or against stored
//! fixtures are only meaningful if these exact values are used.
//!
//! ## Cost Accumulation
//!
//! Costs are **additive**: a join plan costs the sum of its two operands plus the
//! local cost of the join operator. The accumulation itself happens in the search;
//! the model only prices one operator at a time.

use crate::plan::JoinMethod;
use serde::{Deserialize, Serialize};

/// Cost is a single comparable value representing the estimated expense of a plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cost {
    /// The total cost. Lower is better. `f64::MAX` represents infinity
    /// (an infeasible or not-yet-costed plan).
    pub total: f64,
}

impl Cost {
    pub fn new(total: f64) -> Self {
        Self { total }
    }

    pub fn infinite() -> Self {
        Self { total: f64::MAX }
    }

    /// True for `infinite()` and for totals that overflowed to `inf` or became NaN.
    pub fn is_infinite(&self) -> bool {
        !(self.total < f64::MAX)
    }
}

impl std::ops::Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost::new(self.total + rhs.total)
    }
}

/// Epsilon-based equality to handle floating-point imprecision in cost comparisons.
impl PartialEq for Cost {
    fn eq(&self, other: &Self) -> bool {
        (self.total - other.total).abs() < f64::EPSILON
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.total.partial_cmp(&other.total)
    }
}

/// Prices individual operators.
pub trait CostModel: Send + Sync {
    /// Cost of reading a relation that yields `rows` after `filter_count` filters.
    fn scan_cost(&self, rows: f64, filter_count: usize) -> Cost;

    /// Local cost of joining operands of `left_rows` and `right_rows` into a
    /// result of `result_rows` with the given method.
    fn join_cost(&self, method: JoinMethod, left_rows: f64, right_rows: f64, result_rows: f64) -> Cost;
}

const SCAN_FACTOR: f64 = 1.0;
const FILTERED_SCAN_FACTOR: f64 = 2.0;
/// Per-row cost of materializing any join result.
const RESULT_FACTOR: f64 = 0.1;
const HASH_BUILD_FACTOR: f64 = 1.5;
const HASH_PROBE_FACTOR: f64 = 3.5;
const CROSS_RIGHT_FACTOR: f64 = 0.2;
const CROSS_LOOP_FACTOR: f64 = 0.1;

/// The fixed additive cost model.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextbookCostModel;

impl CostModel for TextbookCostModel {
    fn scan_cost(&self, rows: f64, filter_count: usize) -> Cost {
        let factor = if filter_count > 0 {
            FILTERED_SCAN_FACTOR
        } else {
            SCAN_FACTOR
        };
        Cost::new(rows * factor)
    }

    fn join_cost(&self, method: JoinMethod, left_rows: f64, right_rows: f64, result_rows: f64) -> Cost {
        let local = match method {
            // Every left row but the first rescans the right side.
            JoinMethod::NestedLoop => (left_rows - 1.0) * right_rows + result_rows * RESULT_FACTOR,
            // Build on the right, probe with the left.
            JoinMethod::Hash => {
                right_rows * HASH_BUILD_FACTOR + left_rows * HASH_PROBE_FACTOR + result_rows * RESULT_FACTOR
            }
            // Only used when the query has no join predicates at all; the result
            // size does not enter the formula.
            JoinMethod::Cross => {
                right_rows * CROSS_RIGHT_FACTOR + (left_rows - 1.0) * right_rows * CROSS_LOOP_FACTOR
            }
        };
        Cost::new(local)
    }
}
