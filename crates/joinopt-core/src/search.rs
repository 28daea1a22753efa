//! # Join Order Search
//!
//! This module implements the memoized, top-down dynamic program that picks the
//! cheapest bracketed join order and join-method assignment for a query.
//!
//! ## How It Works
//!
//! For a request on a relation set `S`:
//!
//! 1. **Scan**: if `S` holds a single relation, return its scan with its filters.
//!    Scans are built once when the search is created and are not memo entries.
//! 2. **Memo check**: if `S` was solved before, return the stored winner.
//! 3. **Splits**: otherwise try every ordered split of `S` into two non-empty halves
//!    (see [`RelationSet::splits`]), solve both halves recursively, price the join
//!    that combines them, and keep the cheapest. Ties keep the earlier split.
//!    Candidates are compared on cost and rows alone; the winner's tree is
//!    assembled from the memoized children once the loop is done.
//! 4. **Record**: store the winner (or the fact that there is none) under `S`.
//!
//! The enumeration ignores join-graph connectivity: disconnected halves are joined
//! by a cartesian product. This is the dominant cost of the search, `O(3^n)` split
//! evaluations for `n` relations, and the reason `SearchConfig::max_relations`
//! exists.
//!
//! ## Method Selection
//!
//! The join method for a split depends on the query as a whole:
//!
//! - **Query with join predicates**: the *first* declared predicate connecting the
//!   two halves decides. It is costed as a hash join with selectivity
//!   `1 / max(V(a), V(b))`; if either cardinality is missing the split is dropped
//!   rather than demoted. Halves that no predicate connects are combined by a
//!   nested loop over the full cartesian product.
//! - **Query without join predicates**: every split is a cross product priced with
//!   the dedicated cross formula, which differs from the nested-loop one.
//!
//! ## Infeasibility
//!
//! A subset whose every split was dropped is memoized as infeasible, and splits that
//! would use it are dropped in turn. Only when the full relation set ends up
//! infeasible does the search fail, with [`OptimizeError::NoFeasiblePlan`].

use crate::catalog::{JoinPredicate, JoinQuery};
use crate::cost::{Cost, CostModel, TextbookCostModel};
use crate::error::OptimizeError;
use crate::memo::{Memo, MemoEntry};
use crate::plan::{CostedPlan, JoinMethod, PlanNode};
use crate::relation_set::{RelationSet, MAX_RELATIONS};
use crate::stats;
use std::sync::Arc;
use tracing::{debug, trace};

/// Configuration knobs for the search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Queries with more relations are rejected up front. Capped at
    /// [`MAX_RELATIONS`] regardless of the configured value.
    pub max_relations: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_relations: 16 }
    }
}

/// How splits are turned into joins, fixed per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    /// The query has no join predicates; every join is a priced cross product.
    CrossOnly,
    /// Connected splits become hash joins, disconnected ones nested loops.
    PredicateDriven,
}

/// The join operator chosen for one split, before the operands are attached.
struct JoinStep<'q> {
    method: JoinMethod,
    predicate: Option<&'q JoinPredicate>,
    rows: f64,
    cost: Cost,
}

/// The join order search engine.
///
/// Owns the memo for exactly one query; create a new search per query.
pub struct JoinOrderSearch<'q> {
    /// Winners for every multi-relation subset solved so far.
    pub memo: Memo,
    query: &'q JoinQuery,
    cost_model: Arc<dyn CostModel>,
    config: SearchConfig,
    policy: SplitPolicy,
    /// Scan plans by relation id, built once up front.
    scans: Vec<CostedPlan>,
    /// Set when some candidate was dropped because its cost is not finite.
    overflowed: bool,
}

impl<'q> JoinOrderSearch<'q> {
    pub fn new(query: &'q JoinQuery, cost_model: Arc<dyn CostModel>, config: SearchConfig) -> Self {
        let policy = if query.joins().is_empty() {
            SplitPolicy::CrossOnly
        } else {
            SplitPolicy::PredicateDriven
        };
        let scans = query
            .relations()
            .iter()
            .map(|r| {
                let filters = query.filters_for(r.id);
                let rows = stats::filtered_rows(r.row_count, &filters, query.stats());
                let cost = cost_model.scan_cost(rows, filters.len());
                CostedPlan {
                    plan: PlanNode::scan(r.id, filters),
                    cost,
                    rows,
                }
            })
            .collect();
        Self {
            memo: Memo::new(),
            query,
            cost_model,
            config,
            policy,
            scans,
            overflowed: false,
        }
    }

    pub fn policy(&self) -> SplitPolicy {
        self.policy
    }

    /// Validate the query and find the cheapest plan over all of its relations.
    pub fn optimize(&mut self) -> Result<CostedPlan, OptimizeError> {
        self.query.validate()?;

        let count = self.query.num_relations();
        let limit = self.config.max_relations.min(MAX_RELATIONS);
        if count > limit {
            return Err(OptimizeError::TooManyRelations { count, limit });
        }

        debug!(
            "Starting join order search: relations={}, join_predicates={}, policy={:?}",
            count,
            self.query.joins().len(),
            self.policy
        );

        match self.solve(self.query.all_relations()) {
            Some(best) if best.cost.is_infinite() => {
                debug!("Search failed: cost of the only plan overflows");
                Err(OptimizeError::CostOverflow { relations: count })
            }
            Some(best) => {
                debug!(
                    "Search complete: cost={:.2}, rows={:.2}, memo_entries={}, memo_hits={}",
                    best.cost.total,
                    best.rows,
                    self.memo.num_entries(),
                    self.memo.hits()
                );
                Ok(best)
            }
            None if self.overflowed => {
                debug!("Search failed: every remaining candidate cost overflows");
                Err(OptimizeError::CostOverflow { relations: count })
            }
            None => {
                debug!(
                    "Search failed: no feasible plan, infeasible_subsets={}",
                    self.memo.num_infeasible()
                );
                Err(OptimizeError::NoFeasiblePlan { relations: count })
            }
        }
    }

    /// Best plan for `set`, or `None` if the set has no feasible plan.
    ///
    /// The query must have been validated.
    pub(crate) fn solve(&mut self, set: RelationSet) -> Option<CostedPlan> {
        self.summary(set)?;
        self.plan_for(set)
    }

    /// Cost and output rows of the best plan for `set`, solving it on first use.
    /// Only the memo is consulted afterwards; no plan tree is copied.
    fn summary(&mut self, set: RelationSet) -> Option<(Cost, f64)> {
        if set.len() == 1 {
            let scan = self.scans.get(set.first()?)?;
            return Some((scan.cost, scan.rows));
        }

        if let Some(entry) = self.memo.lookup(set) {
            return entry.plan().map(|p| (p.cost, p.rows));
        }

        let best = self.best_split(set);
        if best.is_none() {
            debug!("No feasible split for relation set {}", set);
        }
        let summary = best.as_ref().map(|p| (p.cost, p.rows));
        self.memo.insert(set, MemoEntry::from(best));
        summary
    }

    /// Copy of the stored plan for an already solved `set`.
    fn plan_for(&self, set: RelationSet) -> Option<CostedPlan> {
        if set.len() == 1 {
            return self.scans.get(set.first()?).cloned();
        }
        self.memo.best_plan(set).cloned()
    }

    fn best_split(&mut self, set: RelationSet) -> Option<CostedPlan> {
        let mut best: Option<(RelationSet, RelationSet, JoinStep<'q>)> = None;
        let mut best_cost = Cost::infinite();

        for (left_set, right_set) in set.splits() {
            let Some((left_cost, left_rows)) = self.summary(left_set) else {
                continue;
            };
            let Some((right_cost, right_rows)) = self.summary(right_set) else {
                continue;
            };
            let Some(step) = self.join_step(left_set, right_set, left_rows, right_rows) else {
                trace!("  Dropping split {} | {}: join cardinality unavailable", left_set, right_set);
                continue;
            };

            let cost = left_cost + right_cost + step.cost;
            if cost.is_infinite() {
                trace!("  Dropping split {} | {}: cost overflows", left_set, right_set);
                self.overflowed = true;
                continue;
            }
            if cost.total < best_cost.total {
                trace!(
                    "  New best for {}: {} | {} via {} cost={:.2}",
                    set,
                    left_set,
                    right_set,
                    step.method,
                    cost.total
                );
                best_cost = cost;
                best = Some((left_set, right_set, step));
            }
        }

        let (left_set, right_set, step) = best?;
        let left = self.plan_for(left_set)?;
        let right = self.plan_for(right_set)?;
        Some(CostedPlan {
            plan: PlanNode::join(step.method, step.predicate.cloned(), left.plan, right.plan),
            cost: best_cost,
            rows: step.rows,
        })
    }

    /// Pick and price the join combining `left` and `right`, or `None` if the
    /// split cannot be costed.
    fn join_step(
        &self,
        left: RelationSet,
        right: RelationSet,
        left_rows: f64,
        right_rows: f64,
    ) -> Option<JoinStep<'q>> {
        let query: &'q JoinQuery = self.query;
        let (method, predicate, rows) = match self.policy {
            SplitPolicy::CrossOnly => (JoinMethod::Cross, None, stats::cross_rows(left_rows, right_rows)),
            SplitPolicy::PredicateDriven => match query.joins().iter().find(|p| p.connects(left, right)) {
                Some(p) => {
                    let cardinality = stats::join_cardinality(p, query.stats())?;
                    let rows = stats::join_rows(left_rows, right_rows, cardinality);
                    (JoinMethod::Hash, Some(p), rows)
                }
                None => (JoinMethod::NestedLoop, None, stats::cross_rows(left_rows, right_rows)),
            },
        };
        let cost = self.cost_model.join_cost(method, left_rows, right_rows, rows);
        Some(JoinStep {
            method,
            predicate,
            rows,
            cost,
        })
    }
}

/// Optimize `query` with the textbook cost model and a fresh memo.
pub fn optimize_query(query: &JoinQuery, config: SearchConfig) -> Result<CostedPlan, OptimizeError> {
    JoinOrderSearch::new(query, Arc::new(TextbookCostModel), config).optimize()
}
