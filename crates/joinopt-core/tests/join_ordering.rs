//! End-to-end join ordering tests over varied join graph shapes.
//!
//! ## Shapes
//! - 4-relation chain with shrinking relations
//! - 4-relation star (fact table + 3 dimensions, filtered dimensions)
//! - 4-relation query without join predicates (all cross products)
//! - Two disconnected components bridged by a nested loop
//!
//! ## What These Tests Verify
//! - The exact plan and cost string for each shape
//! - The memoized search agrees with an unmemoized brute-force enumeration
//! - Repeated runs produce byte-identical output

use joinopt_core::catalog::JoinQuery;
use joinopt_core::cost::{CostModel, TextbookCostModel};
use joinopt_core::plan::JoinMethod;
use joinopt_core::relation_set::RelationSet;
use joinopt_core::search::{optimize_query, SearchConfig};
use joinopt_core::stats;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run the search and return (plan, cost to 2 decimals).
fn optimize(query: &JoinQuery) -> (String, String) {
    let best = optimize_query(query, SearchConfig::default()).expect("query should have a plan");
    (best.plan.to_string(), format!("{:.2}", best.cost.total))
}

/// Cheapest (cost, rows) for `set`, recomputed from scratch for every subset.
fn brute_force(query: &JoinQuery, set: RelationSet) -> Option<(f64, f64)> {
    let model = TextbookCostModel;
    if set.len() == 1 {
        let id = set.first()?;
        let filters = query.filters_for(id);
        let rows = stats::filtered_rows(query.row_count(id), &filters, query.stats());
        return Some((model.scan_cost(rows, filters.len()).total, rows));
    }

    let mut best: Option<(f64, f64)> = None;
    for (left, right) in set.splits() {
        let (Some((lc, lr)), Some((rc, rr))) = (brute_force(query, left), brute_force(query, right)) else {
            continue;
        };
        let (method, rows) = if query.joins().is_empty() {
            (JoinMethod::Cross, stats::cross_rows(lr, rr))
        } else {
            match query.joins().iter().find(|p| p.connects(left, right)) {
                Some(p) => match stats::join_cardinality(p, query.stats()) {
                    Some(card) => (JoinMethod::Hash, stats::join_rows(lr, rr, card)),
                    None => continue,
                },
                None => (JoinMethod::NestedLoop, stats::cross_rows(lr, rr)),
            }
        };
        let cost = lc + rc + model.join_cost(method, lr, rr, rows).total;
        if best.map_or(true, |(bc, _)| cost < bc) {
            best = Some((cost, rows));
        }
    }
    best
}

fn assert_matches_brute_force(query: &JoinQuery) {
    let best = optimize_query(query, SearchConfig::default()).unwrap();
    let (cost, rows) = brute_force(query, query.all_relations()).unwrap();
    assert!(
        (best.cost.total - cost).abs() <= 1e-9 * cost.abs().max(1.0),
        "memoized {} vs brute force {}",
        best.cost.total,
        cost
    );
    assert_eq!(best.rows, rows);
}

fn chain() -> JoinQuery {
    JoinQuery::new([1000.0, 200.0, 50.0, 10.0])
        .with_cardinality(0, "a", 100)
        .with_cardinality(1, "a", 200)
        .with_cardinality(1, "b", 20)
        .with_cardinality(2, "b", 50)
        .with_cardinality(2, "c", 5)
        .with_cardinality(3, "c", 10)
        .with_join(0, 1, "a", "a")
        .with_join(1, 2, "b", "b")
        .with_join(2, 3, "c", "c")
}

fn star() -> JoinQuery {
    JoinQuery::new([100000.0, 100.0, 1000.0, 10.0])
        .with_cardinality(0, "d1", 100)
        .with_cardinality(1, "k", 100)
        .with_cardinality(0, "d2", 1000)
        .with_cardinality(2, "k", 1000)
        .with_cardinality(0, "d3", 10)
        .with_cardinality(3, "k", 10)
        .with_cardinality(1, "f", 4)
        .with_filter(1, "f")
        // No statistics for "g": the filter doubles the scan cost only.
        .with_filter(2, "g")
        .with_join(0, 1, "d1", "k")
        .with_join(0, 2, "d2", "k")
        .with_join(0, 3, "d3", "k")
}

fn all_cross() -> JoinQuery {
    JoinQuery::new([3.0, 7.0, 2.0, 5.0]).with_filter(0, "x")
}

fn two_components() -> JoinQuery {
    JoinQuery::new([100.0, 10.0, 40.0, 8.0])
        .with_cardinality(0, "a", 10)
        .with_cardinality(1, "a", 10)
        .with_cardinality(2, "b", 4)
        .with_cardinality(3, "b", 8)
        .with_join(0, 1, "a", "a")
        .with_join(2, 3, "b", "b")
}

// ===========================================================================
// Shapes
// ===========================================================================

#[test]
fn test_chain() {
    let (plan, cost) = optimize(&chain());
    assert_eq!(plan, "(((4 3 {3.c 4.c}) 2 {2.b 3.b}) 1 {1.a 2.a})");
    assert_eq!(cost, "4170.00");
}

#[test]
fn test_star_with_filtered_dimensions() {
    let (plan, cost) = optimize(&star());
    assert_eq!(plan, "(4 (3g (2f 1 {1.d1 2.k}) {1.d2 3.k}) {1.d3 4.k})");
    assert_eq!(cost, "338182.50");
}

#[test]
fn test_query_without_join_predicates() {
    let (plan, cost) = optimize(&all_cross());
    assert_eq!(plan, "((2 1x) (4 3))");
    assert_eq!(cost, "45.60");
}

#[test]
fn test_disconnected_components() {
    let query = two_components();
    let (plan, cost) = optimize(&query);
    assert_eq!(plan, "(1 (3 (4 2 ) {3.b 4.b}) {1.a 2.a})");
    assert_eq!(cost, "1886.00");

    let best = optimize_query(&query, SearchConfig::default()).unwrap();
    assert_eq!(best.rows, 4000.0);
}

// ===========================================================================
// Cross-checks
// ===========================================================================

#[test]
fn test_memoized_search_matches_brute_force() {
    for query in [chain(), star(), all_cross(), two_components()] {
        assert_matches_brute_force(&query);
    }
}

#[test]
fn test_five_relation_cycle_matches_brute_force() {
    let query = JoinQuery::new([500.0, 40.0, 3000.0, 12.0, 900.0])
        .with_cardinality(0, "a", 50)
        .with_cardinality(1, "a", 40)
        .with_cardinality(1, "b", 8)
        .with_cardinality(2, "b", 300)
        .with_cardinality(2, "c", 30)
        .with_cardinality(3, "c", 12)
        .with_cardinality(3, "d", 6)
        .with_cardinality(4, "d", 90)
        .with_cardinality(4, "e", 45)
        .with_cardinality(0, "e", 25)
        .with_cardinality(4, "z", 3)
        .with_filter(4, "z")
        .with_join(0, 1, "a", "a")
        .with_join(1, 2, "b", "b")
        .with_join(2, 3, "c", "c")
        .with_join(3, 4, "d", "d")
        .with_join(4, 0, "e", "e");
    assert_matches_brute_force(&query);
}

#[test]
fn test_repeated_runs_are_identical() {
    let query = star();
    let first = optimize(&query);
    for _ in 0..5 {
        assert_eq!(optimize(&query), first);
    }
}
