//! # Query Model
//!
//! The query model is the optimizer's only input: a fixed list of relations with
//! base row counts, a table of per-attribute distinct-value counts, single-relation
//! filter predicates, and equality join predicates between pairs of relations.
//!
//! ## Construction
//!
//! `JoinQuery` is built once, by the text reader, the HTTP layer, or a test, and is
//! read-only while the search runs. Builders come in two flavours, matching how
//! callers hold the value:
//!
//! - `with_*` consume and return `self` for fluent construction in tests.
//! - `add_*` take `&mut self` for loops that read records one at a time.
//!
//! Builders never fail. Relation ids are checked by [`JoinQuery::validate`], which
//! the search runs before touching any statistics.
//!
//! ## Attribute Statistics
//!
//! Cardinalities are keyed by `(relation, attribute)`. A lookup may legitimately
//! miss: filters on an attribute without statistics do not reduce the row estimate,
//! and a join predicate without statistics on both sides cannot be costed as a hash
//! join.

use crate::error::OptimizeError;
use crate::relation_set::{RelationId, RelationSet, MAX_RELATIONS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A base relation and its row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub row_count: f64,
}

/// Single-relation selection on one attribute. Selectivity is `1 / cardinality`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub relation: RelationId,
    pub attribute: String,
}

impl FilterPredicate {
    pub fn new(relation: RelationId, attribute: impl Into<String>) -> Self {
        Self {
            relation,
            attribute: attribute.into(),
        }
    }
}

/// Equality join `left.left_attribute = right.right_attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinPredicate {
    pub left: RelationId,
    pub right: RelationId,
    pub left_attribute: String,
    pub right_attribute: String,
}

impl JoinPredicate {
    pub fn new(
        left: RelationId,
        right: RelationId,
        left_attribute: impl Into<String>,
        right_attribute: impl Into<String>,
    ) -> Self {
        Self {
            left,
            right,
            left_attribute: left_attribute.into(),
            right_attribute: right_attribute.into(),
        }
    }

    /// True if one side of the predicate lies in `a` and the other in `b`,
    /// in either orientation.
    pub fn connects(&self, a: RelationSet, b: RelationSet) -> bool {
        (a.contains(self.left) && b.contains(self.right))
            || (a.contains(self.right) && b.contains(self.left))
    }
}

/// Renders as `<left+1>.<attr> <right+1>.<attr>`, the body of a hash join clause.
impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} {}.{}",
            self.left + 1,
            self.left_attribute,
            self.right + 1,
            self.right_attribute
        )
    }
}

/// Distinct-value counts keyed by `(relation, attribute)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeStats {
    cardinalities: HashMap<RelationId, HashMap<String, u64>>,
}

impl AttributeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cardinality. A later entry for the same key replaces the earlier one.
    pub fn insert(&mut self, relation: RelationId, attribute: impl Into<String>, cardinality: u64) {
        self.cardinalities
            .entry(relation)
            .or_default()
            .insert(attribute.into(), cardinality);
    }

    pub fn get(&self, relation: RelationId, attribute: &str) -> Option<u64> {
        self.cardinalities
            .get(&relation)
            .and_then(|attrs| attrs.get(attribute))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.cardinalities.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (RelationId, &str, u64)> {
        self.cardinalities.iter().flat_map(|(&relation, attrs)| {
            attrs
                .iter()
                .map(move |(attr, &card)| (relation, attr.as_str(), card))
        })
    }
}

/// Immutable description of a join query and its statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinQuery {
    relations: Vec<Relation>,
    stats: AttributeStats,
    /// Declaration order is preserved; it fixes the rendering order of a scan's filters.
    filters: Vec<FilterPredicate>,
    /// Declaration order is preserved; the first connecting predicate wins.
    joins: Vec<JoinPredicate>,
}

impl JoinQuery {
    /// Create a query over relations `0..row_counts.len()`.
    pub fn new(row_counts: impl IntoIterator<Item = f64>) -> Self {
        let relations = row_counts
            .into_iter()
            .enumerate()
            .map(|(id, row_count)| Relation { id, row_count })
            .collect();
        Self {
            relations,
            ..Self::default()
        }
    }

    pub fn with_cardinality(mut self, relation: RelationId, attribute: &str, cardinality: u64) -> Self {
        self.add_cardinality(relation, attribute, cardinality);
        self
    }

    pub fn with_filter(mut self, relation: RelationId, attribute: &str) -> Self {
        self.add_filter(relation, attribute);
        self
    }

    pub fn with_join(mut self, left: RelationId, right: RelationId, left_attr: &str, right_attr: &str) -> Self {
        self.add_join(JoinPredicate::new(left, right, left_attr, right_attr));
        self
    }

    pub fn add_cardinality(&mut self, relation: RelationId, attribute: impl Into<String>, cardinality: u64) {
        self.stats.insert(relation, attribute, cardinality);
    }

    pub fn add_filter(&mut self, relation: RelationId, attribute: impl Into<String>) {
        self.filters.push(FilterPredicate::new(relation, attribute));
    }

    pub fn add_join(&mut self, predicate: JoinPredicate) {
        self.joins.push(predicate);
    }

    pub fn num_relations(&self) -> usize {
        self.relations.len()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Panics if `relation` is out of range; call [`JoinQuery::validate`] first.
    pub fn row_count(&self, relation: RelationId) -> f64 {
        self.relations[relation].row_count
    }

    pub fn all_relations(&self) -> RelationSet {
        RelationSet::all(self.relations.len())
    }

    pub fn stats(&self) -> &AttributeStats {
        &self.stats
    }

    pub fn filters(&self) -> &[FilterPredicate] {
        &self.filters
    }

    /// Filters on one relation, in declaration order.
    pub fn filters_for(&self, relation: RelationId) -> Vec<FilterPredicate> {
        self.filters
            .iter()
            .filter(|p| p.relation == relation)
            .cloned()
            .collect()
    }

    pub fn joins(&self) -> &[JoinPredicate] {
        &self.joins
    }

    /// Check that every id is in range and every number is usable.
    ///
    /// Row counts must be finite and non-negative; cardinalities are divisors and
    /// must be positive. Joins whose two sides name the same relation are accepted
    /// and never connect a split.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        let count = self.relations.len();
        if count == 0 {
            return Err(OptimizeError::EmptyQuery);
        }
        let check = |relation: RelationId, context: &'static str| {
            if relation < count && relation < MAX_RELATIONS {
                Ok(())
            } else {
                Err(OptimizeError::UnknownRelation {
                    relation,
                    count,
                    context,
                })
            }
        };

        for rel in &self.relations {
            if !rel.row_count.is_finite() || rel.row_count < 0.0 {
                return Err(OptimizeError::InvalidStatistics {
                    relation: rel.id,
                    reason: format!("row count {} is not a non-negative number", rel.row_count),
                });
            }
        }
        for (relation, attribute, cardinality) in self.stats.iter() {
            check(relation, "attribute statistic")?;
            if cardinality == 0 {
                return Err(OptimizeError::InvalidStatistics {
                    relation,
                    reason: format!("cardinality of '{}' is zero", attribute),
                });
            }
        }
        for filter in &self.filters {
            check(filter.relation, "filter predicate")?;
        }
        for join in &self.joins {
            check(join.left, "join predicate")?;
            check(join.right, "join predicate")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_preserve_declaration_order() {
        let query = JoinQuery::new([10.0, 20.0])
            .with_filter(1, "b")
            .with_filter(0, "z")
            .with_filter(1, "a");
        let names: Vec<_> = query.filters_for(1).into_iter().map(|p| p.attribute).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(query.row_count(1), 20.0);
        assert_eq!(query.all_relations(), RelationSet::all(2));
    }

    #[test]
    fn test_stats_lookup_and_override() {
        let mut stats = AttributeStats::new();
        stats.insert(0, "x", 10);
        stats.insert(0, "x", 12);
        stats.insert(1, "x", 3);
        assert_eq!(stats.get(0, "x"), Some(12));
        assert_eq!(stats.get(1, "x"), Some(3));
        assert_eq!(stats.get(1, "y"), None);
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn test_join_predicate_connects_both_orientations() {
        let p = JoinPredicate::new(0, 2, "a", "b");
        let left: RelationSet = [0, 1].into_iter().collect();
        let right = RelationSet::singleton(2);
        assert!(p.connects(left, right));
        assert!(p.connects(right, left));
        assert!(!p.connects(left, RelationSet::singleton(3)));
        assert_eq!(p.to_string(), "1.a 3.b");
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert_eq!(JoinQuery::new(Vec::<f64>::new()).validate(), Err(OptimizeError::EmptyQuery));

        let err = JoinQuery::new([1.0]).with_join(0, 1, "a", "b").validate();
        assert!(matches!(err, Err(OptimizeError::UnknownRelation { relation: 1, .. })));

        let err = JoinQuery::new([1.0]).with_cardinality(0, "a", 0).validate();
        assert!(matches!(err, Err(OptimizeError::InvalidStatistics { relation: 0, .. })));

        let err = JoinQuery::new([-1.0]).validate();
        assert!(matches!(err, Err(OptimizeError::InvalidStatistics { .. })));

        assert!(JoinQuery::new([0.0, 5.0]).with_filter(1, "a").validate().is_ok());
    }
}
