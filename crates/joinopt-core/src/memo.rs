//! # Memo Table
//!
//! The memo records, for every multi-relation subset already solved, the winning
//! plan with its cost and row estimate. It is what turns the exponential split
//! enumeration into dynamic programming: each subset is solved once and every
//! later request for it is a lookup.
//!
//! Keys are canonical `RelationSet`s, so the same subset reached through different
//! split paths always hits the same entry.
//!
//! A memo belongs to one search. Nothing is shared between queries.

use crate::plan::CostedPlan;
use crate::relation_set::RelationSet;
use std::collections::HashMap;

/// Outcome of solving one subset.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoEntry {
    Planned(CostedPlan),
    /// No split of the subset could be costed: each needed a missing join
    /// cardinality, an infeasible operand, or overflowed.
    Infeasible,
}

impl MemoEntry {
    pub fn plan(&self) -> Option<&CostedPlan> {
        match self {
            MemoEntry::Planned(p) => Some(p),
            MemoEntry::Infeasible => None,
        }
    }
}

impl From<Option<CostedPlan>> for MemoEntry {
    fn from(plan: Option<CostedPlan>) -> Self {
        plan.map_or(MemoEntry::Infeasible, MemoEntry::Planned)
    }
}

#[derive(Debug, Default)]
pub struct Memo {
    entries: HashMap<RelationSet, MemoEntry>,
    hits: usize,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a solved subset, counting a hit when found.
    pub fn lookup(&mut self, set: RelationSet) -> Option<&MemoEntry> {
        let entry = self.entries.get(&set);
        if entry.is_some() {
            self.hits += 1;
        }
        entry
    }

    /// Read an entry without counting it as a hit.
    pub fn get(&self, set: RelationSet) -> Option<&MemoEntry> {
        self.entries.get(&set)
    }

    pub fn best_plan(&self, set: RelationSet) -> Option<&CostedPlan> {
        self.entries.get(&set).and_then(MemoEntry::plan)
    }

    pub fn insert(&mut self, set: RelationSet, entry: MemoEntry) {
        self.entries.insert(set, entry);
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn num_infeasible(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, MemoEntry::Infeasible))
            .count()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}
