//! # Relation Sets
//!
//! A `RelationSet` is the identity of a join unit during enumeration: an unordered,
//! non-empty set of relation ids. It is stored as a 64-bit mask, so two sets built
//! from the same relations in different orders are bit-for-bit equal and hash to
//! the same memo slot.
//!
//! ## Split Enumeration
//!
//! [`RelationSet::splits`] yields every ordered pair `(left, right)` of non-empty,
//! disjoint subsets whose union is the set. Left sides come out by increasing size
//! and, within one size, in lexicographic order over ascending relation ids (the
//! classic combinations order). The right side is always the complement. Both
//! `(A, B)` and `(B, A)` are produced because join costs are asymmetric.
//!
//! A set of `k` relations has `2^k - 2` ordered splits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, 0-based relation identifier.
pub type RelationId = usize;

/// Largest number of relations a `RelationSet` can hold.
pub const MAX_RELATIONS: usize = u64::BITS as usize;

/// Canonical bitmask of relation ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationSet(u64);

impl RelationSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn singleton(id: RelationId) -> Self {
        debug_assert!(id < MAX_RELATIONS, "relation id {} out of range", id);
        Self(1u64 << id)
    }

    /// The set `{0, 1, ..., count - 1}`.
    pub fn all(count: usize) -> Self {
        if count >= MAX_RELATIONS {
            Self(u64::MAX)
        } else {
            Self((1u64 << count) - 1)
        }
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, id: RelationId) -> bool {
        id < MAX_RELATIONS && self.0 & (1u64 << id) != 0
    }

    pub fn insert(&mut self, id: RelationId) {
        debug_assert!(id < MAX_RELATIONS, "relation id {} out of range", id);
        self.0 |= 1u64 << id;
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn is_disjoint(self, other: Self) -> bool {
        self.0 & other.0 == 0
    }

    /// Smallest relation id in the set.
    pub fn first(self) -> Option<RelationId> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as RelationId)
        }
    }

    /// Relation ids in ascending order.
    pub fn iter(self) -> RelationIter {
        RelationIter { remaining: self.0 }
    }

    /// All ordered `(left, right)` partitions into two non-empty halves.
    pub fn splits(self) -> Splits {
        Splits::new(self)
    }
}

impl FromIterator<RelationId> for RelationSet {
    fn from_iter<I: IntoIterator<Item = RelationId>>(iter: I) -> Self {
        let mut set = RelationSet::empty();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl fmt::Display for RelationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, "}}")
    }
}

/// Ascending iterator over the ids of a `RelationSet`.
pub struct RelationIter {
    remaining: u64,
}

impl Iterator for RelationIter {
    type Item = RelationId;

    fn next(&mut self) -> Option<RelationId> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.remaining.trailing_zeros() as RelationId;
        // Clear the lowest set bit.
        self.remaining &= self.remaining - 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for RelationIter {}

/// Iterator over the ordered two-way partitions of a `RelationSet`.
///
/// Walks left-side sizes `1..k` and, for each size, the index combinations
/// `indices[0] < indices[1] < ...` into the ascending element list.
pub struct Splits {
    set: RelationSet,
    elems: Vec<RelationId>,
    indices: Vec<usize>,
    size: usize,
}

impl Splits {
    fn new(set: RelationSet) -> Self {
        Self {
            set,
            elems: set.iter().collect(),
            indices: vec![0],
            size: 1,
        }
    }

    /// Move `indices` to the next combination, rolling over to the next size
    /// once the current one is exhausted.
    fn advance(&mut self) {
        let k = self.elems.len();
        let size = self.size;
        for i in (0..size).rev() {
            if self.indices[i] != i + k - size {
                self.indices[i] += 1;
                for j in i + 1..size {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return;
            }
        }
        self.size += 1;
        self.indices = (0..self.size).collect();
    }
}

impl Iterator for Splits {
    type Item = (RelationSet, RelationSet);

    fn next(&mut self) -> Option<Self::Item> {
        if self.size >= self.elems.len() {
            return None;
        }
        let left: RelationSet = self.indices.iter().map(|&i| self.elems[i]).collect();
        self.advance();
        Some((left, self.set.difference(left)))
    }
}
