//! # joinopt-core: Join Order Optimizer Core
//!
//! This crate picks the cheapest way to join a set of relations under a fixed,
//! additive cost model. It consumes a parsed [`catalog::JoinQuery`] and returns a
//! [`plan::CostedPlan`]: the chosen join tree, its estimated cost, and its
//! estimated output rows. It performs no I/O.
//!
//! ## Module Overview
//!
//! - **`catalog`**: The query model -- relations, row counts, attribute cardinalities,
//!   filter predicates, and join predicates.
//! - **`relation_set`**: Canonical subset identity and deterministic split enumeration.
//! - **`stats`**: Cardinality estimation for filters, cross products, and equi-joins.
//! - **`cost`**: The `Cost` type, the `CostModel` trait, and the textbook formulas.
//! - **`plan`**: Plan trees, join methods, and their text renderings.
//! - **`memo`**: Per-search cache of the best plan for each subset.
//! - **`search`**: The memoized split-enumeration search.
//! - **`error`**: Errors reported by validation and search.

pub mod catalog;
pub mod cost;
pub mod error;
pub mod memo;
pub mod plan;
pub mod relation_set;
pub mod search;
pub mod stats;
