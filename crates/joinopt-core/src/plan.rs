//! # Plan Representation
//!
//! A plan is a binary tree. Leaves are scans of a single relation with its filter
//! predicates; internal nodes are joins tagged with the physical method chosen for
//! them and, for hash joins, the predicate they join on.
//!
//! ## Bracket Rendering
//!
//! `Display` produces the compact form used on the output line:
//!
//! ```text
//! scan        <id+1><filter attrs concatenated>     e.g. 2ab
//! hash join   (<left> <right> {<a>.<attr> <b>.<attr>})
//! nested loop (<left> <right> )
//! cross       (<left> <right>)
//! ```
//!
//! The nested-loop form keeps the separator before its (empty) join clause while the
//! cross form has none. Existing fixtures depend on both spellings, so they are kept
//! distinct.

use crate::catalog::{FilterPredicate, JoinPredicate};
use crate::cost::Cost;
use crate::relation_set::{RelationId, RelationSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical join method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinMethod {
    /// Cartesian product in a query that has no join predicates at all.
    Cross,
    /// Cartesian product between two operands that no predicate connects.
    NestedLoop,
    /// Equi-join on a connecting predicate.
    Hash,
}

impl fmt::Display for JoinMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMethod::Cross => write!(f, "CrossJoin"),
            JoinMethod::NestedLoop => write!(f, "NestedLoopJoin"),
            JoinMethod::Hash => write!(f, "HashJoin"),
        }
    }
}

/// A node of the chosen join tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanNode {
    Scan {
        relation: RelationId,
        filters: Vec<FilterPredicate>,
    },
    Join {
        method: JoinMethod,
        /// Present exactly for hash joins.
        predicate: Option<JoinPredicate>,
        left: Box<PlanNode>,
        right: Box<PlanNode>,
    },
}

impl PlanNode {
    pub fn scan(relation: RelationId, filters: Vec<FilterPredicate>) -> Self {
        PlanNode::Scan { relation, filters }
    }

    pub fn join(method: JoinMethod, predicate: Option<JoinPredicate>, left: PlanNode, right: PlanNode) -> Self {
        PlanNode::Join {
            method,
            predicate,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Relations covered by this subtree.
    pub fn relations(&self) -> RelationSet {
        match self {
            PlanNode::Scan { relation, .. } => RelationSet::singleton(*relation),
            PlanNode::Join { left, right, .. } => left.relations().union(right.relations()),
        }
    }

    pub fn num_joins(&self) -> usize {
        match self {
            PlanNode::Scan { .. } => 0,
            PlanNode::Join { left, right, .. } => 1 + left.num_joins() + right.num_joins(),
        }
    }

    /// Indented, one-operator-per-line rendering for explain output.
    pub fn display(&self, indent: usize) -> String {
        let pad = "  ".repeat(indent);
        match self {
            PlanNode::Scan { relation, filters } => {
                if filters.is_empty() {
                    format!("{}Scan {}\n", pad, relation + 1)
                } else {
                    let attrs: Vec<_> = filters.iter().map(|p| p.attribute.as_str()).collect();
                    format!("{}Scan {} [filter: {}]\n", pad, relation + 1, attrs.join(", "))
                }
            }
            PlanNode::Join {
                method,
                predicate,
                left,
                right,
            } => {
                let mut out = match predicate {
                    Some(p) => format!(
                        "{}{} [{}.{} = {}.{}]\n",
                        pad,
                        method,
                        p.left + 1,
                        p.left_attribute,
                        p.right + 1,
                        p.right_attribute
                    ),
                    None => format!("{}{}\n", pad, method),
                };
                out.push_str(&left.display(indent + 1));
                out.push_str(&right.display(indent + 1));
                out
            }
        }
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanNode::Scan { relation, filters } => {
                write!(f, "{}", relation + 1)?;
                for p in filters {
                    write!(f, "{}", p.attribute)?;
                }
                Ok(())
            }
            PlanNode::Join {
                method,
                predicate,
                left,
                right,
            } => match (method, predicate) {
                (JoinMethod::Hash, Some(p)) => write!(f, "({} {} {{{}}})", left, right, p),
                (JoinMethod::Cross, _) => write!(f, "({} {})", left, right),
                _ => write!(f, "({} {} )", left, right),
            },
        }
    }
}

/// A plan together with its accumulated cost and estimated output rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostedPlan {
    pub plan: PlanNode,
    pub cost: Cost,
    pub rows: f64,
}
