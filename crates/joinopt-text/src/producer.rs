//! # Text Producer (Serialization)
//!
//! Turns a search result into text: the single result line of the reference
//! encoding, and a multi-line explain report for debugging.

use joinopt_core::memo::Memo;
use joinopt_core::plan::CostedPlan;
use std::fmt::Write;

/// `<rendered plan> <cost to 2 decimal places>`.
pub fn format_result(best: &CostedPlan) -> String {
    format!("{} {:.2}", best.plan, best.cost.total)
}

/// The result line followed by the plan tree and search statistics.
pub fn format_explain(best: &CostedPlan, memo: &Memo) -> String {
    let mut out = format_result(best);
    out.push('\n');
    out.push_str(&best.plan.display(0));
    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "cost={:.2} rows={:.2} memo_entries={} memo_infeasible={} memo_hits={}",
        best.cost.total,
        best.rows,
        memo.num_entries(),
        memo.num_infeasible(),
        memo.hits()
    );
    out
}
