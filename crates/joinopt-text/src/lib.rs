//! # Reference Text Encoding
//!
//! This crate reads and writes the line-oriented text format used by existing
//! join-order fixtures, so the optimizer core never has to deal with files or
//! formatting.
//!
//! ## Module Overview
//!
//! - **`consumer`**: Parses the text encoding into a `JoinQuery` (deserialization).
//! - **`producer`**: Formats a `CostedPlan` as the `<plan> <cost>` result line, and
//!   as a longer explain report.

pub mod consumer;
pub mod producer;
