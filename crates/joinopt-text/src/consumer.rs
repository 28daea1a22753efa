//! # Text Consumer (Deserialization)
//!
//! This module reads the reference line-oriented encoding of a join query into a
//! [`JoinQuery`]. It is the ingestion step in front of the search:
//!
//! ```text
//! input file / request body
//!   -> consumer::parse_query()
//!   -> JoinQuery
//!   -> JoinOrderSearch
//!   -> CostedPlan
//!   -> producer::format_result()
//!   -> "<plan> <cost>"
//! ```
//!
//! ## Format
//!
//! ```text
//! <relation count n>
//! <row count 1> ... <row count n>
//! <statistic count>
//! <relation> <attribute> <cardinality>        (repeated)
//! <filter count>
//! <relation> <attribute>                      (repeated)
//! <join count>
//! <relation a> <relation b> <attr a> <attr b> (repeated)
//! ```
//!
//! Relation numbers in the text are 1-based; the query model is 0-based.
//!
//! ## Error Handling
//!
//! Any deviation from the layout is fatal and reported as a [`ParseError`] carrying
//! the 1-based line number: a missing line, a wrong number of fields, a value that
//! does not parse, a relation number outside `1..=n`, or non-blank text after the
//! last join predicate.

use joinopt_core::catalog::{JoinPredicate, JoinQuery};
use joinopt_core::relation_set::RelationId;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Parse a query in the reference text encoding.
pub fn parse_query(input: &str) -> Result<JoinQuery, ParseError> {
    let mut reader = LineReader::new(input);

    let count: usize = reader.single("relation count")?;
    let (line, fields) = reader.fields("row counts", count)?;
    let row_counts = fields
        .iter()
        .map(|f| parse_row_count(line, f))
        .collect::<Result<Vec<_>, _>>()?;
    let mut query = JoinQuery::new(row_counts);

    let num_stats: usize = reader.single("attribute statistic count")?;
    for _ in 0..num_stats {
        let (line, f) = reader.fields("attribute statistic", 3)?;
        let relation = parse_relation(line, f[0], count)?;
        let cardinality: u64 = parse_field(line, "cardinality", f[2])?;
        if cardinality == 0 {
            return Err(ParseError::InvalidValue {
                line,
                field: "cardinality",
                value: f[2].to_string(),
            });
        }
        query.add_cardinality(relation, f[1], cardinality);
    }

    let num_filters: usize = reader.single("filter predicate count")?;
    for _ in 0..num_filters {
        let (line, f) = reader.fields("filter predicate", 2)?;
        let relation = parse_relation(line, f[0], count)?;
        query.add_filter(relation, f[1]);
    }

    let num_joins: usize = reader.single("join predicate count")?;
    for _ in 0..num_joins {
        let (line, f) = reader.fields("join predicate", 4)?;
        let left = parse_relation(line, f[0], count)?;
        let right = parse_relation(line, f[1], count)?;
        query.add_join(JoinPredicate::new(left, right, f[2], f[3]));
    }

    reader.finish()?;

    debug!(
        "Parsed query: relations={}, statistics={}, filters={}, joins={}",
        query.num_relations(),
        query.stats().len(),
        query.filters().len(),
        query.joins().len()
    );
    Ok(query)
}

/// Walks the input one line at a time, tracking 1-based line numbers.
struct LineReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    line: usize,
}

impl<'a> LineReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().enumerate(),
            line: 0,
        }
    }

    /// The next line split on whitespace, which must have exactly `count` fields.
    fn fields(&mut self, expected: &'static str, count: usize) -> Result<(usize, Vec<&'a str>), ParseError> {
        let Some((idx, text)) = self.lines.next() else {
            return Err(ParseError::UnexpectedEof {
                line: self.line + 1,
                expected,
            });
        };
        self.line = idx + 1;
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != count {
            return Err(ParseError::FieldCount {
                line: self.line,
                expected,
                count,
                found: fields.len(),
            });
        }
        Ok((self.line, fields))
    }

    /// A line holding exactly one number.
    fn single<T: FromStr>(&mut self, expected: &'static str) -> Result<T, ParseError> {
        let (line, f) = self.fields(expected, 1)?;
        parse_field(line, expected, f[0])
    }

    /// Only blank lines may follow the last record.
    fn finish(mut self) -> Result<(), ParseError> {
        match self.lines.find(|(_, text)| !text.trim().is_empty()) {
            Some((idx, _)) => Err(ParseError::TrailingInput { line: idx + 1 }),
            None => Ok(()),
        }
    }
}

fn parse_field<T: FromStr>(line: usize, field: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        line,
        field,
        value: value.to_string(),
    })
}

fn parse_row_count(line: usize, value: &str) -> Result<f64, ParseError> {
    let rows: f64 = parse_field(line, "row count", value)?;
    if !rows.is_finite() || rows < 0.0 {
        return Err(ParseError::InvalidValue {
            line,
            field: "row count",
            value: value.to_string(),
        });
    }
    Ok(rows)
}

/// Convert a 1-based relation number into a relation id.
fn parse_relation(line: usize, value: &str, count: usize) -> Result<RelationId, ParseError> {
    let number: usize = parse_field(line, "relation number", value)?;
    if number == 0 || number > count {
        return Err(ParseError::RelationOutOfRange { line, number, count });
    }
    Ok(number - 1)
}

/// Errors that can occur while reading the text encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEof { line: usize, expected: &'static str },
    #[error("line {line}: expected {expected} with {count} field(s), found {found}")]
    FieldCount {
        line: usize,
        expected: &'static str,
        count: usize,
        found: usize,
    },
    #[error("line {line}: invalid {field} '{value}'")]
    InvalidValue {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: relation {number} is outside 1..={count}")]
    RelationOutOfRange { line: usize, number: usize, count: usize },
    #[error("line {line}: unexpected input after the last join predicate")]
    TrailingInput { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_query() {
        let query = parse_query("2\n100 50\n2\n1 x 10\n2 y 5\n0\n1\n1 2 x y\n").unwrap();
        assert_eq!(query.num_relations(), 2);
        assert_eq!(query.row_count(0), 100.0);
        assert_eq!(query.stats().get(0, "x"), Some(10));
        assert_eq!(query.stats().get(1, "y"), Some(5));
        assert!(query.filters().is_empty());
        assert_eq!(query.joins(), &[JoinPredicate::new(0, 1, "x", "y")]);
    }

    #[test]
    fn test_filters_keep_declaration_order() {
        let query = parse_query("2\n1 1\n0\n3\n2 b\n1 q\n2 a\n0\n").unwrap();
        let attrs: Vec<_> = query.filters_for(1).into_iter().map(|p| p.attribute).collect();
        assert_eq!(attrs, vec!["b", "a"]);
    }

    #[test]
    fn test_tolerates_crlf_and_trailing_blank_lines() {
        let query = parse_query("1\r\n7\r\n0\r\n0\r\n0\r\n\r\n   \n").unwrap();
        assert_eq!(query.row_count(0), 7.0);
    }

    #[test]
    fn test_missing_line() {
        let err = parse_query("2\n100 50\n0\n0\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedEof {
                line: 5,
                expected: "join predicate count"
            }
        );
    }

    #[test]
    fn test_wrong_field_count() {
        let err = parse_query("3\n1 2\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldCount {
                line: 2,
                expected: "row counts",
                count: 3,
                found: 2
            }
        );
        let err = parse_query("1\n5\n1\n1 x\n").unwrap_err();
        assert!(matches!(err, ParseError::FieldCount { line: 4, .. }));
    }

    #[test]
    fn test_invalid_values() {
        let err = parse_query("two\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { line: 1, .. }));

        let err = parse_query("1\n-5\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { line: 2, field: "row count", .. }));

        let err = parse_query("1\n5\n1\n1 x 0\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { line: 4, field: "cardinality", .. }));
    }

    #[test]
    fn test_relation_out_of_range() {
        let err = parse_query("2\n1 1\n0\n0\n1\n1 3 a b\n").unwrap_err();
        assert_eq!(err, ParseError::RelationOutOfRange { line: 6, number: 3, count: 2 });
        let err = parse_query("2\n1 1\n0\n1\n0 a\n").unwrap_err();
        assert!(matches!(err, ParseError::RelationOutOfRange { number: 0, .. }));
    }

    #[test]
    fn test_trailing_input() {
        let err = parse_query("1\n5\n0\n0\n0\n\nextra\n").unwrap_err();
        assert_eq!(err, ParseError::TrailingInput { line: 7 });
        assert_eq!(err.to_string(), "line 7: unexpected input after the last join predicate");
    }
}
