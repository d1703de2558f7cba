//! # Stash's tag query syntax
//!
//! `stash-syntax` turns the filter language typed into the archive search box
//! into a structured AST. The language mixes booru-style tag lists with typed
//! field filters:
//!
//! - bare words are tags (`long_hair`, `samus_aran_(metroid)`), `*` is a
//!   wildcard and `-`, `!` or `not:` exclude;
//! - `field:value` filters compare a column (`score:>10`, `size:5mb<`,
//!   `created_at:2023-11-14`, `type:png`), with the comparison glyph allowed
//!   on either side of the value;
//! - juxtaposition is AND, `|` is OR, and spaced parentheses group;
//! - `sort:` and `per-page:` are presentation directives, pulled out by
//!   [`extract_metadata`] before parsing.
//!
//! ## Example
//! ```
//! use stash_syntax::{extract_metadata, parse_query, Field, Node, SortOrder};
//!
//! let (clean, metadata) = extract_metadata("cat score:>10 sort:score-desc");
//! assert_eq!(clean, "cat score:>10");
//! assert_eq!(metadata.sort_order, Some(SortOrder::Desc));
//!
//! let query = parse_query(&clean).unwrap();
//! if let Node::And(parts) = &query.node {
//!     assert!(matches!(&parts[0], Node::Filter(filter) if filter.field == Field::Tag));
//!     assert!(matches!(&parts[1], Node::Filter(filter) if filter.field == Field::Score));
//! }
//! ```

mod ast;
mod error;
mod filter;
mod metadata;
mod parser;
mod tokenizer;

pub use ast::{ComparisonOp, Field, FieldKind, Filter, Node, Operator, Value};
pub use error::ParseError;
pub use filter::{flexible_operator, interpret, parse_date, parse_size, size_unit_multiplier};
pub use metadata::{QueryMetadata, SortOrder, extract_metadata, parse_sort_value, sort_alias};
pub use parser::parse_tokens;
pub use tokenizer::{Token, tokenize};

use serde::Serialize;

/// Parses a query (with directives already removed) into a filter tree.
pub fn parse_query(input: &str) -> Result<Query, ParseError> {
    let tokens = tokenize(input);
    let node = parse_tokens(&tokens)?;
    Ok(Query { node })
}

/// A parsed query. The default value matches every row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub node: Node,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            node: Node::match_all(),
        }
    }
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.node.is_match_all()
    }

    /// Non-excluded tag terms, first occurrence order, without duplicates.
    ///
    /// These are the tags a `matching_tags:` filter counts against.
    pub fn positive_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for filter in self.node.filters() {
            if filter.field != Field::Tag || filter.negated {
                continue;
            }
            if let Some(name) = filter.value.as_text() {
                if !tags.contains(&name) {
                    tags.push(name);
                }
            }
        }
        tags
    }

    /// Every `matching_tags:` comparison in the query. SQL cannot express
    /// these, so the caller checks them against [`Query::positive_tags`].
    pub fn matching_tag_requirements(&self) -> Vec<MatchingTagRequirement> {
        self.node
            .filters()
            .into_iter()
            .filter(|filter| filter.field == Field::MatchingTags)
            .filter_map(|filter| match (filter.op, &filter.value) {
                (Operator::Compare(op), Value::Integer(threshold)) => {
                    Some(MatchingTagRequirement {
                        op,
                        threshold: *threshold,
                        negated: filter.negated,
                    })
                }
                _ => None,
            })
            .collect()
    }
}

/// One `matching_tags:<op><n>` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchingTagRequirement {
    pub op: ComparisonOp,
    pub threshold: i64,
    pub negated: bool,
}

impl MatchingTagRequirement {
    pub fn is_satisfied(&self, matching: i64) -> bool {
        let op = if self.negated { self.op.negated() } else { self.op };
        op.compare(matching, self.threshold)
    }
}
