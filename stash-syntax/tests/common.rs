#![allow(dead_code)]
//! Shared helpers for `stash-syntax` integration tests.

use stash_syntax::*;

pub fn parse_ok(input: &str) -> Node {
    parse_query(input).unwrap().node
}

pub fn parse_err(input: &str) -> ParseError {
    parse_query(input).unwrap_err()
}

pub fn as_and(node: &Node) -> &Vec<Node> {
    match node {
        Node::And(parts) => parts,
        other => panic!("expected And, got: {other:?}"),
    }
}

pub fn as_or(node: &Node) -> &Vec<Node> {
    match node {
        Node::Or(parts) => parts,
        other => panic!("expected Or, got: {other:?}"),
    }
}

pub fn as_filter(node: &Node) -> &Filter {
    match node {
        Node::Filter(filter) => filter,
        other => panic!("expected Filter, got: {other:?}"),
    }
}

pub fn tag_is(node: &Node, expected: &str) {
    let filter = as_filter(node);
    assert_eq!(filter.field, Field::Tag, "not a tag: {filter:?}");
    assert_eq!(filter.value, Value::Text(expected.to_string()));
    assert!(!filter.negated, "unexpected exclusion: {filter:?}");
}

pub fn excluded_tag_is(node: &Node, expected: &str) {
    let filter = as_filter(node);
    assert_eq!(filter.field, Field::Tag, "not a tag: {filter:?}");
    assert_eq!(filter.value, Value::Text(expected.to_string()));
    assert!(filter.negated, "expected exclusion: {filter:?}");
}

pub fn compares(node: &Node, field: Field, op: ComparisonOp, value: Value) {
    let filter = as_filter(node);
    assert_eq!(filter.field, field);
    assert_eq!(filter.op, Operator::Compare(op), "operator of {filter:?}");
    assert_eq!(filter.value, value);
}
