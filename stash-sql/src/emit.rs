use itertools::Itertools;
use stash_syntax::{Field, FieldKind, Filter, Node, Operator, Value};
use tracing::{debug, warn};

pub const MATCH_ALL: &str = "1=1";

/// Tag count derived from the comma separators of the serialized tag list.
pub const TAG_COUNT_EXPR: &str = "(length(tags) - length(replace(tags, ',', '')) + 1)";

const ASPECT_RATIO_EXPR: &str = "(CAST(width AS REAL) / CAST(height AS REAL))";

/// Renders a filter tree as a WHERE fragment with positional `?` parameters.
///
/// The returned parameters line up one-to-one with the placeholders, in
/// reading order.
pub fn emit(node: &Node) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let sql = render(node, &mut params);
    (sql, params)
}

fn render(node: &Node, params: &mut Vec<Value>) -> String {
    match node {
        Node::Filter(filter) => render_filter(filter, params),
        Node::And(children) => render_children(children, " AND ", params),
        Node::Or(children) => render_children(children, " OR ", params),
    }
}

fn render_children(children: &[Node], separator: &str, params: &mut Vec<Value>) -> String {
    if children.is_empty() {
        return MATCH_ALL.to_string();
    }
    children
        .iter()
        .map(|child| format!("({})", render(child, params)))
        .join(separator)
}

fn render_filter(filter: &Filter, params: &mut Vec<Value>) -> String {
    let Filter {
        field,
        value,
        op,
        negated,
    } = filter;

    match field {
        Field::Tag => {
            let name = value.to_string().replace('*', "%");
            params.push(Value::Text(format!("%\"{name}\"%")));
            format!("tags {} ?", like(*negated))
        }
        Field::TagCount => compare_expr(TAG_COUNT_EXPR, filter, params),
        Field::AspectRatio => compare_expr(ASPECT_RATIO_EXPR, filter, params),
        Field::MatchingTags => {
            warn!("matching_tags cannot be expressed in SQL, leaving it to the caller");
            MATCH_ALL.to_string()
        }
        Field::Duration => {
            let column = field.column();
            match op {
                Operator::Pattern => cast_like(column, value, *negated, params),
                Operator::Compare(op) => {
                    params.push(value.clone());
                    let op = if *negated { op.negated() } else { *op };
                    format!("({column} IS NOT NULL AND {column} {op} ?)")
                }
            }
        }
        Field::Unknown(name) => {
            debug!("ignoring filter on unknown field {name:?}");
            MATCH_ALL.to_string()
        }
        _ => match field.kind() {
            Some(FieldKind::Date) => {
                let column = field.column();
                match op {
                    Operator::Pattern => cast_like(column, value, *negated, params),
                    Operator::Compare(op) => {
                        params.push(value.clone());
                        let op = if *negated { op.negated() } else { *op };
                        format!("DATE({column}) {op} DATE(?)")
                    }
                }
            }
            Some(FieldKind::Text) => {
                let column = field.column();
                let text = value.to_string();
                if text.contains('*') {
                    params.push(Value::Text(text.replace('*', "%")));
                    format!("{column} {} ?", like(*negated))
                } else {
                    params.push(Value::Text(text));
                    let op = if *negated { "!=" } else { "=" };
                    format!("LOWER({column}) {op} LOWER(?)")
                }
            }
            Some(FieldKind::Numeric) | None => compare_expr(field.column(), filter, params),
        },
    }
}

/// `<expr> <op> ?`, or a textual wildcard match for [`Operator::Pattern`].
fn compare_expr(expr: &str, filter: &Filter, params: &mut Vec<Value>) -> String {
    match filter.op {
        Operator::Pattern => cast_like(expr, &filter.value, filter.negated, params),
        Operator::Compare(op) => {
            params.push(filter.value.clone());
            let op = if filter.negated { op.negated() } else { op };
            format!("{expr} {op} ?")
        }
    }
}

fn cast_like(expr: &str, value: &Value, negated: bool, params: &mut Vec<Value>) -> String {
    params.push(Value::Text(value.to_string().replace('*', "%")));
    format!("CAST({expr} AS TEXT) {} ?", like(negated))
}

fn like(negated: bool) -> &'static str {
    if negated { "NOT LIKE" } else { "LIKE" }
}
