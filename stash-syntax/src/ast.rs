use serde::Serialize;
use std::fmt;

/// Boolean structure of a query.
///
/// `And`/`Or` keep flat vectors in insertion order so rendered SQL is
/// deterministic. An empty `And` means "match everything".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    Filter(Filter),
    And(Vec<Node>),
    Or(Vec<Node>),
}

impl Node {
    /// The always-true node produced for an empty query or an empty group.
    pub fn match_all() -> Self {
        Node::And(Vec::new())
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Node::And(children) if children.is_empty())
    }

    /// Every leaf filter, depth-first.
    pub fn filters(&self) -> Vec<&Filter> {
        let mut out = Vec::new();
        collect_filters(self, &mut out);
        out
    }
}

fn collect_filters<'a>(node: &'a Node, out: &mut Vec<&'a Filter>) {
    match node {
        Node::Filter(filter) => out.push(filter),
        Node::And(children) | Node::Or(children) => {
            for child in children {
                collect_filters(child, out);
            }
        }
    }
}

/// A single leaf such as `score:>10`, `-rating:explicit` or a bare tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub field: Field,
    pub value: Value,
    pub op: Operator,
    pub negated: bool,
}

impl Filter {
    pub fn tag(name: impl Into<String>, negated: bool) -> Self {
        Self {
            field: Field::Tag,
            value: Value::Text(name.into()),
            op: Operator::Compare(ComparisonOp::Eq),
            negated,
        }
    }
}

/// Canonical columns (and computed fields) of the post cache table.
///
/// Unrecognized `name:` prefixes are kept as [`Field::Unknown`] so the emitter
/// can decide what to do with them instead of the parser rejecting the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    /// Membership in the serialized tag list.
    Tag,
    PostId,
    Score,
    Width,
    Height,
    /// Number of tags, computed from the tag list.
    TagCount,
    /// Bytes on disk.
    FileSize,
    /// Seconds, only populated for video posts.
    Duration,
    /// How many of the query's own tags a post carries. Not expressible in SQL.
    MatchingTags,
    /// `width / height`, computed at query time.
    AspectRatio,
    Owner,
    Title,
    Rating,
    FileType,
    CreatedAt,
    DownloadedAt,
    Unknown(String),
}

/// Value coercion and rendering strategy of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Text,
    Date,
}

impl Field {
    /// Resolves a surface field name (case-insensitive) through the alias table.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "tag" => Field::Tag,
            "id" | "post_id" => Field::PostId,
            "score" => Field::Score,
            "width" => Field::Width,
            "height" => Field::Height,
            "tag-count" | "tagcount" | "tags" | "tag_count" => Field::TagCount,
            "size" | "filesize" | "file-size" | "file_size" => Field::FileSize,
            "duration" => Field::Duration,
            "matching-tags" | "matchingtags" | "matches" | "matching_tags" => Field::MatchingTags,
            "aspect-ratio" | "aspectratio" | "ratio" | "aspect_ratio" => Field::AspectRatio,
            "user" | "creator" | "author" | "owner" => Field::Owner,
            "title" => Field::Title,
            "rating" => Field::Rating,
            "type" | "ext" | "extension" | "filetype" | "file_type" => Field::FileType,
            "date-created" | "datecreated" | "upload-date" | "uploaded" | "created_at" => {
                Field::CreatedAt
            }
            "date-downloaded" | "datedownloaded" | "download-date" | "downloaded"
            | "downloaded_at" => Field::DownloadedAt,
            _ => Field::Unknown(lower),
        }
    }

    /// Column (or computed field) name as it appears in the cache table.
    pub fn column(&self) -> &str {
        match self {
            Field::Tag => "tags",
            Field::PostId => "post_id",
            Field::Score => "score",
            Field::Width => "width",
            Field::Height => "height",
            Field::TagCount => "tag_count",
            Field::FileSize => "file_size",
            Field::Duration => "duration",
            Field::MatchingTags => "matching_tags",
            Field::AspectRatio => "aspect_ratio",
            Field::Owner => "owner",
            Field::Title => "title",
            Field::Rating => "rating",
            Field::FileType => "file_type",
            Field::CreatedAt => "created_at",
            Field::DownloadedAt => "downloaded_at",
            Field::Unknown(name) => name,
        }
    }

    /// `None` for tags and unknown fields, which have their own handling.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            Field::PostId
            | Field::Score
            | Field::Width
            | Field::Height
            | Field::TagCount
            | Field::FileSize
            | Field::Duration
            | Field::MatchingTags
            | Field::AspectRatio => Some(FieldKind::Numeric),
            Field::Owner | Field::Title | Field::Rating | Field::FileType => Some(FieldKind::Text),
            Field::CreatedAt | Field::DownloadedAt => Some(FieldKind::Date),
            Field::Tag | Field::Unknown(_) => None,
        }
    }
}

/// Filter operand after field-specific coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Real(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Compare(ComparisonOp),
    /// Wildcard match (`*`) against the textual form of a numeric field.
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComparisonOp {
    Eq,
    /// Only produced by [`ComparisonOp::negated`].
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ComparisonOp {
    /// Operator spelled before the operand (`>=5kb`).
    pub fn from_glyph(glyph: &str) -> Option<Self> {
        match glyph {
            "=" => Some(ComparisonOp::Eq),
            "<" => Some(ComparisonOp::Lt),
            "<=" => Some(ComparisonOp::Lte),
            ">" => Some(ComparisonOp::Gt),
            ">=" => Some(ComparisonOp::Gte),
            _ => None,
        }
    }

    /// Meaning of a glyph written after the operand: `5kb<` reads as "field > 5kb".
    pub fn reversed(self) -> Self {
        match self {
            ComparisonOp::Lt => ComparisonOp::Gt,
            ComparisonOp::Gt => ComparisonOp::Lt,
            ComparisonOp::Lte => ComparisonOp::Gte,
            ComparisonOp::Gte => ComparisonOp::Lte,
            other => other,
        }
    }

    /// Logical complement used to render negated comparisons.
    pub fn negated(self) -> Self {
        match self {
            ComparisonOp::Eq => ComparisonOp::Ne,
            ComparisonOp::Ne => ComparisonOp::Eq,
            ComparisonOp::Gt => ComparisonOp::Lte,
            ComparisonOp::Gte => ComparisonOp::Lt,
            ComparisonOp::Lt => ComparisonOp::Gte,
            ComparisonOp::Lte => ComparisonOp::Gt,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
        }
    }

    pub fn compare<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            ComparisonOp::Eq => lhs == rhs,
            ComparisonOp::Ne => lhs != rhs,
            ComparisonOp::Lt => lhs < rhs,
            ComparisonOp::Lte => lhs <= rhs,
            ComparisonOp::Gt => lhs > rhs,
            ComparisonOp::Gte => lhs >= rhs,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
