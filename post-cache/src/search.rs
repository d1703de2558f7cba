use crate::CachedPost;
use crate::models::PostStatus;
use serde::{Deserialize, Serialize};
use stash_sql::{SortOrder, TAG_COUNT_EXPR};
use tracing::warn;

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// One search box submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub status: Option<PostStatus>,
    /// Page size; a `per-page:` directive in the query wins.
    pub limit: u32,
    pub offset: u32,
    /// Sort key; a `sort:` directive in the query wins.
    pub sort_by: String,
    pub order: SortOrder,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            status: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            sort_by: "timestamp".to_string(),
            order: SortOrder::Desc,
        }
    }

    pub fn status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn sort(mut self, sort_by: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = sort_by.into();
        self.order = order;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub posts: Vec<CachedPost>,
    /// Matches across all pages.
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    /// The query was rejected and only the status filter applied.
    pub fell_back: bool,
}

/// SQL for a sort key usable in `ORDER BY`, or `None` if it is not sortable.
pub fn sort_expression(key: &str) -> Option<&'static str> {
    let expr = match key {
        "timestamp" => "timestamp",
        "score" => "score",
        "post_id" => "post_id",
        "owner" => "owner",
        "width" => "width",
        "height" => "height",
        "rating" => "rating",
        "file_size" => "file_size",
        "duration" => "duration",
        "created_at" => "created_at",
        "downloaded_at" => "downloaded_at",
        "tag_count" => TAG_COUNT_EXPR,
        "random" => "RANDOM()",
        _ => return None,
    };
    Some(expr)
}

/// Builds the `ORDER BY` body for a possibly comma-joined list of sort keys.
///
/// Unsortable keys are skipped; if none remain the cache's default order
/// (`timestamp`) is used.
pub fn order_clause(sort_by: &str, order: SortOrder) -> String {
    let direction = order.as_sql();
    let terms: Vec<String> = sort_by
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .filter_map(|key| {
            let expr = sort_expression(key);
            if expr.is_none() {
                warn!("Ignoring unsortable key {key:?}");
            }
            expr
        })
        .map(|expr| {
            if expr == "RANDOM()" {
                expr.to_string()
            } else {
                format!("{expr} {direction}")
            }
        })
        .collect();

    if terms.is_empty() {
        format!("timestamp {direction}")
    } else {
        terms.join(", ")
    }
}
