//! Translates search-box queries into parameterized SQLite predicates over
//! the `post_cache` table.
//!
//! ```
//! use stash_sql::{Translator, Value};
//!
//! let translation = Translator::new().translate("cat score:>10 sort:score-desc", Some("saved"));
//! assert_eq!(
//!     translation.sql,
//!     "((tags LIKE ?) AND (score > ?)) AND status = ?"
//! );
//! assert_eq!(translation.params.last(), Some(&Value::Text("saved".into())));
//! assert_eq!(translation.metadata.sort_by.as_deref(), Some("score"));
//! ```

mod emit;

pub use emit::{MATCH_ALL, TAG_COUNT_EXPR, emit};
pub use stash_syntax::{ParseError, Query, QueryMetadata, SortOrder, Value};

use stash_syntax::{extract_metadata, parse_query};
use std::fmt;
use tracing::{debug, error};

/// Stateless query translator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator;

/// A WHERE fragment ready to be appended to a `SELECT ... FROM post_cache`.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub sql: String,
    /// One entry per `?` in [`Translation::sql`], in order.
    pub params: Vec<Value>,
    pub metadata: QueryMetadata,
    /// The parsed filter tree, for checks SQL cannot express.
    pub query: Query,
    /// Set when the query was rejected and the status-only filter was used.
    pub fallback: Option<TranslateError>,
}

impl Translation {
    fn status_only(status: Option<&str>) -> Self {
        let (sql, params) = match status {
            Some(status) => ("status = ?".to_string(), vec![Value::Text(status.to_string())]),
            None => (MATCH_ALL.to_string(), Vec::new()),
        };
        Self {
            sql,
            params,
            metadata: QueryMetadata::default(),
            query: Query::default(),
            fallback: None,
        }
    }

    pub fn fell_back(&self) -> bool {
        self.fallback.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateError {
    pub query: String,
    pub source: ParseError,
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to translate {:?}: {}", self.query, self.source)
    }
}

impl std::error::Error for TranslateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Translator {
    pub fn new() -> Self {
        Self
    }

    /// Translates `query`, falling back to the status-only filter when the
    /// query contains a malformed value. Never fails.
    pub fn translate(&self, query: &str, status: Option<&str>) -> Translation {
        match self.try_translate(query, status) {
            Ok(translation) => translation,
            Err(err) => {
                error!("Query translation failed: {err}");
                let mut translation = Translation::status_only(normalize_status(status));
                translation.fallback = Some(err);
                translation
            }
        }
    }

    pub fn try_translate(
        &self,
        query: &str,
        status: Option<&str>,
    ) -> Result<Translation, TranslateError> {
        let status = normalize_status(status);
        if query.trim().is_empty() {
            return Ok(Translation::status_only(status));
        }

        let (clean, metadata) = extract_metadata(query);
        let parsed = parse_query(&clean).map_err(|source| TranslateError {
            query: query.to_string(),
            source,
        })?;
        let (mut sql, mut params) = emit(&parsed.node);
        if let Some(status) = status {
            sql = format!("({sql}) AND status = ?");
            params.push(Value::Text(status.to_string()));
        }

        debug!("Translated query {query:?} to SQL: {sql}");
        debug!("Params: {params:?}, Metadata: {metadata:?}");
        Ok(Translation {
            sql,
            params,
            metadata,
            query: parsed,
            fallback: None,
        })
    }
}

fn normalize_status(status: Option<&str>) -> Option<&str> {
    status.filter(|status| !status.is_empty())
}
