//! SQLite-backed cache of every post the archiver knows about, searchable
//! with the tag query language from `stash-syntax`.

mod cache;
mod matching;
mod models;
mod schema;
mod search;

pub use cache::{MIGRATIONS, PostCache};
pub use matching::MatchingTagsFilter;
pub use models::{CachedPost, PostStatus};
pub use search::{DEFAULT_PAGE_SIZE, SearchPage, SearchRequest, order_clause, sort_expression};
pub use stash_sql::SortOrder;
