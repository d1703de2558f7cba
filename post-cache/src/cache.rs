use crate::matching::MatchingTagsFilter;
use crate::models::{CachedPost, PostRow, PostStatus};
use crate::schema::post_cache;
use crate::search::{SearchPage, SearchRequest, order_clause};
use anyhow::{Context, Result, anyhow};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Double, Text};
use diesel::sqlite::Sqlite;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use stash_sql::{SortOrder, Translator, Value};
use std::path::Path;
use tracing::{debug, info};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const CONNECTION_PRAGMAS: &str = "
    PRAGMA busy_timeout = 5000;
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA temp_store = MEMORY;
";

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// The denormalized index of archived and pending posts.
///
/// Every call opens its own connection, so a `PostCache` can be shared freely
/// between threads.
#[derive(Debug, Clone)]
pub struct PostCache {
    database_url: String,
    translator: Translator,
}

impl PostCache {
    /// Opens (creating if needed) the cache database at `path` and brings its
    /// schema up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let database_url = path
            .to_str()
            .ok_or_else(|| anyhow!("Database path {path:?} is not valid UTF-8."))?
            .to_string();
        let cache = Self {
            database_url,
            translator: Translator::new(),
        };
        let mut conn = cache.connect().context("Get db connection failed.")?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!(e))
            .context("Run post cache migrations failed.")?;
        info!("Post cache ready at {path:?}");
        Ok(cache)
    }

    fn connect(&self) -> Result<SqliteConnection> {
        let mut conn = SqliteConnection::establish(&self.database_url).with_context(|| {
            anyhow!(
                "Establish sqlite connection with url: `{}` failed.",
                self.database_url
            )
        })?;
        conn.batch_execute(CONNECTION_PRAGMAS)
            .context("Run connection pragmas failed.")?;
        Ok(conn)
    }

    /// Inserts `post`, replacing any row with the same id.
    pub fn cache_post(&self, post: &CachedPost) -> Result<()> {
        let row = PostRow::from_post(post)?;
        let mut conn = self.connect()?;
        diesel::replace_into(post_cache::table)
            .values(&row)
            .execute(&mut conn)
            .with_context(|| format!("Cache post {} failed.", post.post_id))?;
        info!("Cached post {}", post.post_id);
        Ok(())
    }

    /// Returns whether a row was removed.
    pub fn remove_from_cache(&self, post_id: i64) -> Result<bool> {
        let mut conn = self.connect()?;
        let removed = diesel::delete(post_cache::table.find(post_id))
            .execute(&mut conn)
            .with_context(|| format!("Remove post {post_id} from cache failed."))?;
        debug!("Removed post {post_id} from cache");
        Ok(removed > 0)
    }

    /// Moves a post to `status`, updating its date folder when one is given.
    /// Returns whether the post exists.
    pub fn update_post_status(
        &self,
        post_id: i64,
        status: PostStatus,
        date_folder: Option<&str>,
    ) -> Result<bool> {
        let mut conn = self.connect()?;
        let target = post_cache::table.find(post_id);
        let updated = match date_folder.filter(|folder| !folder.is_empty()) {
            Some(folder) => diesel::update(target)
                .set((
                    post_cache::status.eq(status.as_str()),
                    post_cache::date_folder.eq(folder),
                ))
                .execute(&mut conn),
            None => diesel::update(target)
                .set(post_cache::status.eq(status.as_str()))
                .execute(&mut conn),
        }
        .with_context(|| format!("Update status of post {post_id} failed."))?;
        debug!("Updated post {post_id} status to {status}");
        Ok(updated > 0)
    }

    pub fn cache_count(&self, status: Option<PostStatus>) -> Result<u64> {
        let mut conn = self.connect()?;
        let count = match status {
            Some(status) => post_cache::table
                .filter(post_cache::status.eq(status.as_str()))
                .count()
                .get_result::<i64>(&mut conn),
            None => post_cache::table.count().get_result::<i64>(&mut conn),
        }
        .context("Count cached posts failed.")?;
        Ok(count.max(0) as u64)
    }

    pub fn is_cache_empty(&self) -> Result<bool> {
        Ok(self.cache_count(None)? == 0)
    }

    /// Plain paged listing, sorted by `timestamp`, `score`, `post_id`,
    /// `owner`, `width` or `height`. Any other key sorts by `timestamp`.
    pub fn cached_posts(
        &self,
        status: Option<PostStatus>,
        limit: u32,
        offset: u32,
        sort_by: &str,
        order: SortOrder,
    ) -> Result<Vec<CachedPost>> {
        let mut conn = self.connect()?;
        let mut query = post_cache::table.into_boxed();
        if let Some(status) = status {
            query = query.filter(post_cache::status.eq(status.as_str()));
        }
        let rows = order_listing(query, sort_by, order)
            .limit(i64::from(limit))
            .offset(i64::from(offset))
            .load::<PostRow>(&mut conn)
            .context("Load cached posts failed.")?;
        rows.into_iter().map(PostRow::into_post).collect()
    }

    /// Runs a search box query.
    ///
    /// Malformed queries do not fail: they fall back to the status filter and
    /// the page reports `fell_back`. `matching_tags:` filters are applied to the
    /// loaded rows, so paging happens after them.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let translation = self
            .translator
            .translate(&request.query, request.status.map(PostStatus::as_str));
        let metadata = &translation.metadata;
        let sort_by = metadata.sort_by.as_deref().unwrap_or(&request.sort_by);
        let order = metadata.sort_order.unwrap_or(request.order);
        let limit = metadata.per_page.unwrap_or(request.limit);
        let offset = request.offset;
        let order_by = order_clause(sort_by, order);
        let post_filter = MatchingTagsFilter::from_query(&translation.query)?;

        let mut conn = self.connect()?;
        let select = format!(
            "SELECT * FROM post_cache WHERE {} ORDER BY {order_by}",
            translation.sql
        );
        debug!("Search SQL: {select}");

        let (posts, total) = match post_filter {
            None => {
                let total = bind_params(
                    format!(
                        "SELECT COUNT(*) AS count FROM post_cache WHERE {}",
                        translation.sql
                    ),
                    &translation.params,
                )
                .get_result::<CountRow>(&mut conn)
                .context("Count search results failed.")?
                .count;
                let rows = bind_params(format!("{select} LIMIT ? OFFSET ?"), &translation.params)
                    .bind::<BigInt, _>(i64::from(limit))
                    .bind::<BigInt, _>(i64::from(offset))
                    .load::<PostRow>(&mut conn)
                    .context("Load search results failed.")?;
                let posts = rows
                    .into_iter()
                    .map(PostRow::into_post)
                    .collect::<Result<Vec<_>>>()?;
                (posts, total.max(0) as u64)
            }
            Some(post_filter) => {
                let rows = bind_params(select, &translation.params)
                    .load::<PostRow>(&mut conn)
                    .context("Load search results failed.")?;
                let mut matched = Vec::new();
                for row in rows {
                    let post = row.into_post()?;
                    if post_filter.keeps(&post.tags) {
                        matched.push(post);
                    }
                }
                let total = matched.len() as u64;
                let posts = matched
                    .into_iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .collect();
                (posts, total)
            }
        };

        Ok(SearchPage {
            posts,
            total,
            limit,
            offset,
            fell_back: translation.fell_back(),
        })
    }
}

fn bind_params(sql: String, params: &[Value]) -> BoxedSqlQuery<'static, Sqlite, SqlQuery> {
    params
        .iter()
        .fold(diesel::sql_query(sql).into_boxed(), |query, param| match param {
            Value::Text(text) => query.bind::<Text, _>(text.clone()),
            Value::Integer(value) => query.bind::<BigInt, _>(*value),
            Value::Real(value) => query.bind::<Double, _>(*value),
        })
}

fn order_listing<'a>(
    query: post_cache::BoxedQuery<'a, Sqlite>,
    sort_by: &str,
    order: SortOrder,
) -> post_cache::BoxedQuery<'a, Sqlite> {
    use post_cache::dsl;

    macro_rules! by {
        ($column:expr) => {
            match order {
                SortOrder::Asc => query.order($column.asc()),
                SortOrder::Desc => query.order($column.desc()),
            }
        };
    }

    match sort_by {
        "score" => by!(dsl::score),
        "post_id" => by!(dsl::post_id),
        "owner" => by!(dsl::owner),
        "width" => by!(dsl::width),
        "height" => by!(dsl::height),
        _ => by!(dsl::timestamp),
    }
}
