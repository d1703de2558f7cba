#![allow(dead_code)]
//! Shared helpers for `post-cache` integration tests.

use post_cache::*;
use tempdir::TempDir;

/// A cache in a fresh temporary directory. Keep the `TempDir` alive for the
/// duration of the test.
pub fn open_cache() -> (TempDir, PostCache) {
    let dir = TempDir::new("post_cache").expect("Failed to create temp directory");
    let cache = PostCache::open(dir.path().join("cache.db")).expect("Failed to open cache");
    (dir, cache)
}

pub fn post(post_id: i64, tags: &[&str]) -> CachedPost {
    CachedPost::new(post_id, tags.iter().copied())
}

pub fn ids(page: &SearchPage) -> Vec<i64> {
    page.posts.iter().map(|post| post.post_id).collect()
}

pub fn search(cache: &PostCache, query: &str) -> SearchPage {
    cache
        .search(&SearchRequest::new(query).sort("post_id", SortOrder::Asc))
        .expect("search failed")
}
