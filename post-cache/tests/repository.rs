mod common;
use common::*;
use post_cache::*;

#[test]
fn new_cache_is_empty() {
    let (_dir, cache) = open_cache();
    assert!(cache.is_cache_empty().unwrap());
    assert_eq!(cache.cache_count(None).unwrap(), 0);
}

#[test]
fn reopening_keeps_rows() {
    let (dir, cache) = open_cache();
    cache.cache_post(&post(1, &["cat"])).unwrap();
    drop(cache);

    let reopened = PostCache::open(dir.path().join("cache.db")).unwrap();
    assert_eq!(reopened.cache_count(None).unwrap(), 1);
}

#[test]
fn cache_post_replaces_by_id() {
    let (_dir, cache) = open_cache();
    cache.cache_post(&post(1, &["cat"])).unwrap();
    let mut updated = post(1, &["dog"]);
    updated.score = 12;
    cache.cache_post(&updated).unwrap();

    let posts = cache
        .cached_posts(None, 10, 0, "timestamp", SortOrder::Desc)
        .unwrap();
    assert_eq!(posts, vec![updated]);
}

#[test]
fn remove_reports_whether_a_row_existed() {
    let (_dir, cache) = open_cache();
    cache.cache_post(&post(1, &["cat"])).unwrap();
    assert!(cache.remove_from_cache(1).unwrap());
    assert!(!cache.remove_from_cache(1).unwrap());
    assert!(cache.is_cache_empty().unwrap());
}

#[test]
fn status_updates_and_counts() {
    let (_dir, cache) = open_cache();
    for id in 1..=3 {
        cache.cache_post(&post(id, &["cat"])).unwrap();
    }
    assert!(cache.update_post_status(2, PostStatus::Saved, Some("2024-01")).unwrap());
    assert!(cache.update_post_status(3, PostStatus::Saved, None).unwrap());
    assert!(!cache.update_post_status(99, PostStatus::Saved, None).unwrap());

    assert_eq!(cache.cache_count(Some(PostStatus::Pending)).unwrap(), 1);
    assert_eq!(cache.cache_count(Some(PostStatus::Saved)).unwrap(), 2);

    let saved = cache
        .cached_posts(Some(PostStatus::Saved), 10, 0, "post_id", SortOrder::Asc)
        .unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].date_folder, "2024-01");
    assert_eq!(saved[1].date_folder, "");
}

#[test]
fn listing_sorts_and_pages() {
    let (_dir, cache) = open_cache();
    for (id, score) in [(1, 5), (2, 50), (3, 20)] {
        let mut entry = post(id, &["cat"]);
        entry.score = score;
        entry.timestamp = id as f64;
        cache.cache_post(&entry).unwrap();
    }

    let by_score: Vec<i64> = cache
        .cached_posts(None, 10, 0, "score", SortOrder::Desc)
        .unwrap()
        .iter()
        .map(|post| post.post_id)
        .collect();
    assert_eq!(by_score, [2, 3, 1]);

    let second_page: Vec<i64> = cache
        .cached_posts(None, 1, 1, "score", SortOrder::Asc)
        .unwrap()
        .iter()
        .map(|post| post.post_id)
        .collect();
    assert_eq!(second_page, [3]);
}

#[test]
fn listing_ignores_unsortable_keys() {
    let (_dir, cache) = open_cache();
    for id in 1..=3 {
        let mut entry = post(id, &["cat"]);
        entry.timestamp = (10 - id) as f64;
        cache.cache_post(&entry).unwrap();
    }
    let posts = cache
        .cached_posts(None, 10, 0, "title", SortOrder::Asc)
        .unwrap();
    let order: Vec<i64> = posts.iter().map(|post| post.post_id).collect();
    assert_eq!(order, [3, 2, 1]);

    let posts = cache
        .cached_posts(None, 10, 0, "tag_count", SortOrder::Desc)
        .unwrap();
    let order: Vec<i64> = posts.iter().map(|post| post.post_id).collect();
    assert_eq!(order, [1, 2, 3]);
}
