// Thread list cache against the in-memory store
// Exercises the full page/placeholder/reconcile cycle the runtime drives.

mod common;

use common::*;
use threadline::cache::ThreadListCache;
use threadline::error::IntegrityError;
use threadline::models::{ListQuery, ThreadPage};
use threadline::traits::ThreadStore;

fn seeded_store(count: i64) -> InMemoryThreadStore {
    let store = InMemoryThreadStore::new();
    for i in 0..count {
        store.insert_thread(thread(&format!("t{}", i), &format!("Thread {}", i), i), Vec::new());
    }
    store
}

async fn fetch(store: &InMemoryThreadStore, query: ListQuery) -> ThreadPage {
    store.list_threads(query).await.unwrap()
}

fn ids(cache: &ThreadListCache) -> Vec<String> {
    cache.items().into_iter().map(|t| t.id).collect()
}

#[tokio::test]
async fn test_pages_then_reconcile_in_one_fetch() {
    let store = seeded_store(25);
    let mut cache = ThreadListCache::new();

    let generation = cache.begin_load(None, false);
    let page = fetch(&store, ListQuery::first(10)).await;
    assert!(cache.apply_page(generation, page, false));

    while let Some(query) = cache.next_page_query(10) {
        let generation = cache.begin_load(None, true);
        let page = fetch(&store, query).await;
        assert!(cache.apply_page(generation, page, true));
    }
    assert_eq!(cache.len(), 25);
    assert!(!cache.has_more());

    let query = cache.reconcile_query(10);
    assert_eq!(query.limit, 25);
    let generation = cache.begin_load(None, false);
    let page = fetch(&store, query).await;
    assert!(cache.apply_page(generation, page, false));

    assert_eq!(cache.len(), 25);
    assert_eq!(ids(&cache)[0], "t0");
    assert_eq!(ids(&cache)[24], "t24");
}

#[tokio::test]
async fn test_placeholder_survives_until_listed() {
    let store = seeded_store(3);
    let mut cache = ThreadListCache::new();
    let generation = cache.begin_load(None, false);
    cache.apply_page(generation, fetch(&store, ListQuery::first(20)).await, false);

    assert!(cache.insert_placeholder("new", "Show my holdings", 50));
    assert!(cache.confirm_placeholder("new").is_ok());
    assert_eq!(ids(&cache)[0], "new");

    // Reconciliation before the backend persisted it keeps the entry
    let generation = cache.begin_load(None, false);
    cache.apply_page(generation, fetch(&store, cache.reconcile_query(20)).await, false);
    assert!(cache.contains("new"));
    assert_eq!(cache.placeholder_id(), Some("new"));

    // Once persisted, the fetched entry replaces it
    store.insert_thread(thread("new", "Holdings overview", 0), Vec::new());
    let generation = cache.begin_load(None, false);
    cache.apply_page(generation, fetch(&store, cache.reconcile_query(20)).await, false);

    assert_eq!(cache.len(), 4);
    assert_eq!(cache.placeholder_id(), None);
    assert_eq!(cache.get("new").unwrap().title, "Holdings overview");
}

#[tokio::test]
async fn test_rekeyed_placeholder_is_never_listed_twice() {
    let store = seeded_store(2);
    let mut cache = ThreadListCache::new();
    let generation = cache.begin_load(None, false);
    cache.apply_page(generation, fetch(&store, ListQuery::first(20)).await, false);

    cache.insert_placeholder("proposed", "Hello", 50);
    let fault = cache.confirm_placeholder("server-1").unwrap_err();
    assert!(matches!(fault, IntegrityError::PlaceholderMismatch { .. }));

    store.insert_thread(thread("server-1", "Hello", 0), Vec::new());
    let generation = cache.begin_load(None, false);
    cache.apply_page(generation, fetch(&store, cache.reconcile_query(20)).await, false);

    let listed = ids(&cache);
    assert_eq!(listed.iter().filter(|id| *id == "server-1").count(), 1);
    assert!(!listed.contains(&"proposed".to_string()));
    assert_eq!(cache.faults().len(), 1);
}

#[tokio::test]
async fn test_search_load_supersedes_running_load() {
    let store = InMemoryThreadStore::new();
    store.insert_thread(thread("a", "Budget 2024", 1), Vec::new());
    store.insert_thread(thread("b", "Holiday plans", 2), Vec::new());
    let mut cache = ThreadListCache::new();

    let first = cache.begin_load(None, false);
    let unfiltered = fetch(&store, ListQuery::first(20)).await;
    let second = cache.begin_load(Some("holiday".to_string()), false);
    let filtered = fetch(
        &store,
        ListQuery::first(20).with_search(cache.search().map(str::to_string)),
    )
    .await;

    assert!(cache.apply_page(second, filtered, false));
    assert!(!cache.apply_page(first, unfiltered, false));
    assert_eq!(ids(&cache), vec!["b"]);
    assert_eq!(cache.search(), Some("holiday"));
}

#[tokio::test]
async fn test_optimistic_patches_then_store_wins() {
    let store = seeded_store(3);
    let mut cache = ThreadListCache::new();
    let generation = cache.begin_load(None, false);
    cache.apply_page(generation, fetch(&store, ListQuery::first(20)).await, false);

    cache.set_pinned("t2", true);
    cache.rename("t1", "Taxes");
    assert_eq!(ids(&cache)[0], "t2");
    assert_eq!(ids(&cache)[1], "t1");

    // Only the rename reached the store
    store.rename("t1", "Taxes").await.unwrap();
    let generation = cache.begin_load(None, false);
    cache.apply_page(generation, fetch(&store, cache.reconcile_query(20)).await, false);

    assert!(!cache.get("t2").unwrap().is_pinned);
    assert_eq!(cache.get("t1").unwrap().title, "Taxes");
    assert_eq!(ids(&cache), vec!["t0", "t1", "t2"]);
}
