//! Thread list cache
//!
//! Paged, searchable summary of recent conversations. The runtime patches it
//! optimistically while a run is in flight and replaces it wholesale when a
//! reconciliation fetch lands.

mod pages;
mod placeholder;
mod thread;

use std::collections::HashSet;

use crate::error::IntegrityError;
use crate::models::Thread;

#[derive(Debug, Default)]
pub struct ThreadListCache {
    /// Loaded pages, in fetch order
    pub(crate) pages: Vec<Vec<Thread>>,
    /// Cursor for the next page, if the backend has more
    pub(crate) next_cursor: Option<String>,
    pub(crate) has_more: bool,
    /// Active title filter
    pub(crate) search: Option<String>,
    pub(crate) is_loading: bool,
    /// Bumped by every load so late responses can be discarded
    pub(crate) generation: u64,
    /// Id of the placeholder entry not yet seen in a fetch, if any
    pub(crate) placeholder: Option<String>,
    /// Set once the backend acknowledged the placeholder's thread
    pub(crate) placeholder_confirmed: bool,
    /// Integrity faults seen while patching
    pub(crate) faults: Vec<IntegrityError>,
}

impl ThreadListCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// All threads, pinned first, then most recently updated.
    ///
    /// An id that shows up on two pages (because the list shifted between
    /// fetches) is listed once.
    pub fn items(&self) -> Vec<Thread> {
        let mut seen = HashSet::new();
        let mut items: Vec<Thread> = self
            .pages
            .iter()
            .flatten()
            .filter(|thread| seen.insert(thread.id.as_str()))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        items
    }

    pub fn get(&self, id: &str) -> Option<&Thread> {
        self.pages.iter().flatten().find(|thread| thread.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|page| page.is_empty())
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn placeholder_id(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn faults(&self) -> &[IntegrityError] {
        &self.faults
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn threads_mut(&mut self, id: &str) -> impl Iterator<Item = &mut Thread> + '_ {
        let id = id.to_string();
        self.pages
            .iter_mut()
            .flatten()
            .filter(move |thread| thread.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn thread(id: &str, minutes_ago: i64, pinned: bool) -> Thread {
        let mut thread = Thread::new(id, id, Utc::now() - Duration::minutes(minutes_ago));
        thread.is_pinned = pinned;
        thread
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = ThreadListCache::new();
        assert!(cache.is_empty());
        assert!(cache.items().is_empty());
        assert!(!cache.is_loading());
        assert!(!cache.has_more());
    }

    #[test]
    fn test_items_order_pinned_first_then_recent() {
        let mut cache = ThreadListCache::new();
        cache.pages = vec![vec![
            thread("old", 60, false),
            thread("new", 1, false),
            thread("pinned-old", 120, true),
        ]];

        let ids: Vec<String> = cache.items().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["pinned-old", "new", "old"]);
    }

    #[test]
    fn test_items_dedupes_across_pages() {
        let mut cache = ThreadListCache::new();
        cache.pages = vec![
            vec![thread("a", 1, false), thread("b", 2, false)],
            vec![thread("b", 2, false), thread("c", 3, false)],
        ];

        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut cache = ThreadListCache::new();
        cache.pages = vec![vec![thread("a", 1, false)]];
        cache.placeholder = Some("a".to_string());

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.placeholder_id().is_none());
    }
}
