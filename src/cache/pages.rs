//! Paged loading and reconciliation for ThreadListCache

use crate::models::{ListQuery, ThreadPage};

use super::ThreadListCache;

impl ThreadListCache {
    /// Start a load and return its generation.
    ///
    /// A fresh load (`append == false`) replaces the search filter; loading
    /// the next page keeps it.
    pub fn begin_load(&mut self, search: Option<String>, append: bool) -> u64 {
        if !append {
            self.search = search.filter(|s| !s.trim().is_empty());
        }
        self.generation += 1;
        self.is_loading = true;
        self.generation
    }

    /// Apply a fetched page. Returns `false` when the page belongs to a load
    /// that has since been superseded.
    pub fn apply_page(&mut self, generation: u64, page: ThreadPage, append: bool) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding stale thread page"
            );
            return false;
        }

        if append {
            self.pages.push(page.threads);
        } else {
            let pending = self
                .placeholder
                .as_ref()
                .and_then(|id| self.get(id).cloned());
            self.pages = vec![page.threads];

            if let Some(placeholder) = pending {
                if self.contains(&placeholder.id) {
                    tracing::debug!(thread_id = %placeholder.id, "placeholder thread persisted");
                    self.placeholder = None;
                    self.placeholder_confirmed = false;
                } else {
                    self.pages[0].insert(0, placeholder);
                }
            }
        }

        self.next_cursor = page.next_cursor;
        self.has_more = page.has_more;
        self.is_loading = false;
        true
    }

    /// Mark a load as finished without data
    pub fn fail_load(&mut self, generation: u64) {
        if generation == self.generation {
            self.is_loading = false;
        }
    }

    /// Query for the page after the loaded ones, if there is one to fetch
    pub fn next_page_query(&self, page_size: usize) -> Option<ListQuery> {
        if !self.has_more || self.is_loading {
            return None;
        }
        let cursor = self.next_cursor.clone()?;
        Some(
            ListQuery::first(page_size)
                .with_cursor(Some(cursor))
                .with_search(self.search.clone()),
        )
    }

    /// Query that refetches everything currently loaded in one page
    pub fn reconcile_query(&self, page_size: usize) -> ListQuery {
        let loaded = self.pages.iter().map(Vec::len).sum::<usize>();
        ListQuery::first(loaded.max(page_size)).with_search(self.search.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Thread;
    use chrono::Utc;

    fn page(ids: &[&str], next_cursor: Option<&str>) -> ThreadPage {
        ThreadPage {
            threads: ids
                .iter()
                .map(|id| Thread::new(*id, format!("Thread {}", id), Utc::now()))
                .collect(),
            next_cursor: next_cursor.map(str::to_string),
            has_more: next_cursor.is_some(),
        }
    }

    #[test]
    fn test_first_page_then_append() {
        let mut cache = ThreadListCache::new();

        let gen = cache.begin_load(None, false);
        assert!(cache.is_loading());
        assert!(cache.apply_page(gen, page(&["a", "b"], Some("c2")), false));
        assert!(cache.has_more());

        let query = cache.next_page_query(2).unwrap();
        assert_eq!(query.cursor.as_deref(), Some("c2"));

        let gen = cache.begin_load(None, true);
        assert!(cache.next_page_query(2).is_none());
        assert!(cache.apply_page(gen, page(&["c"], None), true));

        assert_eq!(cache.len(), 3);
        assert!(!cache.has_more());
        assert!(cache.next_page_query(2).is_none());
    }

    #[test]
    fn test_stale_page_discarded() {
        let mut cache = ThreadListCache::new();
        let first = cache.begin_load(None, false);
        let second = cache.begin_load(Some("tax".to_string()), false);

        assert!(!cache.apply_page(first, page(&["stale"], None), false));
        assert!(cache.is_loading());
        assert!(cache.apply_page(second, page(&["tax-2024"], None), false));

        assert!(!cache.contains("stale"));
        assert_eq!(cache.search(), Some("tax"));
    }

    #[test]
    fn test_blank_search_clears_filter() {
        let mut cache = ThreadListCache::new();
        cache.begin_load(Some("tax".to_string()), false);
        cache.begin_load(Some("   ".to_string()), false);
        assert_eq!(cache.search(), None);
    }

    #[test]
    fn test_fail_load_only_for_current_generation() {
        let mut cache = ThreadListCache::new();
        let old = cache.begin_load(None, false);
        let current = cache.begin_load(None, false);

        cache.fail_load(old);
        assert!(cache.is_loading());
        cache.fail_load(current);
        assert!(!cache.is_loading());
    }

    #[test]
    fn test_reconcile_query_covers_loaded_pages() {
        let mut cache = ThreadListCache::new();
        let gen = cache.begin_load(Some("q".to_string()), false);
        cache.apply_page(gen, page(&["a", "b", "c"], Some("next")), false);
        let gen = cache.begin_load(None, true);
        cache.apply_page(gen, page(&["d", "e", "f"], None), true);

        let query = cache.reconcile_query(4);
        assert_eq!(query.limit, 6);
        assert_eq!(query.cursor, None);
        assert_eq!(query.search.as_deref(), Some("q"));
    }

    #[test]
    fn test_reconciliation_keeps_unconfirmed_placeholder() {
        let mut cache = ThreadListCache::new();
        cache.insert_placeholder("pending-1", "What are my holdings?", 50);

        let gen = cache.begin_load(None, false);
        cache.apply_page(gen, page(&["a"], None), false);

        assert_eq!(cache.items()[0].id, "pending-1");
        assert_eq!(cache.placeholder_id(), Some("pending-1"));
    }

    #[test]
    fn test_reconciliation_confirms_persisted_placeholder() {
        let mut cache = ThreadListCache::new();
        cache.insert_placeholder("pending-1", "What are my holdings?", 50);

        let gen = cache.begin_load(None, false);
        cache.apply_page(gen, page(&["pending-1", "a"], None), false);

        assert_eq!(cache.placeholder_id(), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("pending-1").unwrap().title, "Thread pending-1");
    }
}
