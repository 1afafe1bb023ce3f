//! Per-thread patches for ThreadListCache

use chrono::Utc;

use crate::models::Thread;

use super::ThreadListCache;

impl ThreadListCache {
    /// Set a thread's title on every page it appears on. Returns whether the
    /// thread was found; an absent thread is left alone.
    pub fn patch_title(&mut self, id: &str, title: &str) -> bool {
        let mut found = false;
        for thread in self.threads_mut(id) {
            thread.title = title.to_string();
            found = true;
        }
        found
    }

    /// User rename. Same as a title patch, but also counts as activity.
    pub fn rename(&mut self, id: &str, title: &str) -> bool {
        let found = self.patch_title(id, title);
        if found {
            self.touch(id);
        }
        found
    }

    /// Bump a thread's activity time so it sorts to the top of its section
    pub fn touch(&mut self, id: &str) -> bool {
        let now = Utc::now();
        let mut found = false;
        for thread in self.threads_mut(id) {
            thread.updated_at = now;
            found = true;
        }
        found
    }

    pub fn set_pinned(&mut self, id: &str, pinned: bool) -> bool {
        let mut found = false;
        for thread in self.threads_mut(id) {
            thread.is_pinned = pinned;
            found = true;
        }
        found
    }

    /// Remove a thread from every page and return it
    pub fn remove(&mut self, id: &str) -> Option<Thread> {
        let mut removed = None;
        for page in &mut self.pages {
            if let Some(pos) = page.iter().position(|thread| thread.id == id) {
                let thread = page.remove(pos);
                removed.get_or_insert(thread);
            }
        }
        if self.placeholder.as_deref() == Some(id) {
            self.placeholder = None;
            self.placeholder_confirmed = false;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn cache_with(ids: &[&str]) -> ThreadListCache {
        let mut cache = ThreadListCache::new();
        cache.pages = vec![ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                Thread::new(*id, id.to_uppercase(), Utc::now() - Duration::minutes(i as i64 + 1))
            })
            .collect()];
        cache
    }

    #[test]
    fn test_patch_title_updates_every_page() {
        let mut cache = cache_with(&["a", "b"]);
        cache.pages.push(vec![Thread::new("a", "A", Utc::now())]);

        assert!(cache.patch_title("a", "Holdings review"));

        let titles: Vec<&str> = cache
            .pages
            .iter()
            .flatten()
            .filter(|t| t.id == "a")
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Holdings review", "Holdings review"]);
    }

    #[test]
    fn test_patch_title_absent_is_noop() {
        let mut cache = cache_with(&["a"]);
        assert!(!cache.patch_title("missing", "x"));
        assert_eq!(cache.get("a").unwrap().title, "A");
    }

    #[test]
    fn test_touch_moves_thread_first() {
        let mut cache = cache_with(&["a", "b", "c"]);
        cache.touch("c");
        assert_eq!(cache.items()[0].id, "c");
    }

    #[test]
    fn test_rename_touches() {
        let mut cache = cache_with(&["a", "b"]);
        assert!(cache.rename("b", "Budget"));
        let first = &cache.items()[0];
        assert_eq!(first.id, "b");
        assert_eq!(first.title, "Budget");
    }

    #[test]
    fn test_set_pinned_reorders() {
        let mut cache = cache_with(&["a", "b", "c"]);
        assert!(cache.set_pinned("c", true));
        assert_eq!(cache.items()[0].id, "c");

        assert!(cache.set_pinned("c", false));
        assert_eq!(cache.items()[2].id, "c");
    }

    #[test]
    fn test_remove() {
        let mut cache = cache_with(&["a", "b"]);
        let removed = cache.remove("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(!cache.contains("a"));
        assert!(cache.remove("a").is_none());
    }

    #[test]
    fn test_remove_placeholder_clears_marker() {
        let mut cache = ThreadListCache::new();
        cache.insert_placeholder("t1", "hello", 50);
        cache.remove("t1");
        assert!(cache.placeholder_id().is_none());
    }
}
