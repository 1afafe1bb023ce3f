//! Optimistic placeholder entry for a thread the backend has not confirmed yet

use chrono::Utc;

use crate::error::IntegrityError;
use crate::models::{placeholder_title, Thread};

use super::ThreadListCache;

impl ThreadListCache {
    /// Insert the placeholder for a new conversation at the head of the
    /// unpinned list.
    ///
    /// Only one placeholder is tracked at a time. A previous one the backend
    /// never acknowledged is replaced; a confirmed one stays listed and only
    /// loses its marker. Returns `false` if `id` is already listed.
    pub fn insert_placeholder(&mut self, id: &str, first_message: &str, max_chars: usize) -> bool {
        if self.contains(id) {
            self.touch(id);
            return false;
        }

        if let Some(previous) = self.placeholder.take() {
            if std::mem::take(&mut self.placeholder_confirmed) {
                tracing::debug!(thread_id = %previous, "releasing confirmed placeholder");
            } else {
                tracing::debug!(thread_id = %previous, "replacing unconfirmed placeholder");
                self.remove(&previous);
            }
        }

        let thread = Thread::new(id, placeholder_title(first_message, max_chars), Utc::now());
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        self.pages[0].insert(0, thread);
        self.placeholder = Some(id.to_string());
        self.placeholder_confirmed = false;
        true
    }

    /// Confirm the placeholder with the id the backend assigned.
    ///
    /// The entry stays marked until a fetch lists it. A different id is
    /// recorded as a fault and the entry is re-keyed in place so it is never
    /// listed twice.
    pub fn confirm_placeholder(&mut self, server_id: &str) -> Result<(), IntegrityError> {
        let Some(placeholder) = self.placeholder.clone() else {
            return Ok(());
        };
        if placeholder == server_id {
            self.placeholder_confirmed = true;
            return Ok(());
        }

        let fault = IntegrityError::PlaceholderMismatch {
            placeholder: placeholder.clone(),
            confirmed: server_id.to_string(),
        };
        tracing::warn!(%fault, "re-keying placeholder thread");

        if self.contains(server_id) {
            // The confirmed thread is already listed; drop the placeholder copy
            self.remove(&placeholder);
        } else {
            for thread in self.threads_mut(&placeholder) {
                thread.id = server_id.to_string();
            }
            self.placeholder = Some(server_id.to_string());
            self.placeholder_confirmed = true;
        }
        self.faults.push(fault.clone());
        Err(fault)
    }
}
