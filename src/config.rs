//! Runtime configuration.
//!
//! Use the builder methods to customize the defaults, or read overrides from
//! `THREADLINE_*` environment variables.
//!
//! # Example
//!
//! ```ignore
//! use threadline::config::RuntimeConfig;
//!
//! let config = RuntimeConfig::default()
//!     .with_base_url("http://localhost:8000")
//!     .with_reconcile_delay(Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::models::ModelConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Snapshot publish cadence (default: 16ms)
    pub publish_interval: Duration,
    /// Delay before refetching the thread list after a run or mutation
    pub reconcile_delay: Duration,
    /// Threads per list page
    pub page_size: usize,
    /// Maximum characters of the opening message used as placeholder title
    pub placeholder_title_chars: usize,
    /// Largest accepted attachment in bytes
    pub max_attachment_bytes: usize,
    /// Backend base URL for the HTTP adapters
    pub base_url: String,
    /// Model selection sent with every run, if any
    pub model: Option<ModelConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            publish_interval: Duration::from_millis(16),
            reconcile_delay: Duration::from_millis(1500),
            page_size: 20,
            placeholder_title_chars: 50,
            max_attachment_bytes: 5 * 1024 * 1024,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: None,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_publish_interval(mut self, interval: Duration) -> Self {
        self.publish_interval = interval;
        self
    }

    pub fn with_reconcile_delay(mut self, delay: Duration) -> Self {
        self.reconcile_delay = delay;
        self
    }

    /// Set the page size (at least 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_placeholder_title_chars(mut self, chars: usize) -> Self {
        self.placeholder_title_chars = chars;
        self
    }

    pub fn with_max_attachment_bytes(mut self, bytes: usize) -> Self {
        self.max_attachment_bytes = bytes;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = Some(model);
        self
    }

    /// Create config from `THREADLINE_*` environment variables.
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        if let Some(url) = lookup("THREADLINE_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url.trim());
        }
        if let Some(interval) = millis("THREADLINE_PUBLISH_INTERVAL_MS") {
            config = config.with_publish_interval(interval);
        }
        if let Some(delay) = millis("THREADLINE_RECONCILE_DELAY_MS") {
            config = config.with_reconcile_delay(delay);
        }
        if let Some(size) = lookup("THREADLINE_PAGE_SIZE").and_then(|v| v.trim().parse().ok()) {
            config = config.with_page_size(size);
        }
        if let Some(model) = lookup("THREADLINE_MODEL").filter(|v| !v.trim().is_empty()) {
            let provider = lookup("THREADLINE_PROVIDER")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "default".to_string());
            config = config.with_model(ModelConfig::new(provider, model));
        }

        if config != Self::default() {
            tracing::debug!(?config, "runtime config overridden from environment");
        }
        config
    }
}
