//! # Application State Management
//!
//! Shared state handed to every HTTP request handler via `web::Data`.
//!
//! This service deliberately keeps almost nothing in memory: both filename
//! indices are rebuilt from the filesystem on every request, so the only
//! shared pieces are the immutable configuration and the server start time
//! (for uptime reporting). `Arc` gives every handler cheap shared ownership
//! without any locking, which is safe because nothing here is ever mutated
//! after startup.

use crate::config::AppConfig;
use std::sync::Arc;
use std::time::Instant;

/// State shared across all HTTP request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration, fixed for the lifetime of the process
    config: Arc<AppConfig>,

    /// When the server started (Instant is Copy, safe to share directly)
    start_time: Instant,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Borrow the configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Seconds since the server started.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
