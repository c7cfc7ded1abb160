use std::time::Duration;

use chrono::{DateTime, Utc};
use pageloom_core::ErrorCause;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Page,
    Asset,
}

#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub observed_at: DateTime<Utc>,
    pub package_name: String,
    pub action: String,
    pub cause: ErrorCause,
    pub details: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub url: String,
    /// Zero on failure.
    pub status: u16,
    pub duration: Duration,
    pub content_type: String,
    /// Actual attempt count from the retry result, never `max_attempts`.
    pub retry_count: u32,
    pub crawl_depth: u32,
}

#[derive(Debug, Clone)]
pub struct AssetFetchEvent {
    pub url: String,
    pub status: u16,
    pub duration: Duration,
    pub retry_count: u32,
}

#[derive(Debug, Clone)]
pub struct ArtifactEvent {
    pub kind: ArtifactKind,
    pub path: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy)]
pub struct FinalCrawlStats {
    pub total_pages: u64,
    pub total_errors: u64,
    pub total_assets: u64,
    pub duration: Duration,
}
