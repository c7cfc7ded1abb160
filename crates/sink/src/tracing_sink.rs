use tracing::{error, info};

use crate::events::{ArtifactEvent, AssetFetchEvent, ErrorEvent, FetchEvent, FinalCrawlStats};
use crate::traits::{CrawlFinalizer, MetadataSink};

/// Production sink: every event becomes a structured `tracing` record. No
/// persistence of its own — downstream collection is whatever the process's
/// `tracing` subscriber is wired to.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetadataSink for TracingSink {
    fn record_error(&self, event: ErrorEvent) {
        error!(
            package = %event.package_name,
            action = %event.action,
            cause = %event.cause,
            details = %event.details,
            attrs = ?event.attrs,
            observed_at = %event.observed_at,
            "crawl error"
        );
    }

    fn record_fetch(&self, event: FetchEvent) {
        info!(
            url = %event.url,
            status = event.status,
            duration_ms = event.duration.as_millis() as u64,
            content_type = %event.content_type,
            retry_count = event.retry_count,
            crawl_depth = event.crawl_depth,
            "page fetch"
        );
    }

    fn record_asset_fetch(&self, event: AssetFetchEvent) {
        info!(
            url = %event.url,
            status = event.status,
            duration_ms = event.duration.as_millis() as u64,
            retry_count = event.retry_count,
            "asset fetch"
        );
    }

    fn record_artifact(&self, event: ArtifactEvent) {
        info!(
            kind = ?event.kind,
            path = %event.path,
            attrs = ?event.attrs,
            "artifact written"
        );
    }
}

impl CrawlFinalizer for TracingSink {
    fn record_final_crawl_stats(&self, stats: FinalCrawlStats) {
        info!(
            total_pages = stats.total_pages,
            total_errors = stats.total_errors,
            total_assets = stats.total_assets,
            duration_ms = stats.duration.as_millis() as u64,
            "crawl finished"
        );
    }
}
