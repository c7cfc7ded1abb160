use crate::events::{ArtifactEvent, AssetFetchEvent, ErrorEvent, FetchEvent, FinalCrawlStats};

/// Injected observability dependency. Every subsystem that emits crawl
/// events receives one of these rather than reaching for a global logger or
/// a concrete storage backend.
pub trait MetadataSink: Send + Sync {
    fn record_error(&self, event: ErrorEvent);
    fn record_fetch(&self, event: FetchEvent);
    fn record_asset_fetch(&self, event: AssetFetchEvent);
    fn record_artifact(&self, event: ArtifactEvent);
}

/// Called exactly once, by the scheduler, at the end of a run. Never during
/// active crawling; stats recorded here must not feed back into control
/// flow.
pub trait CrawlFinalizer: Send + Sync {
    fn record_final_crawl_stats(&self, stats: FinalCrawlStats);
}
