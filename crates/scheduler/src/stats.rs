use std::sync::atomic::{AtomicU64, Ordering};

use pageloom_sink::{
    ArtifactEvent, ArtifactKind, AssetFetchEvent, CrawlFinalizer, ErrorEvent, FetchEvent, MetadataSink,
};

/// Wraps any `MetadataSink` and tallies counts the scheduler needs for
/// `RecordFinalCrawlStats`, without the tallies themselves influencing what
/// gets crawled. Delegates every event through unchanged.
pub struct CountingSink<S> {
    inner: S,
    pages: AtomicU64,
    errors: AtomicU64,
    assets: AtomicU64,
}

impl<S> CountingSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pages: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            assets: AtomicU64::new(0),
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.pages.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn total_assets(&self) -> u64 {
        self.assets.load(Ordering::Relaxed)
    }
}

impl<S: MetadataSink> MetadataSink for CountingSink<S> {
    fn record_error(&self, event: ErrorEvent) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        self.inner.record_error(event);
    }

    fn record_fetch(&self, event: FetchEvent) {
        self.inner.record_fetch(event);
    }

    fn record_asset_fetch(&self, event: AssetFetchEvent) {
        self.inner.record_asset_fetch(event);
    }

    fn record_artifact(&self, event: ArtifactEvent) {
        match event.kind {
            ArtifactKind::Page => {
                self.pages.fetch_add(1, Ordering::Relaxed);
            }
            ArtifactKind::Asset => {
                self.assets.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.inner.record_artifact(event);
    }
}

impl<S: CrawlFinalizer> CrawlFinalizer for CountingSink<S> {
    fn record_final_crawl_stats(&self, stats: pageloom_sink::FinalCrawlStats) {
        self.inner.record_final_crawl_stats(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageloom_sink::RecordingSink;

    #[test]
    fn tallies_pages_assets_and_errors_independently() {
        let counting = CountingSink::new(RecordingSink::new());
        counting.record_artifact(ArtifactEvent {
            kind: ArtifactKind::Page,
            path: "pages/a.md".to_string(),
            attrs: vec![],
        });
        counting.record_artifact(ArtifactEvent {
            kind: ArtifactKind::Asset,
            path: "assets/images/a.png".to_string(),
            attrs: vec![],
        });
        counting.record_artifact(ArtifactEvent {
            kind: ArtifactKind::Asset,
            path: "assets/images/b.png".to_string(),
            attrs: vec![],
        });
        counting.record_error(ErrorEvent {
            observed_at: chrono::Utc::now(),
            package_name: "x".to_string(),
            action: "y".to_string(),
            cause: pageloom_core::ErrorCause::Unknown,
            details: String::new(),
            attrs: vec![],
        });

        assert_eq!(counting.total_pages(), 1);
        assert_eq!(counting.total_assets(), 2);
        assert_eq!(counting.total_errors(), 1);
    }
}
