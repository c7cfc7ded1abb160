use std::sync::Mutex;

use crate::events::{ArtifactEvent, AssetFetchEvent, ErrorEvent, FetchEvent, FinalCrawlStats};
use crate::traits::{CrawlFinalizer, MetadataSink};

/// In-memory sink for tests: every event is appended to a `Vec` behind a
/// `Mutex`, readable afterward via the accessor methods.
#[derive(Default)]
pub struct RecordingSink {
    errors: Mutex<Vec<ErrorEvent>>,
    fetches: Mutex<Vec<FetchEvent>>,
    asset_fetches: Mutex<Vec<AssetFetchEvent>>,
    artifacts: Mutex<Vec<ArtifactEvent>>,
    final_stats: Mutex<Option<FinalCrawlStats>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<ErrorEvent> {
        self.errors.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<FetchEvent> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn asset_fetches(&self) -> Vec<AssetFetchEvent> {
        self.asset_fetches.lock().unwrap().clone()
    }

    pub fn artifacts(&self) -> Vec<ArtifactEvent> {
        self.artifacts.lock().unwrap().clone()
    }

    pub fn final_stats(&self) -> Option<FinalCrawlStats> {
        *self.final_stats.lock().unwrap()
    }
}

impl MetadataSink for RecordingSink {
    fn record_error(&self, event: ErrorEvent) {
        self.errors.lock().unwrap().push(event);
    }

    fn record_fetch(&self, event: FetchEvent) {
        self.fetches.lock().unwrap().push(event);
    }

    fn record_asset_fetch(&self, event: AssetFetchEvent) {
        self.asset_fetches.lock().unwrap().push(event);
    }

    fn record_artifact(&self, event: ArtifactEvent) {
        self.artifacts.lock().unwrap().push(event);
    }
}

impl CrawlFinalizer for RecordingSink {
    fn record_final_crawl_stats(&self, stats: FinalCrawlStats) {
        *self.final_stats.lock().unwrap() = Some(stats);
    }
}
