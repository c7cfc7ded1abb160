use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use dashmap::{DashMap, DashSet};
use pageloom_core::{canonicalize, CrawlAdmissionCandidate, CrawlToken};
use tokio::sync::Mutex;
use tracing::trace;

/// Strict-BFS, exact-dedup crawl frontier. Admission-free: every policy
/// check (robots, scope) must already have happened before `submit`.
///
/// Dedup is defined purely on the canonicalized URL string — never on
/// `Url` equality, which can diverge from string identity for exotic inputs.
pub struct CrawlFrontier {
    queues_by_depth: DashMap<u32, Mutex<VecDeque<CrawlToken>>>,
    visited: DashSet<String>,
    current_depth: AtomicU32,
    max_depth: u32,
    max_pages: u64,
    visited_count: AtomicU64,
}

impl CrawlFrontier {
    /// `max_depth == 0` means unlimited depth; `max_pages == 0` means
    /// unlimited pages.
    pub fn new(max_depth: u32, max_pages: u64) -> Self {
        Self {
            queues_by_depth: DashMap::new(),
            visited: DashSet::new(),
            current_depth: AtomicU32::new(0),
            max_depth,
            max_pages,
            visited_count: AtomicU64::new(0),
        }
    }

    /// Admits a candidate into the frontier. Returns `true` if enqueued,
    /// `false` if dropped (page budget exhausted, depth over the limit, or
    /// already visited).
    pub async fn submit(&self, candidate: CrawlAdmissionCandidate) -> bool {
        if self.max_pages > 0 && self.visited_count.load(Ordering::SeqCst) >= self.max_pages {
            return false;
        }
        let depth = candidate.discovery.depth;
        if self.max_depth > 0 && depth > self.max_depth {
            return false;
        }

        let canonical = canonicalize(&candidate.target_url);
        let key = canonical.to_string();
        if !self.visited.insert(key) {
            return false;
        }
        self.visited_count.fetch_add(1, Ordering::SeqCst);

        let token = CrawlToken {
            url: canonical,
            depth,
        };
        let queue = self
            .queues_by_depth
            .entry(depth)
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        queue.lock().await.push_back(token);

        self.current_depth.fetch_max(depth, Ordering::SeqCst);
        trace!(depth, "frontier: admitted candidate");
        true
    }

    /// Dequeues the head of the lowest non-empty depth queue, guaranteeing
    /// strict BFS order: no token at a higher depth is ever returned while a
    /// lower depth still has one pending.
    pub async fn dequeue(&self) -> Option<CrawlToken> {
        let max_depth_seen = self.current_depth.load(Ordering::SeqCst);
        for depth in 0..=max_depth_seen {
            let Some(queue) = self.queues_by_depth.get(&depth) else {
                continue;
            };
            let mut guard = queue.lock().await;
            if let Some(token) = guard.pop_front() {
                return Some(token);
            }
        }
        None
    }

    pub async fn is_depth_exhausted(&self, depth: u32) -> bool {
        match self.queues_by_depth.get(&depth) {
            Some(queue) => queue.lock().await.is_empty(),
            None => true,
        }
    }

    /// The lowest depth with a pending token, or `-1` if the frontier is
    /// fully drained.
    pub async fn current_min_depth(&self) -> i64 {
        let max_depth_seen = self.current_depth.load(Ordering::SeqCst);
        for depth in 0..=max_depth_seen {
            if !self.is_depth_exhausted(depth).await {
                return depth as i64;
            }
        }
        -1
    }

    pub fn visited_count(&self) -> u64 {
        self.visited_count.load(Ordering::SeqCst)
    }
}
