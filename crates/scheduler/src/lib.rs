pub mod config;
pub mod pipeline;
pub mod robots_gate;
pub mod stats;
pub mod writer;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use pageloom_assets::AssetResolver;
use pageloom_core::CrawlAdmissionCandidate;
use pageloom_frontier::CrawlFrontier;
use pageloom_ratelimit::RateLimiter;
use pageloom_retry::{CancelToken, cancel_pair};
use pageloom_sink::{CrawlFinalizer, FinalCrawlStats, MetadataSink};
use tokio::sync::broadcast;
use tracing::info;
use url::Url;

pub use config::SchedulerConfig;
use stats::CountingSink;

/// How many consecutive idle polls (frontier drained, no worker mid-pipeline)
/// before the run is considered complete.
const IDLE_POLLS_BEFORE_COMPLETE: u32 = 5;
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Owns every piece of shared worker state (frontier, rate limiter, robots
/// cache, asset resolver's dedup maps) and runs the worker pool.
pub struct Scheduler<S> {
    config: SchedulerConfig,
    client: reqwest::Client,
    frontier: Arc<CrawlFrontier>,
    rate_limiter: Arc<RateLimiter>,
    robots_gate: Arc<robots_gate::RobotsGate>,
    asset_resolver: Arc<AssetResolver>,
    sink: Arc<CountingSink<S>>,
    in_flight: Arc<AtomicI64>,
    /// Scope: a run is limited to the seeds' hosts. Populated once in
    /// `run()` from the seed list, before any worker reads it.
    scope_hosts: std::sync::OnceLock<HashSet<String>>,
}

impl<S: MetadataSink + CrawlFinalizer + 'static> Scheduler<S> {
    pub fn new(config: SchedulerConfig, sink: S) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;
        let rate_limiter = RateLimiter::new();
        rate_limiter.set_base_delay(config.rate_limit_base_delay);
        rate_limiter.set_jitter(config.rate_limit_jitter);
        rate_limiter.set_random_seed(config.rate_limit_seed);

        Ok(Self {
            frontier: Arc::new(CrawlFrontier::new(config.max_depth, config.max_pages)),
            rate_limiter: Arc::new(rate_limiter),
            robots_gate: Arc::new(robots_gate::RobotsGate::with_retry_param(
                client.clone(),
                config.fetch_retry,
            )),
            asset_resolver: Arc::new(AssetResolver::new()),
            sink: Arc::new(CountingSink::new(sink)),
            in_flight: Arc::new(AtomicI64::new(0)),
            scope_hosts: std::sync::OnceLock::new(),
            client,
            config,
        })
    }

    /// Seeds the frontier, spawns the worker pool, and runs until the
    /// frontier drains naturally or `Ctrl-C` is received. Returns once every
    /// worker has joined, after `RecordFinalCrawlStats` has fired exactly
    /// once.
    pub async fn run(self: Arc<Self>, seeds: Vec<Url>) -> FinalCrawlStats {
        let started = Instant::now();
        let scope_hosts: HashSet<String> = seeds
            .iter()
            .filter_map(|u| u.host_str().map(str::to_ascii_lowercase))
            .collect();
        let _ = self.scope_hosts.set(scope_hosts);

        for seed in seeds {
            self.frontier
                .submit(CrawlAdmissionCandidate::seed(seed))
                .await;
        }

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let (cancel_handle, cancel_token) = cancel_pair();

        let watchdog = {
            let frontier = Arc::clone(&self.frontier);
            let in_flight = Arc::clone(&self.in_flight);
            let shutdown_tx = shutdown_tx.clone();
            tokio::spawn(async move {
                let mut idle_rounds = 0u32;
                loop {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            info!("shutdown signal received");
                            let _ = shutdown_tx.send(());
                            cancel_handle.cancel();
                            return;
                        }
                        _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
                    }
                    let drained = frontier.current_min_depth().await == -1;
                    let idle = in_flight.load(Ordering::SeqCst) == 0;
                    if drained && idle {
                        idle_rounds += 1;
                    } else {
                        idle_rounds = 0;
                    }
                    if idle_rounds >= IDLE_POLLS_BEFORE_COMPLETE {
                        info!("frontier drained, crawl complete");
                        let _ = shutdown_tx.send(());
                        return;
                    }
                }
            })
        };

        let mut worker_handles = Vec::with_capacity(self.config.workers);
        for worker_id in 0..self.config.workers {
            let scheduler = Arc::clone(&self);
            let mut shutdown = shutdown_tx.subscribe();
            let cancel = cancel_token.clone();
            worker_handles.push(tokio::spawn(async move {
                scheduler.worker_loop(worker_id, &mut shutdown, &cancel).await;
            }));
        }

        for handle in worker_handles {
            let _ = handle.await;
        }
        let _ = watchdog.await;

        let final_stats = FinalCrawlStats {
            total_pages: self.sink.total_pages(),
            total_errors: self.sink.total_errors(),
            total_assets: self.sink.total_assets(),
            duration: started.elapsed(),
        };
        self.sink.record_final_crawl_stats(final_stats);
        final_stats
    }

    async fn worker_loop(
        &self,
        worker_id: usize,
        shutdown: &mut broadcast::Receiver<()>,
        cancel: &CancelToken,
    ) {
        info!(worker_id, "worker started");
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!(worker_id, "worker shutting down");
                    break;
                }
                _ = self.process_next(worker_id, cancel) => {}
            }
        }
    }

    async fn process_next(&self, worker_id: usize, cancel: &CancelToken) {
        let Some(token) = self.frontier.dequeue().await else {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            return;
        };
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let depth = token.depth;
        let url = token.url.clone();
        let outcome = pipeline::process_one(
            &self.client,
            cancel,
            self.sink.as_ref(),
            &self.config,
            &self.rate_limiter,
            &self.robots_gate,
            &self.asset_resolver,
            &token,
        )
        .await;

        if outcome.wrote_page {
            info!(worker_id, url = %url, depth, "page written");
        }
        let in_scope = self.scope_hosts.get();
        for link in outcome.discovered {
            let allowed = in_scope
                .map(|hosts| {
                    link.host_str()
                        .map(|h| hosts.contains(&h.to_ascii_lowercase()))
                        .unwrap_or(false)
                })
                .unwrap_or(true);
            if !allowed {
                continue;
            }
            self.frontier
                .submit(CrawlAdmissionCandidate::discovered(link, depth + 1))
                .await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
