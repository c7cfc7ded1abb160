use std::path::PathBuf;
use std::time::Duration;

use pageloom_core::{AppConfig, BackoffParam, RetryParam};

/// Immutable, already-resolved run configuration handed to every worker.
/// Built once from `AppConfig` plus CLI overrides at startup.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub user_agent: String,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub max_depth: u32,
    pub max_pages: u64,
    pub respect_robots: bool,
    pub max_asset_bytes: usize,
    pub max_body_bytes: usize,
    pub fetch_timeout: Duration,
    pub fetch_retry: RetryParam,
    pub asset_retry: RetryParam,
    pub rate_limit_base_delay: Duration,
    pub rate_limit_jitter: Duration,
    pub rate_limit_seed: u64,
}

impl SchedulerConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        let backoff = BackoffParam {
            initial: Duration::from_millis(cfg.rate_limit.base_delay_ms),
            multiplier: 2.0,
            max: Duration::from_secs(30),
        };
        let retry = RetryParam {
            base_delay: Duration::from_millis(cfg.rate_limit.base_delay_ms),
            jitter: Duration::from_millis(cfg.rate_limit.jitter_ms),
            random_seed: cfg.rate_limit.random_seed,
            max_attempts: cfg.retry.max_attempts,
            backoff,
        };
        Self {
            user_agent: cfg.general.user_agent.clone(),
            output_dir: PathBuf::from(&cfg.general.output_dir),
            workers: cfg.general.workers.max(1),
            max_depth: cfg.general.max_depth,
            max_pages: cfg.general.max_pages,
            respect_robots: cfg.robots.respect_robots,
            max_asset_bytes: cfg.assets.max_asset_bytes,
            max_body_bytes: cfg.fetch.max_body_bytes,
            fetch_timeout: Duration::from_secs(cfg.fetch.timeout_secs),
            fetch_retry: retry,
            asset_retry: retry,
            rate_limit_base_delay: Duration::from_millis(cfg.rate_limit.base_delay_ms),
            rate_limit_jitter: Duration::from_millis(cfg.rate_limit.jitter_ms),
            rate_limit_seed: cfg.rate_limit.random_seed,
        }
    }
}
