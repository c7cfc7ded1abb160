use std::sync::Arc;

use dashmap::DashMap;
use pageloom_core::{Decision, RetryParam, RuleSet};
use pageloom_retry::{CancelToken, never_cancelled, run_with_retry};
use pageloom_robots::{InMemoryRobotsCache, RobotsCache, build_rule_set, decide, fetch_robots};
use tokio::sync::Mutex;
use tracing::warn;
use url::Url;

/// Fetches, parses, and decides robots.txt policy for a host, single-flighting
/// concurrent lookups for the same host so N workers hitting the same host at
/// once issue exactly one robots.txt request. The robots subsystem itself is
/// reentrant, but duplicate concurrent fetches are wasteful, so the
/// scheduler dedups them here.
pub struct RobotsGate {
    cache: InMemoryRobotsCache,
    client: reqwest::Client,
    locks: DashMap<String, Arc<Mutex<()>>>,
    retry_param: RetryParam,
}

impl RobotsGate {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_retry_param(client, RetryParam::default())
    }

    pub fn with_retry_param(client: reqwest::Client, retry_param: RetryParam) -> Self {
        Self {
            cache: InMemoryRobotsCache::default(),
            client,
            locks: DashMap::new(),
            retry_param,
        }
    }

    fn host_lock(&self, host: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Returns the crawl decision for `url` under `user_agent`. Retryable
    /// robots-fetch outcomes (429, 5xx) are retried through the same wrapper
    /// every other fetch in this system uses before falling back to an open
    /// decision. On any robots fetch failure, fails open with `EmptyRuleSet`
    /// (allowed) — an empty robots.txt response is itself modeled as an
    /// empty rule set, so an exhausted/fatal fetch gets the same treatment
    /// rather than blocking the whole host.
    pub async fn decide_for(&self, url: &Url, user_agent: &str) -> Decision {
        self.decide_for_cancellable(url, user_agent, &never_cancelled())
            .await
    }

    pub async fn decide_for_cancellable(
        &self,
        url: &Url,
        user_agent: &str,
        cancel: &CancelToken,
    ) -> Decision {
        let host = url.host_str().unwrap_or("").to_string();
        let lock = self.host_lock(&host);
        let _guard = lock.lock().await;

        let scheme = url.scheme();
        let result = run_with_retry(&self.retry_param, cancel, |_attempt| {
            fetch_robots(&self.client, scheme, &host, user_agent, &self.cache)
        })
        .await;

        let rule_set = match result.outcome {
            Ok(result) => {
                let parsed = pageloom_robots::parse(&result.body);
                build_rule_set(&parsed, &host, user_agent, url.as_str())
            }
            Err(e) => {
                warn!(host = %host, error = %e, "robots.txt fetch failed, failing open");
                RuleSet::empty(&host, user_agent, url.as_str())
            }
        };
        drop(_guard);

        decide(url, &rule_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retries_transient_failure_then_falls_open() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/robots.txt")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let retry_param = RetryParam {
            base_delay: std::time::Duration::from_millis(1),
            jitter: std::time::Duration::ZERO,
            random_seed: 0,
            max_attempts: 2,
            backoff: pageloom_core::BackoffParam {
                initial: std::time::Duration::from_millis(1),
                multiplier: 1.0,
                max: std::time::Duration::from_millis(5),
            },
        };
        let gate = RobotsGate::with_retry_param(client, retry_param);
        let url = Url::parse(&format!("{}/page.html", server.url())).unwrap();

        let decision = gate.decide_for(&url, "pageloom-test").await;
        mock.assert_async().await;
        assert!(decision.allowed);
        assert_eq!(decision.reason, pageloom_core::DecisionReason::EmptyRuleSet);
    }
}

