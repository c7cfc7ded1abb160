use pageloom_assets::{AssetResolver, ResolveParams};
use pageloom_content::{ExtractionThresholds, convert, extract, sanitize};
use pageloom_core::{CrawlToken, ErrorCause};
use pageloom_fetcher::fetch;
use pageloom_ratelimit::RateLimiter;
use pageloom_retry::CancelToken;
use pageloom_sink::{ArtifactEvent, ArtifactKind, ErrorEvent, MetadataSink};
use tracing::debug;
use url::Url;

use crate::config::SchedulerConfig;
use crate::robots_gate::RobotsGate;
use crate::writer;

/// Result of running the per-URL pipeline on one frontier token: links
/// discovered on the page (still unresolved against the frontier's admission
/// policy) and whether a page artifact was written.
pub struct PageOutcome {
    pub discovered: Vec<Url>,
    pub wrote_page: bool,
}

impl PageOutcome {
    fn empty() -> Self {
        Self {
            discovered: Vec::new(),
            wrote_page: false,
        }
    }
}

fn record_stage_error(sink: &dyn MetadataSink, url: &Url, action: &str, cause: ErrorCause, details: String) {
    sink.record_error(ErrorEvent {
        observed_at: chrono::Utc::now(),
        package_name: "pageloom-scheduler".to_string(),
        action: action.to_string(),
        cause,
        details,
        attrs: vec![("url".to_string(), url.to_string())],
    });
}

/// Runs dequeue → robots check → rate-limited wait → fetch → extract →
/// sanitize → convert → resolve assets → write for a single frontier token.
/// A fatal error at any stage aborts this URL's pipeline and returns an
/// empty outcome; the caller (the worker loop) always continues with the
/// next URL, matching the scheduler's default of continuing past per-URL
/// failures.
#[allow(clippy::too_many_arguments)]
pub async fn process_one(
    client: &reqwest::Client,
    cancel: &CancelToken,
    sink: &dyn MetadataSink,
    config: &SchedulerConfig,
    rate_limiter: &RateLimiter,
    robots_gate: &RobotsGate,
    asset_resolver: &AssetResolver,
    token: &CrawlToken,
) -> PageOutcome {
    let url = &token.url;
    let host = url.host_str().unwrap_or("").to_string();

    if config.respect_robots {
        let decision = robots_gate
            .decide_for_cancellable(url, &config.user_agent, cancel)
            .await;
        if let Some(delay) = decision.crawl_delay {
            rate_limiter.set_crawl_delay(&host, delay);
        }
        if !decision.allowed {
            debug!(url = %url, reason = ?decision.reason, "robots disallowed fetch");
            return PageOutcome::empty();
        }
    }

    let wait = rate_limiter.resolve_delay(&host);
    if !wait.is_zero() {
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.cancelled() => return PageOutcome::empty(),
        }
    }
    rate_limiter.mark_last_fetch_as_now(&host);

    let fetch_result = match fetch(
        client,
        cancel,
        sink,
        token.depth,
        url.as_str(),
        &config.user_agent,
        config.max_body_bytes,
        &config.fetch_retry,
    )
    .await
    {
        Ok(result) => {
            rate_limiter.reset_backoff(&host);
            result
        }
        Err(_) => {
            // `fetch` already recorded RecordFetch/RecordError; the scheduler's
            // only remaining job is to back off the host for next time.
            rate_limiter.backoff(&host);
            return PageOutcome::empty();
        }
    };

    let extraction = match extract(&fetch_result.body, &[], &ExtractionThresholds::default()) {
        Ok(extraction) => extraction,
        Err(e) => {
            record_stage_error(sink, url, "extract", ErrorCause::ContentInvalid, e.to_string());
            return PageOutcome::empty();
        }
    };

    let sanitized = match sanitize(extraction.content) {
        Ok(sanitized) => sanitized,
        Err(e) => {
            record_stage_error(sink, url, "sanitize", ErrorCause::ContentInvalid, e.to_string());
            return PageOutcome::empty();
        }
    };

    let conversion = match convert(&sanitized.root) {
        Ok(conversion) => conversion,
        Err(e) => {
            record_stage_error(sink, url, "convert", ErrorCause::ContentInvalid, e.to_string());
            return PageOutcome::empty();
        }
    };

    let resolve_params = ResolveParams {
        output_dir: &config.output_dir,
        max_asset_bytes: config.max_asset_bytes,
    };
    let asset_doc = match asset_resolver
        .resolve(
            client,
            cancel,
            sink,
            url,
            &conversion,
            &resolve_params,
            &config.asset_retry,
        )
        .await
    {
        Ok(doc) => doc,
        Err(e) => {
            record_stage_error(sink, url, "resolve_assets", ErrorCause::StorageFailure, e.to_string());
            return PageOutcome::empty();
        }
    };

    let relative_path = writer::derive_page_path(url);
    let wrote_page = match writer::write_page(&config.output_dir, &relative_path, &asset_doc.content) {
        Ok(_) => {
            sink.record_artifact(ArtifactEvent {
                kind: ArtifactKind::Page,
                path: relative_path.display().to_string(),
                attrs: vec![("url".to_string(), url.to_string())],
            });
            true
        }
        Err(e) => {
            record_stage_error(sink, url, "write_page", ErrorCause::StorageFailure, e.to_string());
            false
        }
    };

    let mut discovered = Vec::new();
    for href in &sanitized.hrefs {
        if let Ok(absolute) = url.join(href) {
            if absolute.scheme() == "http" || absolute.scheme() == "https" {
                discovered.push(absolute);
            }
        }
    }

    PageOutcome { discovered, wrote_page }
}
