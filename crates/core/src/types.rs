use std::collections::HashMap;
use std::time::Duration;

use url::Url;

/// Opaque frontier handle: "this canonical URL, at this depth, is next".
/// Produced only by the frontier after admission + canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlToken {
    pub url: Url,
    pub depth: u32,
}

/// Where a candidate URL came from, before it reaches the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceContext {
    Seed,
    Crawl,
}

#[derive(Debug, Clone)]
pub struct DiscoveryMetadata {
    pub depth: u32,
    pub delay_override: Option<Duration>,
}

/// External input to the frontier. All policy checks (robots, scope) are
/// assumed to have already passed by the time this reaches `submit`.
#[derive(Debug, Clone)]
pub struct CrawlAdmissionCandidate {
    pub target_url: Url,
    pub source_context: SourceContext,
    pub discovery: DiscoveryMetadata,
}

impl CrawlAdmissionCandidate {
    pub fn seed(url: Url) -> Self {
        Self {
            target_url: url,
            source_context: SourceContext::Seed,
            discovery: DiscoveryMetadata {
                depth: 0,
                delay_override: None,
            },
        }
    }

    pub fn discovered(url: Url, depth: u32) -> Self {
        Self {
            target_url: url,
            source_context: SourceContext::Crawl,
            discovery: DiscoveryMetadata {
                depth,
                delay_override: None,
            },
        }
    }
}

/// Immutable per-host robots policy, constructed once from a parsed
/// robots.txt response. Getters on the owning type must return copies of
/// this, never aliases into shared state.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub host: String,
    pub user_agent: String,
    pub allow_prefixes: Vec<String>,
    pub disallow_prefixes: Vec<String>,
    pub crawl_delay: Option<Duration>,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
    pub source_url: String,
    pub matched_group: bool,
    pub has_groups: bool,
}

impl RuleSet {
    /// An empty rule set: no groups at all (e.g. 4xx robots.txt response).
    pub fn empty(host: &str, user_agent: &str, source_url: &str) -> Self {
        Self {
            host: host.to_string(),
            user_agent: user_agent.to_string(),
            allow_prefixes: Vec::new(),
            disallow_prefixes: Vec::new(),
            crawl_delay: None,
            fetched_at: chrono::Utc::now(),
            source_url: source_url.to_string(),
            matched_group: false,
            has_groups: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    AllowedByRobots,
    DisallowedByRobots,
    UserAgentNotMatched,
    EmptyRuleSet,
    NoMatchingRules,
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub url: Url,
    pub allowed: bool,
    pub reason: DecisionReason,
    pub crawl_delay: Option<Duration>,
}

/// Per-host rate-limiter bookkeeping. `backoff_count == 0 <=> backoff_delay
/// == Duration::ZERO`.
#[derive(Debug, Clone)]
pub struct HostTiming {
    pub last_fetch_at: Option<std::time::Instant>,
    pub crawl_delay: Duration,
    pub backoff_delay: Duration,
    pub backoff_count: u32,
}

impl Default for HostTiming {
    fn default() -> Self {
        Self {
            last_fetch_at: None,
            crawl_delay: Duration::ZERO,
            backoff_delay: Duration::ZERO,
            backoff_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffParam {
    pub initial: Duration,
    pub multiplier: f64,
    pub max: Duration,
}

impl Default for BackoffParam {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            multiplier: 2.0,
            max: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryParam {
    pub base_delay: Duration,
    pub jitter: Duration,
    pub random_seed: u64,
    pub max_attempts: u32,
    pub backoff: BackoffParam,
}

impl Default for RetryParam {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(200),
            jitter: Duration::from_millis(250),
            random_seed: 0,
            max_attempts: 3,
            backoff: BackoffParam::default(),
        }
    }
}

/// Exactly one of `Ok`/`Err` is ever produced; `attempts` is always the
/// actual number of task invocations, never `max_attempts`.
#[derive(Debug, Clone)]
pub struct RetryResult<T, E> {
    pub outcome: Result<T, E>,
    pub attempts: u32,
}

impl<T, E> RetryResult<T, E> {
    pub fn ok(value: T, attempts: u32) -> Self {
        Self {
            outcome: Ok(value),
            attempts,
        }
    }

    pub fn err(error: E, attempts: u32) -> Self {
        Self {
            outcome: Err(error),
            attempts,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Navigation,
    Image,
    Anchor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub raw: String,
    pub kind: LinkKind,
}

/// Output of the converter: Markdown bytes plus link references in DOM
/// document order.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub markdown: Vec<u8>,
    pub link_refs: Vec<LinkRef>,
}

/// Output of the asset resolver: Markdown with image references rewritten
/// to local paths.
#[derive(Debug, Clone)]
pub struct AssetfulMarkdownDoc {
    pub content: Vec<u8>,
}

/// Mapping from original asset URL to content hash (hex). Append-only for
/// the life of a crawl run.
pub type WrittenAssets = HashMap<String, String>;
