use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub fetch: FetchConfig,
    pub rate_limit: RateLimitConfig,
    pub robots: RobotsConfig,
    pub assets: AssetsConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    pub output_dir: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default)]
    pub max_pages: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_max_depth() -> u32 {
    5
}
fn default_workers() -> usize {
    4
}
fn default_user_agent() -> String {
    "pageloom/0.1 (+https://example.invalid/bot)".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    #[serde(default)]
    pub random_seed: u64,
}

fn default_base_delay_ms() -> u64 {
    500
}
fn default_jitter_ms() -> u64 {
    250
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
            random_seed: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RobotsConfig {
    #[serde(default = "default_true")]
    pub respect_robots: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            respect_robots: default_true(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    #[serde(default = "default_max_asset_bytes")]
    pub max_asset_bytes: usize,
}

fn default_max_asset_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            max_asset_bytes: default_max_asset_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                output_dir: "out".to_string(),
                max_depth: default_max_depth(),
                max_pages: 0,
                user_agent: default_user_agent(),
                workers: default_workers(),
            },
            fetch: FetchConfig::default(),
            rate_limit: RateLimitConfig::default(),
            robots: RobotsConfig::default(),
            assets: AssetsConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}
