use pageloom_core::{ClassifiedError, ErrorCause};

use crate::cache::RobotsCache;

const MAX_BODY_BYTES: usize = 500 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum RobotsFetchError {
    #[error("too many redirects fetching robots.txt")]
    TooManyRedirects,
    #[error("too many requests fetching robots.txt")]
    TooManyRequests,
    #[error("server error fetching robots.txt: {0}")]
    ServerError(u16),
    #[error("transport error fetching robots.txt: {0}")]
    Transport(String),
}

impl ClassifiedError for RobotsFetchError {
    fn is_retryable(&self) -> bool {
        true
    }

    fn cause(&self) -> ErrorCause {
        ErrorCause::NetworkFailure
    }
}

#[derive(Debug, Clone)]
pub struct RobotsFetchResult {
    /// Raw robots.txt body text, or empty for hosts with no restrictions
    /// (4xx responses other than 429).
    pub body: String,
}

/// Fetches (or retrieves from cache) the robots.txt body for `scheme://host`.
pub async fn fetch_robots(
    client: &reqwest::Client,
    scheme: &str,
    hostname: &str,
    user_agent: &str,
    cache: &dyn RobotsCache,
) -> Result<RobotsFetchResult, RobotsFetchError> {
    let key = format!("{scheme}://{hostname}/robots.txt");

    if let Some(body) = cache.get(&key) {
        return Ok(RobotsFetchResult { body });
    }

    let response = client
        .get(&key)
        .header("User-Agent", user_agent)
        .header("Accept", "text/plain, */*;q=0.8")
        .send()
        .await
        .map_err(|e| {
            if e.is_redirect() {
                RobotsFetchError::TooManyRedirects
            } else {
                RobotsFetchError::Transport(e.to_string())
            }
        })?;

    let status = response.status();
    let result = if status.is_success() {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RobotsFetchError::Transport(e.to_string()))?;
        let truncated = &bytes[..bytes.len().min(MAX_BODY_BYTES)];
        let body = String::from_utf8_lossy(truncated).into_owned();
        RobotsFetchResult { body }
    } else if status.as_u16() == 429 {
        return Err(RobotsFetchError::TooManyRequests);
    } else if status.is_client_error() {
        RobotsFetchResult { body: String::new() }
    } else if status.is_server_error() {
        return Err(RobotsFetchError::ServerError(status.as_u16()));
    } else {
        // Any residual 3xx that the client surfaced instead of following.
        return Err(RobotsFetchError::TooManyRedirects);
    };

    cache.put(&key, result.body.clone());
    Ok(result)
}
