pub mod error;

use std::time::Instant;

use pageloom_core::RetryParam;
use pageloom_retry::{CancelToken, RetryError, run_with_retry};
use pageloom_sink::{ErrorEvent, FetchEvent, MetadataSink};

pub use error::FetchError;

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub body: Vec<u8>,
    pub status: u16,
    pub content_type: String,
}

fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml")
}

async fn perform_one_fetch(
    client: &reqwest::Client,
    url: &str,
    user_agent: &str,
    max_body_bytes: usize,
) -> Result<FetchResult, FetchError> {
    let response = client
        .get(url)
        .header("User-Agent", user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.5")
        .header("Accept-Encoding", "gzip, deflate, br")
        .header("DNT", "1")
        .header("Connection", "keep-alive")
        .send()
        .await
        .map_err(|e| {
            if e.is_redirect() {
                FetchError::RedirectLimitExceeded
            } else {
                FetchError::NetworkFailure(e.to_string())
            }
        })?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if status.is_success() {
        if !is_html_content_type(&content_type) {
            return Err(FetchError::ContentTypeInvalid(content_type));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::ReadResponseBodyError(e.to_string()))?;
        if bytes.len() > max_body_bytes {
            return Err(FetchError::BodyTooLarge { limit: max_body_bytes });
        }
        return Ok(FetchResult {
            body: bytes.to_vec(),
            status: status.as_u16(),
            content_type,
        });
    }

    if status.as_u16() == 403 {
        return Err(FetchError::RequestPageForbidden);
    }
    if status.as_u16() == 429 {
        return Err(FetchError::RequestTooMany);
    }
    if status.is_client_error() {
        return Err(FetchError::ClientError(status.as_u16()));
    }
    if status.is_server_error() {
        return Err(FetchError::Request5xx(status.as_u16()));
    }
    // Any 3xx the client itself surfaced instead of following.
    Err(FetchError::RedirectLimitExceeded)
}

/// Fetches `url`, wrapping `perform_one_fetch` in the retry wrapper, and
/// records exactly one `RecordFetch` (success or failure) and, on failure,
/// exactly one `RecordError`.
pub async fn fetch(
    client: &reqwest::Client,
    cancel: &CancelToken,
    sink: &dyn MetadataSink,
    crawl_depth: u32,
    url: &str,
    user_agent: &str,
    max_body_bytes: usize,
    retry_param: &RetryParam,
) -> Result<FetchResult, RetryError<FetchError>> {
    let started = Instant::now();
    let result = run_with_retry(retry_param, cancel, |_attempt| {
        perform_one_fetch(client, url, user_agent, max_body_bytes)
    })
    .await;
    let duration = started.elapsed();

    match &result.outcome {
        Ok(fetch_result) => {
            sink.record_fetch(FetchEvent {
                url: url.to_string(),
                status: fetch_result.status,
                duration,
                content_type: fetch_result.content_type.clone(),
                retry_count: result.attempts,
                crawl_depth,
            });
        }
        Err(err) => {
            sink.record_fetch(FetchEvent {
                url: url.to_string(),
                status: 0,
                duration,
                content_type: String::new(),
                retry_count: result.attempts,
                crawl_depth,
            });
            let cause = match err {
                RetryError::ZeroAttempts => pageloom_core::ErrorCause::InvariantViolation,
                RetryError::Exhausted { .. } => pageloom_core::ErrorCause::RetryFailure,
                RetryError::Task(task_err) => {
                    use pageloom_core::ClassifiedError;
                    task_err.cause()
                }
            };
            sink.record_error(ErrorEvent {
                observed_at: chrono::Utc::now(),
                package_name: "pageloom-fetcher".to_string(),
                action: "fetch".to_string(),
                cause,
                details: err.to_string(),
                attrs: vec![
                    ("url".to_string(), url.to_string()),
                    ("depth".to_string(), crawl_depth.to_string()),
                ],
            });
        }
    }

    result.outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageloom_core::BackoffParam;
    use pageloom_retry::never_cancelled;
    use pageloom_sink::RecordingSink;
    use std::time::Duration;

    fn fast_retry_param() -> RetryParam {
        RetryParam {
            base_delay: Duration::from_millis(1),
            jitter: Duration::ZERO,
            random_seed: 0,
            max_attempts: 2,
            backoff: BackoffParam {
                initial: Duration::from_millis(1),
                multiplier: 1.0,
                max: Duration::from_millis(5),
            },
        }
    }

    #[tokio::test]
    async fn successful_html_fetch_records_one_fetch_event() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html></html>")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let sink = RecordingSink::new();
        let url = format!("{}/page", server.url());
        let result = fetch(
            &client,
            &never_cancelled(),
            &sink,
            0,
            &url,
            "pageloom-test",
            1_000_000,
            &fast_retry_param(),
        )
        .await;

        mock.assert_async().await;
        assert!(result.is_ok());
        let fetches = sink.fetches();
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].status, 200);
        assert_eq!(fetches[0].retry_count, 1);
        assert!(sink.errors().is_empty());
    }

    #[tokio::test]
    async fn non_html_content_type_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let sink = RecordingSink::new();
        let url = format!("{}/data.json", server.url());
        let result = fetch(
            &client,
            &never_cancelled(),
            &sink,
            0,
            &url,
            "pageloom-test",
            1_000_000,
            &fast_retry_param(),
        )
        .await;

        mock.assert_async().await;
        assert!(result.is_err());
        assert_eq!(sink.fetches()[0].status, 0);
        assert_eq!(sink.errors().len(), 1);
    }

    #[tokio::test]
    async fn server_error_is_retried_and_recorded_as_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let sink = RecordingSink::new();
        let url = format!("{}/flaky", server.url());
        let result = fetch(
            &client,
            &never_cancelled(),
            &sink,
            2,
            &url,
            "pageloom-test",
            1_000_000,
            &fast_retry_param(),
        )
        .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 2, .. })));
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].cause, pageloom_core::ErrorCause::RetryFailure);
    }

    #[tokio::test]
    async fn body_over_limit_is_rejected_and_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/big")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("x".repeat(100))
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let sink = RecordingSink::new();
        let url = format!("{}/big", server.url());
        let result = fetch(
            &client,
            &never_cancelled(),
            &sink,
            0,
            &url,
            "pageloom-test",
            10,
            &fast_retry_param(),
        )
        .await;

        mock.assert_async().await;
        assert!(result.is_err());
        assert_eq!(sink.errors().len(), 1);
        assert_eq!(sink.errors()[0].cause, pageloom_core::ErrorCause::ContentInvalid);
    }
}
