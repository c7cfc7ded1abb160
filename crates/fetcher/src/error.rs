use pageloom_core::{ClassifiedError, ErrorCause};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    NetworkFailure(String),
    #[error("unexpected content-type: {0}")]
    ContentTypeInvalid(String),
    #[error("failed reading response body: {0}")]
    ReadResponseBodyError(String),
    #[error("redirect limit exceeded")]
    RedirectLimitExceeded,
    #[error("page forbidden (403)")]
    RequestPageForbidden,
    #[error("client error: {0}")]
    ClientError(u16),
    #[error("too many requests (429)")]
    RequestTooMany,
    #[error("server error: {0}")]
    Request5xx(u16),
    #[error("response body exceeds {limit} byte limit")]
    BodyTooLarge { limit: usize },
}

impl ClassifiedError for FetchError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::NetworkFailure(_)
                | FetchError::ReadResponseBodyError(_)
                | FetchError::RequestTooMany
                | FetchError::Request5xx(_)
        )
    }

    fn cause(&self) -> ErrorCause {
        match self {
            FetchError::NetworkFailure(_) | FetchError::ReadResponseBodyError(_) => {
                ErrorCause::NetworkFailure
            }
            FetchError::ContentTypeInvalid(_) => ErrorCause::ContentInvalid,
            FetchError::RedirectLimitExceeded
            | FetchError::RequestPageForbidden
            | FetchError::ClientError(_) => ErrorCause::PolicyDisallow,
            FetchError::RequestTooMany | FetchError::Request5xx(_) => ErrorCause::NetworkFailure,
            FetchError::BodyTooLarge { .. } => ErrorCause::ContentInvalid,
        }
    }
}
