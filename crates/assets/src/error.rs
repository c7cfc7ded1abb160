use pageloom_core::{ClassifiedError, ErrorCause};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("could not create asset output directory: {0}")]
    OutputDirUnavailable(String),
}

impl ClassifiedError for AssetError {
    fn is_retryable(&self) -> bool {
        false
    }
    fn cause(&self) -> ErrorCause {
        ErrorCause::StorageFailure
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetFetchError {
    #[error("transport error fetching asset: {0}")]
    NetworkFailure(String),
    #[error("asset exceeds max_asset_bytes")]
    TooLarge,
    #[error("server error fetching asset: {0}")]
    ServerError(u16),
    #[error("client error fetching asset: {0}")]
    ClientError(u16),
}

impl ClassifiedError for AssetFetchError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            AssetFetchError::NetworkFailure(_) | AssetFetchError::ServerError(_)
        )
    }
    fn cause(&self) -> ErrorCause {
        ErrorCause::NetworkFailure
    }
}
