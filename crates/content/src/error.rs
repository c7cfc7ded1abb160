use pageloom_core::{ClassifiedError, ErrorCause};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("input is not HTML")]
    NotHtml,
    #[error("no meaningful content node found")]
    NoContent,
}

impl ClassifiedError for ExtractError {
    fn is_retryable(&self) -> bool {
        false
    }
    fn cause(&self) -> ErrorCause {
        ErrorCause::ContentInvalid
    }
}

/// Closed set of reasons a document is rejected as structurally
/// irrepairable. Not every variant is currently reachable by the sanitizer's
/// heuristics; the set itself is the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnrepairabilityReason {
    #[error("competing document roots")]
    CompetingRoots,
    #[error("no structural anchor")]
    NoStructuralAnchor,
    #[error("multiple H1 elements without a provable primary root")]
    MultipleH1WithoutPrimary,
    #[error("implied multiple documents")]
    ImpliedMultipleDocuments,
    #[error("structurally ambiguous DOM")]
    StructurallyAmbiguous,
}

#[derive(Debug, thiserror::Error)]
#[error("document rejected: {0}")]
pub struct SanitizeError(pub UnrepairabilityReason);

impl ClassifiedError for SanitizeError {
    fn is_retryable(&self) -> bool {
        false
    }
    fn cause(&self) -> ErrorCause {
        ErrorCause::ContentInvalid
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("no content to convert")]
    Empty,
}

impl ClassifiedError for ConvertError {
    fn is_retryable(&self) -> bool {
        false
    }
    fn cause(&self) -> ErrorCause {
        ErrorCause::ContentInvalid
    }
}
