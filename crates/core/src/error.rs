use std::fmt;

/// Closed set of observability causes. Never read to decide control flow —
/// only `ClassifiedError::is_retryable` may gate a retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCause {
    Unknown,
    NetworkFailure,
    PolicyDisallow,
    ContentInvalid,
    StorageFailure,
    InvariantViolation,
    RetryFailure,
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCause::Unknown => "unknown",
            ErrorCause::NetworkFailure => "network_failure",
            ErrorCause::PolicyDisallow => "policy_disallow",
            ErrorCause::ContentInvalid => "content_invalid",
            ErrorCause::StorageFailure => "storage_failure",
            ErrorCause::InvariantViolation => "invariant_violation",
            ErrorCause::RetryFailure => "retry_failure",
        };
        f.write_str(s)
    }
}

/// Severity derived mechanically from a subsystem's retryable flag. The
/// retry wrapper never reads this — it calls `is_retryable()` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Recoverable,
    Fatal,
}

/// Every fallible operation in the crawl control plane returns something
/// implementing this. `message()` is human text for the metadata sink;
/// `is_retryable()` is the only thing the retry wrapper consults.
pub trait ClassifiedError: std::error::Error + Send + Sync + 'static {
    fn message(&self) -> String {
        self.to_string()
    }

    fn is_retryable(&self) -> bool;

    fn cause(&self) -> ErrorCause;

    fn severity(&self) -> Severity {
        if self.is_retryable() {
            Severity::Recoverable
        } else {
            Severity::Fatal
        }
    }
}
