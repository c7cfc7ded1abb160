pub mod backoff;
pub mod cancel;
pub mod retry;

pub use backoff::{compute_jitter, exponential_backoff_delay, max_duration};
pub use cancel::{CancelHandle, CancelToken, cancel_pair, never_cancelled};
pub use retry::{RetryError, retry as run_with_retry};
