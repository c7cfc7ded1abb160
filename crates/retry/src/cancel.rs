use tokio::sync::watch;

/// A cheap, cloneable cancellation signal. The retry wrapper selects on this
/// during its inter-attempt sleeps so a shutdown signal is never slept
/// through.
#[derive(Clone)]
pub struct CancelToken(watch::Receiver<bool>);

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the paired handle signals cancellation. A no-op
    /// forever-pending future if cancellation never arrives.
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
        // Sender dropped without ever cancelling: never resolve.
        std::future::pending::<()>().await;
    }
}

#[derive(Clone)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// A token that never cancels — the default for call sites that don't wire
/// up shutdown (e.g. unit tests).
pub fn never_cancelled() -> CancelToken {
    let (_tx, rx) = watch::channel(false);
    CancelToken(rx)
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelToken(rx))
}
