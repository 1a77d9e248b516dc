// Cooperative cancellation handle (part of the synchronizer seam)

use tokio::sync::watch;

/// Cancellation signal handed to a synchronizer.
///
/// Fired by the worker's soft time cap and by daemon shutdown. Honoring it is
/// optional; the hard cap terminates regardless of cooperation.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the cancellation signal
    pub async fn cancelled(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        let _ = self.rx.changed().await;
    }
}

/// Cancellation sender
pub struct CancelSender {
    tx: watch::Sender<bool>,
}

impl CancelSender {
    /// Request cooperative cancellation
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a cancellation channel
pub fn cancel_channel() -> (CancelSender, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelSender { tx }, CancelToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_is_observable() {
        let (tx, token) = cancel_channel();
        assert!(!token.is_cancelled());
        tx.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let (tx, mut token) = cancel_channel();
        let waiter = tokio::spawn(async move {
            token.cancelled().await;
            true
        });
        tx.cancel();
        assert!(waiter.await.unwrap());
    }
}
