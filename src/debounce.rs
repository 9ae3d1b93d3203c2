//! Debounced propagation of a rapidly changing value.
//!
//! A [`Debouncer`] owns at most one scheduled task. Every [`Debouncer::push`]
//! aborts the pending task and schedules a new one, so only the latest value
//! survives a burst, and it is delivered once the source has been quiet for
//! the whole delay. Dropping the debouncer aborts whatever is still pending.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Debouncer<T> {
    delay: Duration,
    tx: mpsc::UnboundedSender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer that delivers settled values on `tx`
    pub fn new(delay: Duration, tx: mpsc::UnboundedSender<T>) -> Self {
        Self {
            delay,
            tx,
            pending: None,
        }
    }

    /// Create a debouncer together with the receiver of its settled values
    pub fn channel(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(delay, tx), rx)
    }

    /// Record a new source value, restarting the quiescence window.
    ///
    /// Must be called from within a tokio runtime. A zero delay still defers
    /// delivery to a later scheduler tick.
    pub fn push(&mut self, value: T) {
        self.cancel();

        let tx = self.tx.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            // Receiver gone means the owner is tearing down
            let _ = tx.send(value);
        }));
    }
}

impl<T> Debouncer<T> {
    /// Drop the pending value, if any, without delivering it
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a value is scheduled and not yet delivered
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_only_final_value_after_quiet_period() {
        let (mut debouncer, mut rx) = Debouncer::channel(ms(500));

        debouncer.push("b");
        tokio::time::sleep(ms(100)).await;
        debouncer.push("bo");
        tokio::time::sleep(ms(100)).await;
        debouncer.push("bob");

        tokio::time::sleep(ms(499)).await;
        assert!(rx.try_recv().is_err(), "nothing before the window closes");

        tokio::time::sleep(ms(2)).await;
        assert_eq!(rx.try_recv().ok(), Some("bob"));

        tokio::time::sleep(ms(2000)).await;
        assert!(rx.try_recv().is_err(), "intermediate values are never queued");
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_values_each_emit() {
        let (mut debouncer, mut rx) = Debouncer::channel(ms(50));

        debouncer.push(1);
        tokio::time::sleep(ms(60)).await;
        debouncer.push(2);
        tokio::time::sleep(ms(60)).await;

        assert_eq!(rx.try_recv().ok(), Some(1));
        assert_eq!(rx.try_recv().ok(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_never_synchronous() {
        let (mut debouncer, mut rx) = Debouncer::channel(Duration::ZERO);

        debouncer.push(7);
        assert!(rx.try_recv().is_err(), "must not emit in the same tick");
        assert!(debouncer.is_pending());

        assert_eq!(rx.recv().await, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_value() {
        let (mut debouncer, mut rx) = Debouncer::channel(ms(100));
        debouncer.push(1);
        drop(debouncer);

        // All senders are gone once the aborted task is torn down
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_value() {
        let (mut debouncer, mut rx) = Debouncer::channel(ms(100));
        debouncer.push(1);
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        tokio::time::sleep(ms(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
