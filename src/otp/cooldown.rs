//! Resend cooldown: a countdown that ticks once per period until zero.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Countdown driven by a background tokio task.
///
/// The task stops on its own at zero, when the token is cancelled, or when
/// the `Cooldown` is dropped.
#[derive(Debug)]
pub struct Cooldown {
    remaining: Arc<AtomicU32>,
    ticker: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl Cooldown {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            remaining: Arc::new(AtomicU32::new(0)),
            ticker: None,
            cancel,
        }
    }

    /// Reset to `seconds` and start ticking every `period`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, seconds: u32, period: Duration) {
        self.stop();
        self.remaining.store(seconds, Ordering::SeqCst);
        if seconds == 0 || self.cancel.is_cancelled() {
            return;
        }

        let remaining = Arc::clone(&self.remaining);
        let cancel = self.cancel.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Cooldown ticker cancelled");
                        return;
                    }
                    _ = interval.tick() => {}
                }

                let left = remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
                    .map(|prev| prev.saturating_sub(1))
                    .unwrap_or(0);
                if left == 0 {
                    debug!("Cooldown elapsed");
                    return;
                }
            }
        }));
    }

    /// Seconds left before a resend is allowed.
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop ticking, keeping the current count.
    pub fn stop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for Cooldown {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_tick() {
        let mut cooldown = Cooldown::new(CancellationToken::new());
        cooldown.start(60, TICK);
        assert_eq!(cooldown.remaining(), 60);

        tokio::time::sleep(Duration::from_millis(15_500)).await;
        assert_eq!(cooldown.remaining(), 45);

        tokio::time::sleep(Duration::from_secs(50)).await;
        assert_eq!(cooldown.remaining(), 0);
        assert!(!cooldown.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_freezes_the_count() {
        let token = CancellationToken::new();
        let mut cooldown = Cooldown::new(token.clone());
        cooldown.start(60, TICK);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        token.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(cooldown.remaining(), 58);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_the_count() {
        let mut cooldown = Cooldown::new(CancellationToken::new());
        cooldown.start(5, TICK);
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(cooldown.remaining(), 2);

        cooldown.start(5, TICK);
        assert_eq!(cooldown.remaining(), 5);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(cooldown.remaining(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_keeps_count() {
        let mut cooldown = Cooldown::new(CancellationToken::new());
        cooldown.start(10, TICK);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        cooldown.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(cooldown.remaining(), 9);
    }
}
