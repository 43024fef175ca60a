//! Background task purging expired grants.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::store::GrantStore;

/// Handle to the periodic expiry sweep. Dropping it does not stop the task;
/// call [`ExpirySweeper::shutdown`] or cancel the token it was started with.
#[derive(Debug)]
pub struct ExpirySweeper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Start sweeping `store` every `interval`, until `cancel` fires.
    ///
    /// Passes run one at a time: a slow pass delays the next tick instead of
    /// overlapping it.
    #[must_use]
    pub fn spawn(store: GrantStore, interval: Duration, cancel: CancellationToken) -> Self {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        store.sweep_expired().await;
                    }
                }
            }
            tracing::debug!("Expiry sweeper stopped");
        });

        tracing::debug!(interval_secs = interval.as_secs(), "Expiry sweeper started");
        Self { cancel, handle }
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Expiry sweeper task ended abnormally");
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, Utc};

    use super::*;
    use crate::server::oauth::types::{DEFAULT_SCOPE, Grant};

    fn expired_token() -> Grant {
        let mut grant = Grant::access_token("c1", DEFAULT_SCOPE, ChronoDuration::seconds(1));
        grant.expires_at = Utc::now() - ChronoDuration::seconds(5);
        grant
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_on_interval() {
        let store = GrantStore::new("s");
        let sweeper = ExpirySweeper::spawn(store.clone(), Duration::from_secs(300), CancellationToken::new());

        // Let the immediate first pass run.
        tokio::time::sleep(Duration::from_secs(1)).await;
        store.insert("old", expired_token()).await;
        assert!(store.contains("old").await);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(!store.contains("old").await);

        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let sweeper = ExpirySweeper::spawn(GrantStore::new("s"), Duration::from_secs(300), cancel.clone());

        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(sweeper.is_finished());
    }
}
