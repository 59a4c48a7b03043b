//! services/api/src/web/debounce.rs
//!
//! Last-write-wins scheduling for work that should only run after a quiet
//! period, such as re-filtering on search input.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct Debouncer {
    delay: Duration,
    pending: Option<CancellationToken>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Runs `work` after the quiet period. Scheduling again, or calling
    /// [`Debouncer::cancel`], before it fires discards it.
    pub fn schedule<F>(&mut self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Debounced work superseded before firing.");
                }
                _ = tokio::time::sleep(delay) => {
                    work.await;
                }
            }
        })
    }

    /// Discards any scheduled work that has not fired yet.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn only_the_last_scheduled_work_runs() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        let mut handles = Vec::new();
        for search in ["g", "go", "gov"] {
            let tx = tx.clone();
            handles.push(debouncer.schedule(async move {
                let _ = tx.send(search);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        drop(tx);

        assert_eq!(rx.recv().await, Some("gov"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn cancel_discards_pending_work() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        let handle = debouncer.schedule(async move {
            let _ = tx.send(());
        });
        debouncer.cancel();
        handle.await.unwrap();
        assert_eq!(rx.recv().await, None);
    }
}
