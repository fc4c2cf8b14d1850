use crate::BatchProcessor;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use wonderbot_core::{CoreError, ErrorExt, ErrorReporter, ItemSource, ReplySink};

/// Runs one full pass per interval until shut down. Passes never overlap and
/// are never interrupted; shutdown is only observed between them.
pub struct Scheduler {
    interval: Duration,
    reporter: ErrorReporter,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A failed pass is reported and retried on the next tick if the error is
    /// retryable. Anything else (bad credentials, an unwritable dedup log)
    /// stops the loop and is returned.
    pub async fn run<C, F>(
        &self,
        processor: &BatchProcessor<C>,
        shutdown: F,
    ) -> Result<(), CoreError>
    where
        C: ItemSource + ReplySink,
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Scheduler started, running every {:?}", self.interval);
        let mut passes: u64 = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Scheduler stopping after {} passes", passes);
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            passes += 1;
            match processor.run_pass().await {
                Ok(summary) => {
                    info!("Pass {} complete, {} replies sent", passes, summary.replied());
                }
                Err(e) if e.is_retryable() => {
                    warn!("Pass {} failed, retrying next interval", passes);
                    self.reporter.report_error(&e);
                }
                Err(e) => {
                    self.reporter.report_error(&e);
                    return Err(e);
                }
            }
        }
    }
}
