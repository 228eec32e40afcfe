//! Per-session poll scheduler
//!
//! One poller per in-flight session: a cancellable recurring timer task that
//! invokes the state machine's step function. Steps for one session run to
//! completion before the next tick is taken, so they never overlap; sessions
//! for different users poll in parallel on separate tasks.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::machine::{SessionDriver, StepOutcome};

/// A recurring, cancellable poll series bound to one session.
pub(crate) struct SessionPoller {
    user_id: String,
    driver: SessionDriver,
    initial_delay: Duration,
    period: Duration,
    shutdown_token: CancellationToken,
}

impl SessionPoller {
    pub(crate) fn new(
        user_id: String,
        driver: SessionDriver,
        initial_delay: Duration,
        period: Duration,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            user_id,
            driver,
            initial_delay,
            period,
            shutdown_token,
        }
    }

    /// Runs the poll series until a terminal transition, a fault, or
    /// engine shutdown.
    pub(crate) async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.initial_delay, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("Poll series armed for {}", self.user_id);

        loop {
            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    debug!("Poll series for {} cancelled by shutdown", self.user_id);
                    break;
                }
                _ = ticker.tick() => {
                    // A panicking step must not leave a session polling
                    // forever or stuck in a waiting state.
                    let step = AssertUnwindSafe(self.driver.step(&self.user_id)).catch_unwind();
                    match step.await {
                        Ok(StepOutcome::Continue) => {}
                        Ok(StepOutcome::Stop) => break,
                        Err(_) => {
                            self.driver.fail(&self.user_id);
                            break;
                        }
                    }
                }
            }
        }

        debug!("Poll series for {} ended", self.user_id);
    }
}
