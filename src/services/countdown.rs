use std::{sync::Weak, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant},
};

use crate::services::attempt_session::{AttemptSession, TickOutcome};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One-second countdown bound to a session. Dropping it stops the timer.
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn spawn(session: Weak<AttemptSession>) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);

            loop {
                ticker.tick().await;

                let Some(session) = session.upgrade() else {
                    break;
                };

                match session.tick() {
                    TickOutcome::Running(remaining) => {
                        log::debug!("Countdown: {}s remaining", remaining);
                    }
                    TickOutcome::Expired => {
                        log::info!("Time limit reached, submitting attempt");
                        // finish() stops this countdown, so it must not run on this task
                        tokio::spawn(async move {
                            if let Err(err) = session.finish().await {
                                log::warn!("Automatic submission did not complete: {}", err);
                            }
                        });
                        break;
                    }
                    TickOutcome::Inactive => break,
                }
            }
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
