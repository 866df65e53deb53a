//! Human-like pacing between iterations and cooperative shutdown.

use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;

use crate::error::PacingError;

/// Uniform random delay bounds, in whole seconds, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min_secs: u64,
    max_secs: u64,
}

impl Pacing {
    /// # Errors
    ///
    /// Returns `PacingError::InvalidBounds` when `min_secs > max_secs`.
    pub fn new(min_secs: u64, max_secs: u64) -> Result<Self, PacingError> {
        if min_secs > max_secs {
            return Err(PacingError::InvalidBounds {
                min: min_secs,
                max: max_secs,
            });
        }
        Ok(Self { min_secs, max_secs })
    }

    /// No delay at all; useful for tests and dry runs.
    #[must_use]
    pub fn none() -> Self {
        Self {
            min_secs: 0,
            max_secs: 0,
        }
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(rng.random_range(self.min_secs..=self.max_secs))
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min_secs: 5,
            max_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Elapsed,
    Interrupted,
}

/// Trigger side of a shutdown signal; typically owned by the Ctrl-C task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Observer side of a shutdown signal, checked at loop top and during sleeps.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    #[must_use]
    pub fn channel() -> (ShutdownHandle, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownHandle { tx }, Shutdown { rx })
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `duration` unless shutdown is triggered first.
    pub async fn sleep(&self, duration: Duration) -> SleepOutcome {
        if self.is_triggered() {
            return SleepOutcome::Interrupted;
        }
        let mut rx = self.rx.clone();
        tokio::select! {
            () = tokio::time::sleep(duration) => SleepOutcome::Elapsed,
            // A dropped handle can never trigger; the branch is then disabled.
            Ok(_) = rx.wait_for(|triggered| *triggered) => SleepOutcome::Interrupted,
        }
    }
}
