//! Cookie subsystem readiness.
//!
//! Some cookie backends populate themselves asynchronously after the page
//! starts. The backend owns a [`ReadySignal`] and fires it once; readers
//! hold a [`Readiness`] and await it with a bounded budget.
//!
//! ```text
//! backend: ReadySignal::mark_ready() ──watch──→ Readiness::wait(policy)
//!                                               └─ gives up after the budget
//! ```

use std::time::Duration;

use tokio::sync::watch;

use crate::BridgeError;

/// How long a reader waits for the cookie subsystem.
///
/// Expressed as attempts x interval so the budget reads the same way it is
/// tuned ("five tries, a tenth of a second apart").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Default: 5.
    pub attempts: u32,
    /// Default: 100 ms.
    pub interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_millis(100),
        }
    }
}

impl ReadinessPolicy {
    /// Total time a reader is willing to wait.
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.attempts)
    }
}

/// Creates a connected signal/readiness pair, initially not ready.
pub fn readiness() -> (ReadySignal, Readiness) {
    let (tx, rx) = watch::channel(false);
    (ReadySignal { tx }, Readiness { rx })
}

/// The backend's half: fires once the cookies can be read.
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

impl ReadySignal {
    pub fn mark_ready(&self) {
        self.tx.send_replace(true);
    }
}

/// The reader's half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Readiness {
    rx: watch::Receiver<bool>,
}

impl Readiness {
    /// A readiness that is already satisfied, for synchronous backends.
    pub fn ready() -> Self {
        let (tx, rx) = watch::channel(true);
        drop(tx);
        Self { rx }
    }

    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until ready, giving up once `policy.budget()` has elapsed.
    ///
    /// # Errors
    /// - [`BridgeError::NotReady`] when the budget runs out
    /// - [`BridgeError::Abandoned`] when the signal is dropped unfired
    pub async fn wait(&self, policy: &ReadinessPolicy) -> Result<(), BridgeError> {
        if self.is_ready() {
            return Ok(());
        }

        let budget = policy.budget();
        let mut rx = self.rx.clone();
        let fired = async move { rx.wait_for(|ready| *ready).await.map(|_| ()) };

        match tokio::time::timeout(budget, fired).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(BridgeError::Abandoned),
            Err(_) => Err(BridgeError::NotReady(budget)),
        }
    }
}
