//! Shaper engine interface
//!
//! The shaper engine is the external packet-shaping process a strategy is
//! evaluated under. Only one may be active at a time; [`ShaperSession`]
//! scopes it to a single strategy.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::strategy::Strategy;

/// Start/stop control over the external shaper engine
///
/// Implemented by the platform crate's process-backed engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShaperEngine: Send {
    /// Launch the engine with the strategy's arguments
    async fn start(&mut self, strategy: &Strategy) -> Result<()>;

    /// Terminate the engine and release the packet filter.
    ///
    /// Must be safe to call when nothing is running.
    async fn stop(&mut self) -> Result<()>;

    /// Best-effort synchronous teardown, used when a session is dropped
    /// without being finished
    fn abort(&mut self);
}

/// An active shaper engine, scoped to one strategy
///
/// Call [`finish`](Self::finish) to stop the engine gracefully. Dropping an
/// unfinished session (panic, cancelled future) falls back to
/// [`ShaperEngine::abort`].
pub struct ShaperSession<'a, S: ShaperEngine + ?Sized> {
    engine: &'a mut S,
    active: bool,
}

impl<'a, S: ShaperEngine + ?Sized> ShaperSession<'a, S> {
    /// Start the engine. On failure the engine is stopped, clearing any
    /// partial launch, before the error is returned.
    pub async fn start(engine: &'a mut S, strategy: &Strategy) -> Result<ShaperSession<'a, S>> {
        match engine.start(strategy).await {
            Ok(()) => {
                debug!(strategy = strategy.index, "Shaper started");
                Ok(Self {
                    engine,
                    active: true,
                })
            }
            Err(e) => {
                warn!(strategy = strategy.index, error = %e, "Shaper failed to start");
                if let Err(stop_err) = engine.stop().await {
                    warn!(error = %stop_err, "Cleanup after failed start also failed");
                }
                Err(e)
            }
        }
    }

    /// Stop the engine; stop errors are logged and swallowed
    pub async fn finish(mut self) {
        self.active = false;
        if let Err(e) = self.engine.stop().await {
            warn!(error = %e, "Failed to stop shaper cleanly");
        } else {
            debug!("Shaper stopped");
        }
    }
}

impl<S: ShaperEngine + ?Sized> Drop for ShaperSession<'_, S> {
    fn drop(&mut self) {
        if self.active {
            warn!("Shaper session dropped while active, aborting engine");
            self.engine.abort();
        }
    }
}
