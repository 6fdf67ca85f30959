// Playback driver - periodic clock ticks routed through the session controller

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::app::session_controller::{EditEvent, SessionController};
use crate::domain::errors::DomainError;

/// Background task ticking the session clock at a fixed interval.
///
/// Ticks go through [`SessionController::handle`], so they serialize with
/// user edits and are rejected like any other event while exporting.
pub struct PlaybackDriver {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<u64>,
}

impl PlaybackDriver {
    /// Start ticking every `interval`
    pub fn spawn(controller: Arc<SessionController>, interval: Duration) -> Self {
        let (shutdown, mut stop) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();
            let mut ticks = 0u64;
            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    now = ticker.tick() => {
                        let delta = now.saturating_duration_since(last).as_secs_f64();
                        last = now;
                        match controller.handle(EditEvent::Tick(delta)) {
                            Ok(_) => ticks += 1,
                            Err(DomainError::SessionBusy(_)) | Err(DomainError::NoMediaLoaded) => {}
                            Err(err) => {
                                tracing::warn!(error = %err, "Playback tick failed, stopping driver");
                                break;
                            }
                        }
                    }
                }
            }
            tracing::debug!(ticks, "Playback driver stopped");
            ticks
        });
        Self {
            shutdown: Some(shutdown),
            handle,
        }
    }

    /// Stop the driver and return how many ticks were applied
    pub async fn stop(mut self) -> Result<u64, DomainError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        (&mut self.handle)
            .await
            .map_err(|e| DomainError::InternalError(format!("Playback task failed: {}", e)))
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
