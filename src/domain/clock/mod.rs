//! Playback clock: the single source of truth for "now".

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Playback position and duration, clamped on every mutation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Clock {
    position: f64,
    duration: f64,
    playing: bool,
    resolved: bool,
}

impl Clock {
    /// Clock with no resolved duration, parked at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock whose duration is already known
    pub fn with_duration(duration: f64) -> Result<Self, DomainError> {
        let mut clock = Self::new();
        clock.set_duration(duration)?;
        Ok(clock)
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the media duration has been resolved
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Move the playhead; never changes `playing`
    pub fn seek(&mut self, time: f64) {
        self.position = self.clamp(time);
    }

    /// Fix the duration once. Re-setting the same value is a no-op.
    pub fn set_duration(&mut self, duration: f64) -> Result<(), DomainError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(DomainError::InvalidDuration(duration));
        }
        if self.resolved {
            if self.duration == duration {
                return Ok(());
            }
            return Err(DomainError::DurationAlreadyResolved {
                current: self.duration,
                requested: duration,
            });
        }
        self.duration = duration;
        self.resolved = true;
        self.position = self.clamp(self.position);
        tracing::debug!(duration, "Clock duration resolved");
        Ok(())
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Advance by `delta` seconds. Playback pauses once the end is reached.
    pub fn advance(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.position = self.clamp(self.position + delta);
        if self.playing && self.resolved && self.position >= self.duration {
            self.playing = false;
            tracing::debug!(position = self.position, "Playback reached end of media");
        }
    }

    fn clamp(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.duration)
    }
}
