/// Which playback implementation is behind the adapter. Selected explicitly
/// by the controller at construction time, never inferred per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Native,
    Wrapped,
    Streaming,
}

/// Lifecycle of a backend instance. `Destroyed` is terminal; the controller
/// nulls its reference immediately after calling [`MediaBackend::destroy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Uninitialized,
    Ready,
    Playing,
    Paused,
    Ended,
    Destroyed,
}

/// Uniform transport contract over the three playback implementations.
///
/// Error policy: faults in the underlying player are caught inside the
/// implementation, logged, and treated as no-ops. Nothing here returns a
/// playback error to the caller.
pub trait MediaBackend {
    fn kind(&self) -> BackendKind;

    fn state(&self) -> PlayerState;

    /// Idempotent; playing while already playing is a no-op.
    fn play(&mut self);

    fn pause(&mut self);

    /// Clamps into `[0, duration]` when the duration is known, otherwise
    /// passes the non-negative value through.
    fn seek(&mut self, target_seconds: f64);

    /// Seconds from the start, never negative.
    fn current_time(&self) -> f64;

    /// 0 means unknown/not ready. Never negative, never NaN.
    fn duration(&self) -> f64;

    fn volume(&self) -> u8;

    fn set_volume(&mut self, volume: i64);

    fn is_playing(&self) -> bool {
        self.state() == PlayerState::Playing
    }

    /// Recomputes internal state (end-of-media detection, remote snapshot).
    /// Driven by the sync loop: every frame for event-capable backends, on
    /// the polling interval for streaming.
    fn refresh(&mut self) {}

    /// Streaming backends emit no progress events and must be polled.
    fn needs_polling(&self) -> bool {
        false
    }

    /// Tears down the underlying player and releases its resources. Must be
    /// invoked exactly once; the controller owns that guarantee.
    fn destroy(&mut self);
}

/// Seek clamping shared by every backend.
pub fn clamp_seek(target_seconds: f64, duration: f64) -> f64 {
    let target = if target_seconds.is_finite() { target_seconds.max(0.0) } else { 0.0 };
    if duration > 0.0 {
        target.min(duration)
    } else {
        target
    }
}

/// Volume is an integer percentage in `[0, 100]`.
pub fn clamp_volume(volume: i64) -> u8 {
    volume.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_seek_with_known_duration() {
        assert_eq!(clamp_seek(5.0, 10.0), 5.0);
        assert_eq!(clamp_seek(15.0, 10.0), 10.0);
        assert_eq!(clamp_seek(-3.0, 10.0), 0.0);
    }

    #[test]
    fn test_clamp_seek_with_unknown_duration_passes_through() {
        assert_eq!(clamp_seek(42.0, 0.0), 42.0);
        assert_eq!(clamp_seek(-1.0, 0.0), 0.0);
    }

    #[test]
    fn test_clamp_seek_rejects_nan() {
        assert_eq!(clamp_seek(f64::NAN, 10.0), 0.0);
    }

    #[test]
    fn test_clamp_volume() {
        assert_eq!(clamp_volume(-5), 0);
        assert_eq!(clamp_volume(50), 50);
        assert_eq!(clamp_volume(150), 100);
    }
}
