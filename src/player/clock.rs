use crate::player::backend::clamp_seek;
use std::time::Instant;

/// Wall-clock position tracking shared by all backends. Position advances
/// against `Instant::now()` while running and freezes while paused, so reads
/// are cheap and need no audio-thread round trip.
#[derive(Debug)]
pub struct TransportClock {
    duration: f64,
    base_position: f64,
    started_at: Option<Instant>,
}

impl TransportClock {
    pub fn new() -> Self {
        TransportClock {
            duration: 0.0,
            base_position: 0.0,
            started_at: None,
        }
    }

    /// 0 keeps the duration unknown; negative and non-finite values are
    /// treated as unknown too.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = if duration.is_finite() && duration > 0.0 { duration } else { 0.0 };
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn position(&self) -> f64 {
        let mut position = self.base_position;
        if let Some(started_at) = self.started_at {
            position += started_at.elapsed().as_secs_f64();
        }
        if self.duration > 0.0 {
            position.min(self.duration)
        } else {
            position
        }
    }

    pub fn play(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        self.base_position = self.position();
        self.started_at = None;
    }

    pub fn seek(&mut self, target_seconds: f64) {
        let was_running = self.started_at.is_some();
        self.base_position = clamp_seek(target_seconds, self.duration);
        self.started_at = if was_running { Some(Instant::now()) } else { None };
    }

    /// True once a known duration has been fully played out.
    pub fn reached_end(&self) -> bool {
        self.duration > 0.0 && self.position() >= self.duration
    }
}

impl Default for TransportClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_position_starts_at_zero() {
        let clock = TransportClock::new();
        assert_eq!(clock.position(), 0.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut clock = TransportClock::new();
        clock.set_duration(60.0);
        clock.seek(90.0);
        assert_eq!(clock.position(), 60.0);
        clock.seek(-5.0);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_seek_passes_through_when_duration_unknown() {
        let mut clock = TransportClock::new();
        clock.seek(42.0);
        assert_eq!(clock.position(), 42.0);
    }

    #[test]
    fn test_pause_freezes_position() {
        let mut clock = TransportClock::new();
        clock.set_duration(60.0);
        clock.seek(10.0);
        clock.pause();
        let frozen = clock.position();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(clock.position(), frozen);
    }

    #[test]
    fn test_play_advances_position() {
        let mut clock = TransportClock::new();
        clock.set_duration(60.0);
        clock.play();
        std::thread::sleep(Duration::from_millis(30));
        assert!(clock.position() > 0.0);
        assert!(clock.is_running());
    }

    #[test]
    fn test_reached_end() {
        let mut clock = TransportClock::new();
        clock.set_duration(5.0);
        clock.seek(5.0);
        assert!(clock.reached_end());
        clock.seek(4.0);
        assert!(!clock.reached_end());
    }

    #[test]
    fn test_invalid_duration_is_unknown() {
        let mut clock = TransportClock::new();
        clock.set_duration(f64::NAN);
        assert_eq!(clock.duration(), 0.0);
        clock.set_duration(-3.0);
        assert_eq!(clock.duration(), 0.0);
    }
}
