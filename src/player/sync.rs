use crate::core::timefmt::format_hms;
use crate::player::controller::PlaybackController;
use std::time::{Duration, Instant};

/// Polling cadence for backends that emit no progress events.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Keeps the displayed transport state consistent with whichever backend is
/// active. Event-capable backends are refreshed every frame; the streaming
/// backend is polled on [`POLL_INTERVAL`]. Polling stops the moment the
/// active backend is swapped or destroyed because the loop reads the
/// controller each tick instead of holding its own backend reference.
pub struct ControlSyncLoop {
    pub elapsed_text: String,
    pub duration_text: String,
    pub scrub_position: f64,
    pub is_scrubbing: bool,
    pub playing: bool,
    pub controls_enabled: bool,
    last_poll: Option<Instant>,
}

impl ControlSyncLoop {
    pub fn new() -> Self {
        let mut sync = ControlSyncLoop {
            elapsed_text: String::new(),
            duration_text: String::new(),
            scrub_position: 0.0,
            is_scrubbing: false,
            playing: false,
            controls_enabled: false,
            last_poll: None,
        };
        sync.reset_idle();
        sync
    }

    /// The defined idle state: 00:00:00 / 00:00:00, transport disabled.
    pub fn reset_idle(&mut self) {
        self.elapsed_text = format_hms(0.0, false);
        self.duration_text = format_hms(0.0, false);
        self.scrub_position = 0.0;
        self.is_scrubbing = false;
        self.playing = false;
        self.controls_enabled = false;
        self.last_poll = None;
    }

    /// Recomputes displayed state. Returns true when the play/pause state
    /// changed since the last tick, so the caller can emit
    /// `PlaybackStateChanged`.
    pub fn tick(&mut self, controller: &mut PlaybackController) -> bool {
        let was_playing = self.playing;

        let Some(backend) = controller.backend_mut() else {
            if self.controls_enabled || self.playing {
                self.reset_idle();
            }
            return was_playing;
        };

        if backend.needs_polling() {
            let due = self
                .last_poll
                .map(|at| at.elapsed() >= POLL_INTERVAL)
                .unwrap_or(true);
            if due {
                backend.refresh();
                self.last_poll = Some(Instant::now());
            }
        } else {
            backend.refresh();
        }

        let current = backend.current_time();
        let duration = backend.duration();
        self.playing = backend.is_playing();
        self.controls_enabled = controller.backend_ready();
        self.elapsed_text = format_hms(current, false);
        self.duration_text = format_hms(duration, false);
        if !self.is_scrubbing {
            self.scrub_position = current;
        }

        was_playing != self.playing
    }

    /// While dragging, the displayed time tracks the drag value and no seek
    /// is issued.
    pub fn begin_scrub(&mut self) {
        self.is_scrubbing = true;
    }

    pub fn scrub_preview(&mut self, value: f64) {
        if self.is_scrubbing {
            self.scrub_position = value.max(0.0);
            self.elapsed_text = format_hms(self.scrub_position, false);
        }
    }

    /// One clamped seek on release.
    pub fn end_scrub(&mut self, controller: &mut PlaybackController) {
        if !self.is_scrubbing {
            return;
        }
        self.is_scrubbing = false;
        controller.seek_to(self.scrub_position);
    }
}

impl Default for ControlSyncLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::streaming::{EmbedHandle, StreamingBackend};

    fn streaming_controller(duration: f64) -> PlaybackController {
        let mut controller = PlaybackController::new();
        let mut handle = EmbedHandle::connect("dQw4w9WgXcQ");
        handle.report_duration(duration);
        controller.activate(Box::new(StreamingBackend::new(handle)));
        controller
    }

    #[test]
    fn test_idle_without_backend() {
        let mut controller = PlaybackController::new();
        let mut sync = ControlSyncLoop::new();
        sync.tick(&mut controller);
        assert_eq!(sync.elapsed_text, "00:00:00");
        assert_eq!(sync.duration_text, "00:00:00");
        assert!(!sync.controls_enabled);
        assert!(!sync.playing);
    }

    #[test]
    fn test_tick_reflects_backend_state() {
        let mut controller = streaming_controller(125.0);
        let mut sync = ControlSyncLoop::new();

        let changed = sync.tick(&mut controller);
        assert!(!changed);
        assert!(sync.controls_enabled);
        assert_eq!(sync.duration_text, "00:02:05");

        controller.toggle_playback();
        let changed = sync.tick(&mut controller);
        assert!(changed);
        assert!(sync.playing);
    }

    #[test]
    fn test_streaming_load_enables_controls_through_polling() {
        let mut controller = PlaybackController::new();
        controller.on_embed_api_ready();
        controller
            .load_streaming_source("https://youtu.be/dQw4w9WgXcQ")
            .unwrap();

        let mut sync = ControlSyncLoop::new();
        sync.tick(&mut controller);
        assert!(sync.controls_enabled);
        assert_ne!(sync.duration_text, "00:00:00");
    }

    #[test]
    fn test_teardown_resets_to_idle() {
        let mut controller = streaming_controller(60.0);
        let mut sync = ControlSyncLoop::new();
        sync.tick(&mut controller);
        assert!(sync.controls_enabled);

        controller.teardown();
        sync.tick(&mut controller);
        assert!(!sync.controls_enabled);
        assert_eq!(sync.elapsed_text, "00:00:00");
    }

    #[test]
    fn test_scrub_preview_does_not_seek() {
        let mut controller = streaming_controller(100.0);
        let mut sync = ControlSyncLoop::new();
        sync.tick(&mut controller);

        sync.begin_scrub();
        sync.scrub_preview(40.0);
        sync.scrub_preview(55.0);
        assert_eq!(controller.current_time(), 0.0);
        assert_eq!(sync.scrub_position, 55.0);

        // Display keeps tracking the drag, not the backend.
        sync.tick(&mut controller);
        assert_eq!(sync.scrub_position, 55.0);
    }

    #[test]
    fn test_scrub_release_issues_single_clamped_seek() {
        let mut controller = streaming_controller(100.0);
        let mut sync = ControlSyncLoop::new();
        sync.tick(&mut controller);

        sync.begin_scrub();
        sync.scrub_preview(500.0);
        sync.end_scrub(&mut controller);
        assert!(!sync.is_scrubbing);
        assert_eq!(controller.current_time(), 100.0); // clamped

        // Release without an active drag is a no-op.
        let before = controller.current_time();
        sync.end_scrub(&mut controller);
        assert_eq!(controller.current_time(), before);
    }
}
