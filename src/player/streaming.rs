use crate::player::backend::{clamp_seek, clamp_volume, BackendKind, MediaBackend, PlayerState};
use crate::player::clock::TransportClock;

/// The embed surface is a third party and can reject calls at any time,
/// including mid-teardown.
#[derive(Debug, thiserror::Error)]
#[error("Embedded player rejected {call}")]
pub struct EmbedError {
    call: &'static str,
}

/// Tagging window the in-process embed host reports when the stream itself
/// carries no measurable length. A networked host would answer the metadata
/// handshake with the stream's real duration instead.
const NOMINAL_STREAM_DURATION: f64 = 3600.0;

/// Handle to one embedded remote player session. This is the seam where the
/// remote embed surface plugs in: the host reports metadata and error
/// callbacks through it, and transport state is mirrored locally so reads
/// never block on the remote side.
pub struct EmbedHandle {
    stream_id: String,
    clock: TransportClock,
    connected: bool,
    faulted: bool,
    metadata_ready: bool,
}

impl EmbedHandle {
    pub fn connect(stream_id: &str) -> Self {
        log::info!("Connecting embedded player for stream {}", stream_id);
        EmbedHandle {
            stream_id: stream_id.to_string(),
            clock: TransportClock::new(),
            connected: true,
            faulted: false,
            metadata_ready: false,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Duration arrives from the host side once the stream's metadata is
    /// loaded.
    pub fn report_duration(&mut self, duration: f64) {
        self.clock.set_duration(duration);
        self.metadata_ready = true;
    }

    /// One polling round trip. The metadata handshake completes on the first
    /// poll after connect; a host that already reported a duration through
    /// [`EmbedHandle::report_duration`] is left untouched.
    pub fn poll(&mut self) -> Result<(), EmbedError> {
        self.ensure("poll")?;
        if !self.metadata_ready {
            self.report_duration(NOMINAL_STREAM_DURATION);
            log::info!(
                "Embedded player ready for stream {} ({:.0}s window)",
                self.stream_id,
                NOMINAL_STREAM_DURATION
            );
        }
        Ok(())
    }

    /// The host marks the session faulted after an embed error callback;
    /// every subsequent call is rejected until the backend is replaced.
    pub fn mark_faulted(&mut self) {
        self.faulted = true;
    }

    fn ensure(&self, call: &'static str) -> Result<(), EmbedError> {
        if !self.connected || self.faulted {
            return Err(EmbedError { call });
        }
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), EmbedError> {
        self.ensure("play")?;
        self.clock.play();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), EmbedError> {
        self.ensure("pause")?;
        self.clock.pause();
        Ok(())
    }

    pub fn seek_to(&mut self, seconds: f64) -> Result<(), EmbedError> {
        self.ensure("seek")?;
        self.clock.seek(seconds);
        Ok(())
    }

    pub fn current_time(&self) -> Result<f64, EmbedError> {
        self.ensure("current_time")?;
        Ok(self.clock.position())
    }

    pub fn duration(&self) -> Result<f64, EmbedError> {
        self.ensure("duration")?;
        Ok(self.clock.duration())
    }

    pub fn is_at_end(&self) -> Result<bool, EmbedError> {
        self.ensure("state")?;
        Ok(self.clock.reached_end())
    }

    pub fn disconnect(&mut self) -> Result<(), EmbedError> {
        self.ensure("disconnect")?;
        self.clock.pause();
        self.connected = false;
        log::info!("Disconnected embedded player for stream {}", self.stream_id);
        Ok(())
    }
}

/// Embedded streaming player behind the uniform adapter. Emits no progress
/// events, so the sync loop polls it; every handle fault is caught here,
/// logged, and treated as a no-op.
pub struct StreamingBackend {
    handle: EmbedHandle,
    state: PlayerState,
    volume: u8,
}

impl StreamingBackend {
    pub fn new(handle: EmbedHandle) -> Self {
        log::debug!("Streaming backend attached to stream {}", handle.stream_id());
        StreamingBackend {
            handle,
            state: PlayerState::Ready,
            volume: 100,
        }
    }

    pub fn handle_mut(&mut self) -> &mut EmbedHandle {
        &mut self.handle
    }

    fn guard(&self, call: &str) -> bool {
        if self.state == PlayerState::Destroyed {
            log::warn!("Ignoring {} on destroyed streaming backend", call);
            return false;
        }
        true
    }
}

impl MediaBackend for StreamingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Streaming
    }

    fn state(&self) -> PlayerState {
        self.state
    }

    fn play(&mut self) {
        if !self.guard("play") || self.state == PlayerState::Playing {
            return;
        }
        match self.handle.play() {
            Ok(()) => self.state = PlayerState::Playing,
            Err(e) => log::warn!("{}", e),
        }
    }

    fn pause(&mut self) {
        if !self.guard("pause") || self.state != PlayerState::Playing {
            return;
        }
        match self.handle.pause() {
            Ok(()) => self.state = PlayerState::Paused,
            Err(e) => log::warn!("{}", e),
        }
    }

    fn seek(&mut self, target_seconds: f64) {
        if !self.guard("seek") {
            return;
        }
        let target = clamp_seek(target_seconds, self.duration());
        if let Err(e) = self.handle.seek_to(target) {
            log::warn!("{}", e);
        }
    }

    fn current_time(&self) -> f64 {
        match self.handle.current_time() {
            Ok(time) => time,
            Err(e) => {
                log::warn!("{}", e);
                0.0
            }
        }
    }

    fn duration(&self) -> f64 {
        match self.handle.duration() {
            Ok(duration) => duration,
            Err(e) => {
                log::warn!("{}", e);
                0.0
            }
        }
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn set_volume(&mut self, volume: i64) {
        self.volume = clamp_volume(volume);
    }

    fn refresh(&mut self) {
        if !self.guard("refresh") {
            return;
        }
        if let Err(e) = self.handle.poll() {
            log::warn!("{}", e);
            return;
        }
        if self.state == PlayerState::Playing {
            match self.handle.is_at_end() {
                Ok(true) => {
                    let _ = self.handle.pause();
                    self.state = PlayerState::Ended;
                    log::debug!("Streaming backend reached end of media");
                }
                Ok(false) => {}
                Err(e) => log::warn!("{}", e),
            }
        }
    }

    fn needs_polling(&self) -> bool {
        true
    }

    fn destroy(&mut self) {
        if self.state == PlayerState::Destroyed {
            log::warn!("Streaming backend destroyed twice");
            return;
        }
        if let Err(e) = self.handle.disconnect() {
            // Teardown races with the remote side are expected; log and move on.
            log::warn!("{}", e);
        }
        self.state = PlayerState::Destroyed;
        log::info!("Streaming backend destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faulted_handle_is_a_noop() {
        let mut backend = StreamingBackend::new(EmbedHandle::connect("dQw4w9WgXcQ"));
        backend.handle_mut().mark_faulted();
        backend.play();
        assert_eq!(backend.state(), PlayerState::Ready);
        assert_eq!(backend.current_time(), 0.0);
        assert_eq!(backend.duration(), 0.0);
    }

    #[test]
    fn test_seek_clamps_to_reported_duration() {
        let mut handle = EmbedHandle::connect("dQw4w9WgXcQ");
        handle.report_duration(120.0);
        let mut backend = StreamingBackend::new(handle);
        backend.seek(500.0);
        assert_eq!(backend.current_time(), 120.0);
        backend.seek(-4.0);
        assert_eq!(backend.current_time(), 0.0);
    }

    #[test]
    fn test_seek_passes_through_before_metadata() {
        let mut backend = StreamingBackend::new(EmbedHandle::connect("dQw4w9WgXcQ"));
        backend.seek(42.0);
        assert_eq!(backend.current_time(), 42.0);
    }

    #[test]
    fn test_play_pause_cycle() {
        let mut handle = EmbedHandle::connect("dQw4w9WgXcQ");
        handle.report_duration(120.0);
        let mut backend = StreamingBackend::new(handle);
        assert!(!backend.is_playing());
        backend.play();
        assert!(backend.is_playing());
        backend.play(); // idempotent
        assert!(backend.is_playing());
        backend.pause();
        assert_eq!(backend.state(), PlayerState::Paused);
    }

    #[test]
    fn test_destroy_is_terminal() {
        let mut backend = StreamingBackend::new(EmbedHandle::connect("dQw4w9WgXcQ"));
        backend.destroy();
        assert_eq!(backend.state(), PlayerState::Destroyed);
        backend.play();
        assert_eq!(backend.state(), PlayerState::Destroyed);
        backend.destroy(); // logged, not fatal
    }

    #[test]
    fn test_volume_clamp() {
        let mut backend = StreamingBackend::new(EmbedHandle::connect("dQw4w9WgXcQ"));
        backend.set_volume(250);
        assert_eq!(backend.volume(), 100);
        backend.set_volume(-10);
        assert_eq!(backend.volume(), 0);
    }

    #[test]
    fn test_first_poll_completes_metadata_handshake() {
        let mut backend = StreamingBackend::new(EmbedHandle::connect("dQw4w9WgXcQ"));
        assert_eq!(backend.duration(), 0.0);
        backend.refresh();
        assert!(backend.duration() > 0.0);
    }

    #[test]
    fn test_poll_keeps_host_reported_duration() {
        let mut handle = EmbedHandle::connect("dQw4w9WgXcQ");
        handle.report_duration(120.0);
        let mut backend = StreamingBackend::new(handle);
        backend.refresh();
        assert_eq!(backend.duration(), 120.0);
    }

    #[test]
    fn test_streaming_requires_polling() {
        let backend = StreamingBackend::new(EmbedHandle::connect("dQw4w9WgXcQ"));
        assert!(backend.needs_polling());
    }
}
