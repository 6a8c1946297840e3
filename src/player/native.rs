use crate::player::backend::{clamp_seek, clamp_volume, BackendKind, MediaBackend, PlayerState};
use crate::player::clock::TransportClock;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Local-file playback element, the desktop equivalent of a native media
/// element. Audio goes through a rodio sink; position is tracked by the
/// transport clock so the element works even when no audio device or no
/// decodable audio track is available.
pub struct NativeBackend {
    path: PathBuf,
    clock: TransportClock,
    state: PlayerState,
    volume: u8,
    sink: Option<Sink>,
    stream: Option<(OutputStream, OutputStreamHandle)>,
}

impl NativeBackend {
    /// Opens the file and probes its duration. Failure to open the file at
    /// all is a construction error the controller catches; a file without a
    /// decodable audio track still yields a working (clock-only) element.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open media file {}: {}", path.display(), e))?;

        let mut backend = NativeBackend {
            path: path.to_path_buf(),
            clock: TransportClock::new(),
            state: PlayerState::Uninitialized,
            volume: 100,
            sink: None,
            stream: None,
        };

        match Decoder::new(BufReader::new(file)) {
            Ok(decoder) => {
                let duration = decoder
                    .total_duration()
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0);
                backend.clock.set_duration(duration);
                log::info!(
                    "Opened local media {} (duration {})",
                    path.display(),
                    if duration > 0.0 { format!("{:.3}s", duration) } else { "unknown".to_string() }
                );
            }
            Err(e) => {
                log::warn!(
                    "No decodable audio in {}: {}. Continuing with clock-only transport.",
                    path.display(),
                    e
                );
            }
        }

        backend.stream = match OutputStream::try_default() {
            Ok(pair) => Some(pair),
            Err(e) => {
                log::warn!("No audio output device available: {}", e);
                None
            }
        };

        backend.state = PlayerState::Ready;
        backend.rebuild_sink(0.0);
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drops the current sink and re-decodes from `position`. rodio sinks
    /// cannot seek in place, so every seek rebuilds the pipeline.
    fn rebuild_sink(&mut self, position: f64) {
        self.sink = None;
        let Some((_, handle)) = &self.stream else {
            return;
        };

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Failed to reopen {} for playback: {}", self.path.display(), e);
                return;
            }
        };
        let decoder = match Decoder::new(BufReader::new(file)) {
            Ok(decoder) => decoder,
            Err(_) => return, // already logged at open
        };

        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.set_volume(self.volume as f32 / 100.0);
                sink.append(decoder.skip_duration(Duration::from_secs_f64(position.max(0.0))));
                sink.pause();
                self.sink = Some(sink);
            }
            Err(e) => {
                log::warn!("Failed to create audio sink: {}", e);
            }
        }
    }

    fn guard(&self, call: &str) -> bool {
        match self.state {
            PlayerState::Destroyed => {
                log::warn!("Ignoring {} on destroyed native backend", call);
                false
            }
            PlayerState::Uninitialized => {
                log::warn!("Ignoring {} on uninitialized native backend", call);
                false
            }
            _ => true,
        }
    }
}

impl MediaBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn state(&self) -> PlayerState {
        self.state
    }

    fn play(&mut self) {
        if !self.guard("play") || self.state == PlayerState::Playing {
            return;
        }
        self.clock.play();
        if let Some(sink) = &self.sink {
            sink.play();
        }
        self.state = PlayerState::Playing;
    }

    fn pause(&mut self) {
        if !self.guard("pause") || self.state != PlayerState::Playing {
            return;
        }
        self.clock.pause();
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.state = PlayerState::Paused;
    }

    fn seek(&mut self, target_seconds: f64) {
        if !self.guard("seek") {
            return;
        }
        let target = clamp_seek(target_seconds, self.clock.duration());
        self.clock.seek(target);
        let resume = self.state == PlayerState::Playing;
        self.rebuild_sink(target);
        if let Some(sink) = &self.sink {
            if resume {
                sink.play();
            }
        }
        if self.state == PlayerState::Ended && self.clock.duration() > 0.0 && target < self.clock.duration() {
            self.state = PlayerState::Paused;
        }
    }

    fn current_time(&self) -> f64 {
        self.clock.position()
    }

    fn duration(&self) -> f64 {
        self.clock.duration()
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn set_volume(&mut self, volume: i64) {
        self.volume = clamp_volume(volume);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume as f32 / 100.0);
        }
    }

    fn refresh(&mut self) {
        if self.state == PlayerState::Playing && self.clock.reached_end() {
            self.clock.pause();
            if let Some(sink) = &self.sink {
                sink.pause();
            }
            self.state = PlayerState::Ended;
            log::debug!("Native backend reached end of media");
        }
    }

    fn destroy(&mut self) {
        if self.state == PlayerState::Destroyed {
            log::warn!("Native backend destroyed twice");
            return;
        }
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.stream = None;
        self.clock.pause();
        self.state = PlayerState::Destroyed;
        log::info!("Native backend destroyed ({})", self.path.display());
    }
}

impl Drop for NativeBackend {
    fn drop(&mut self) {
        if self.state != PlayerState::Destroyed {
            log::warn!("Native backend dropped without destroy; tearing down");
            self.destroy();
        }
    }
}
