use crate::player::backend::{MediaBackend, PlayerState};
use crate::player::native::NativeBackend;
use crate::player::streaming::{EmbedHandle, StreamingBackend};
use crate::player::wrapped::WrappedBackend;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SourceError {
    #[error("Invalid URL.")]
    InvalidStreamUrl,
    #[error("Failed to load media: {0}")]
    BackendInit(String),
}

/// Handle for the local source reference handed to the active element. Must
/// be revoked during teardown; dropping one un-revoked is a resource leak.
#[derive(Debug)]
pub struct SourceUrl {
    path: PathBuf,
    revoked: bool,
}

impl SourceUrl {
    pub fn new(path: &Path) -> Self {
        SourceUrl {
            path: path.to_path_buf(),
            revoked: false,
        }
    }

    pub fn revoke(&mut self) {
        if !self.revoked {
            log::debug!("Revoked source url for {}", self.path.display());
            self.revoked = true;
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }
}

impl Drop for SourceUrl {
    fn drop(&mut self) {
        if !self.revoked {
            log::warn!("Source url for {} dropped without revoke", self.path.display());
        }
    }
}

/// Exclusive owner of the active backend and the source url. No other
/// component constructs or destroys backends; everything else goes through
/// the [`MediaBackend`] contract exposed by [`PlaybackController::backend`].
pub struct PlaybackController {
    active: Option<Box<dyn MediaBackend>>,
    source_url: Option<SourceUrl>,
    embed_api_ready: bool,
    /// Stream id queued while the embed API is still initializing. Nulled
    /// before any newer load so a late ready callback cannot resurrect a
    /// torn-down backend.
    pending_stream_load: Option<String>,
}

impl PlaybackController {
    pub fn new() -> Self {
        PlaybackController {
            active: None,
            source_url: None,
            embed_api_ready: false,
            pending_stream_load: None,
        }
    }

    pub fn backend(&self) -> Option<&dyn MediaBackend> {
        self.active.as_deref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut (dyn MediaBackend + 'static)> {
        self.active.as_deref_mut()
    }

    /// Ready means tagging and transport controls may be enabled: an active
    /// backend past construction with its metadata known.
    pub fn backend_ready(&self) -> bool {
        self.active
            .as_deref()
            .map(|b| {
                !matches!(b.state(), PlayerState::Uninitialized | PlayerState::Destroyed)
                    && b.duration() > 0.0
            })
            .unwrap_or(false)
    }

    pub fn current_time(&self) -> f64 {
        self.active.as_deref().map(|b| b.current_time()).unwrap_or(0.0)
    }

    pub fn duration(&self) -> f64 {
        self.active.as_deref().map(|b| b.duration()).unwrap_or(0.0)
    }

    pub fn is_playing(&self) -> bool {
        self.active.as_deref().map(|b| b.is_playing()).unwrap_or(false)
    }

    /// Destroy-old-then-construct-new: teardown has fully completed before
    /// the new backend becomes visible to anyone.
    pub(crate) fn activate(&mut self, backend: Box<dyn MediaBackend>) {
        self.teardown();
        log::info!("Activating {:?} backend", backend.kind());
        self.active = Some(backend);
    }

    /// Full teardown sequence: invalidate any deferred load, destroy the
    /// active backend, revoke the source url. Safe to call when idle.
    pub fn teardown(&mut self) {
        self.pending_stream_load = None;
        if let Some(mut backend) = self.active.take() {
            backend.destroy();
        }
        if let Some(mut url) = self.source_url.take() {
            url.revoke();
        }
    }

    /// Loads a local media file. The previous backend is fully torn down
    /// first; on construction failure the controller stays in the idle state.
    pub fn load_local_source(&mut self, path: &Path) -> Result<(), SourceError> {
        self.teardown();

        let native = match NativeBackend::open(path) {
            Ok(native) => native,
            Err(e) => {
                log::error!("Backend construction failed: {}", e);
                return Err(SourceError::BackendInit(e.to_string()));
            }
        };
        self.source_url = Some(SourceUrl::new(path));

        // Wrap the element once it can play (metadata known); otherwise keep
        // the bare element so duration can still arrive later.
        let backend: Box<dyn MediaBackend> = if native.duration() > 0.0 {
            Box::new(WrappedBackend::wrap(native))
        } else {
            Box::new(native)
        };
        log::info!("Activating {:?} backend", backend.kind());
        self.active = Some(backend);
        Ok(())
    }

    /// Loads a streaming source from a URL. Construction is deferred while
    /// the embed API is still initializing and resolved by
    /// [`PlaybackController::on_embed_api_ready`].
    pub fn load_streaming_source(&mut self, url: &str) -> Result<(), SourceError> {
        let stream_id = extract_stream_id(url).ok_or(SourceError::InvalidStreamUrl)?;
        self.teardown();

        if !self.embed_api_ready {
            log::info!("Embed API not ready; deferring load of stream {}", stream_id);
            self.pending_stream_load = Some(stream_id);
            return Ok(());
        }

        let backend = StreamingBackend::new(EmbedHandle::connect(&stream_id));
        log::info!("Activating {:?} backend", backend.kind());
        self.active = Some(Box::new(backend));
        Ok(())
    }

    /// Embed API ready callback. Resolves a queued streaming load, if any
    /// load is still pending.
    pub fn on_embed_api_ready(&mut self) {
        self.embed_api_ready = true;
        if let Some(stream_id) = self.pending_stream_load.take() {
            let backend = StreamingBackend::new(EmbedHandle::connect(&stream_id));
            log::info!("Resolved deferred load; activating {:?} backend", backend.kind());
            self.active = Some(Box::new(backend));
        }
    }

    pub fn has_pending_stream_load(&self) -> bool {
        self.pending_stream_load.is_some()
    }

    pub fn toggle_playback(&mut self) {
        if let Some(backend) = self.active.as_deref_mut() {
            if backend.is_playing() {
                backend.pause();
            } else {
                backend.play();
            }
        }
    }

    pub fn seek_to(&mut self, seconds: f64) {
        if let Some(backend) = self.active.as_deref_mut() {
            backend.seek(seconds);
        }
    }

    /// Jumps to a `HH:MM:SS[.mmm]` / `MM:SS[.mmm]` / `SS[.mmm]` target.
    /// Malformed or negative input is silently ignored.
    pub fn jump_to_time(&mut self, text: &str) {
        let Some(seconds) = parse_jump_time(text) else {
            log::debug!("Ignoring invalid jump target {:?}", text);
            return;
        };
        self.seek_to(seconds);
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

const STREAM_ID_LEN: usize = 11;

fn is_stream_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Extracts the canonical 11-character media identifier following `v=`,
/// `/embed/`, or a short-link path segment. Anything else is rejected.
pub fn extract_stream_id(url: &str) -> Option<String> {
    for marker in ["v=", "/embed/", "youtu.be/"] {
        let mut search_from = 0;
        while let Some(found) = url[search_from..].find(marker) {
            let token_start = search_from + found + marker.len();
            let token: String = url[token_start..]
                .chars()
                .take_while(|c| is_stream_id_char(*c))
                .take(STREAM_ID_LEN)
                .collect();
            if token.len() == STREAM_ID_LEN {
                return Some(token);
            }
            search_from = token_start;
        }
    }
    None
}

/// Parses colon-delimited jump text; each component is a float. Returns
/// `None` for malformed or negative input.
pub fn parse_jump_time(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split(':').collect();
    let seconds = match parts.as_slice() {
        [h, m, s] => parse_component(h)? * 3600.0 + parse_component(m)? * 60.0 + parse_component(s)?,
        [m, s] => parse_component(m)? * 60.0 + parse_component(s)?,
        [s] => parse_component(s)?,
        _ => return None,
    };
    if seconds.is_nan() || seconds < 0.0 {
        return None;
    }
    Some(seconds)
}

fn parse_component(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    if value < 0.0 {
        return None;
    }
    Some(value)
}
