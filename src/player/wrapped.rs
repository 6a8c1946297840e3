use crate::player::backend::{BackendKind, MediaBackend, PlayerState};
use crate::player::native::NativeBackend;

/// Decorator around a ready native element, the counterpart of wrapping a
/// media element with a polished third-party player once it reports it can
/// play. Owns the inner element exclusively and keeps control calls away
/// from it after teardown.
pub struct WrappedBackend {
    inner: Option<NativeBackend>,
    destroyed: bool,
}

impl WrappedBackend {
    /// Wrapping only makes sense once the element is past `Uninitialized`.
    pub fn wrap(inner: NativeBackend) -> Self {
        debug_assert!(inner.state() != PlayerState::Uninitialized);
        WrappedBackend {
            inner: Some(inner),
            destroyed: false,
        }
    }

    fn inner(&self) -> Option<&NativeBackend> {
        if self.destroyed {
            log::warn!("Ignoring call on destroyed wrapped backend");
            return None;
        }
        self.inner.as_ref()
    }

    fn inner_mut(&mut self) -> Option<&mut NativeBackend> {
        if self.destroyed {
            log::warn!("Ignoring call on destroyed wrapped backend");
            return None;
        }
        self.inner.as_mut()
    }
}

impl MediaBackend for WrappedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Wrapped
    }

    fn state(&self) -> PlayerState {
        if self.destroyed {
            return PlayerState::Destroyed;
        }
        self.inner.as_ref().map(|b| b.state()).unwrap_or(PlayerState::Destroyed)
    }

    fn play(&mut self) {
        if let Some(inner) = self.inner_mut() {
            inner.play();
        }
    }

    fn pause(&mut self) {
        if let Some(inner) = self.inner_mut() {
            inner.pause();
        }
    }

    fn seek(&mut self, target_seconds: f64) {
        if let Some(inner) = self.inner_mut() {
            inner.seek(target_seconds);
        }
    }

    fn current_time(&self) -> f64 {
        self.inner().map(|b| b.current_time()).unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        self.inner().map(|b| b.duration()).unwrap_or(0.0)
    }

    fn volume(&self) -> u8 {
        self.inner().map(|b| b.volume()).unwrap_or(0)
    }

    fn set_volume(&mut self, volume: i64) {
        if let Some(inner) = self.inner_mut() {
            inner.set_volume(volume);
        }
    }

    fn refresh(&mut self) {
        if let Some(inner) = self.inner_mut() {
            inner.refresh();
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            log::warn!("Wrapped backend destroyed twice");
            return;
        }
        if let Some(mut inner) = self.inner.take() {
            inner.destroy();
        }
        self.destroyed = true;
        log::info!("Wrapped backend destroyed");
    }
}
