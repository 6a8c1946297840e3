pub mod backend;
pub mod clock;
pub mod controller;
pub mod native;
pub mod streaming;
pub mod sync;
pub mod wrapped;

pub use controller::PlaybackController;
pub use sync::ControlSyncLoop;
