pub mod config;
pub mod session;
pub mod summary;
pub mod tag;
pub mod timefmt;

#[cfg(test)]
mod config_test;

pub use config::*;
pub use session::*;
pub use summary::*;
pub use tag::*;
