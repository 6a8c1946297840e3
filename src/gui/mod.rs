pub mod app;
pub mod tag_list;
pub mod timeline;


pub use app::*;
