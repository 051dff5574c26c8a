pub mod config;
pub mod routine;
pub mod sound;
pub mod timeline;
pub mod workout;
