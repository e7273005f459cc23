pub mod app;
pub mod config;
pub mod engine;
pub mod error;
mod event;
pub mod highlights;
pub mod loader;
pub mod source;
pub mod ui;

pub use app::App;
pub use engine::HayroEngine;
