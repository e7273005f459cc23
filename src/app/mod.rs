mod core;
mod event_bus;
mod event_loop;
mod input_ops;
mod prompt;
mod state;
mod terminal_session;

#[cfg(test)]
mod tests;

pub use core::App;
pub use state::{AppState, Mode, StatusState};

pub(crate) use prompt::Prompt;
