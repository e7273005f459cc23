mod progress;
mod session;
mod view;

pub use progress::{ProgressSnapshot, format_bytes};
pub use session::{LoadPhase, LoadSession, SessionEvent};
pub use view::{LoadView, dispatch};
