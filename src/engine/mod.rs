mod fetch;
mod hayro;
mod traits;

pub use hayro::{HayroDocument, HayroEngine};
pub use traits::{
    CancelHandle, DocumentEngine, DocumentHandle, EngineConfig, LoadError, LoadErrorKind,
    LoadTask, TaskEvent,
};
