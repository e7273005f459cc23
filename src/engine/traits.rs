use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::error::AppResult;
use crate::source::Source;

/// Engine construction parameters. Passed explicitly to the engine once at
/// startup; instances are shared via `Arc`, nothing is process-global.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_document_bytes: u64,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            redirect_limit: 5,
            max_document_bytes: 200 * 1024 * 1024,
            user_agent: concat!("mgl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// One load attempt gone wrong. A value carried in session state, distinct
/// from the program-level `AppError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadErrorKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    MalformedDocument,
    Cancelled,
    Engine,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(LoadErrorKind::Cancelled, "load was cancelled")
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::Engine, message)
    }

    pub fn is_cancellation(&self) -> bool {
        self.kind == LoadErrorKind::Cancelled
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LoadErrorKind::InvalidUrl => write!(f, "invalid URL: {}", self.message),
            LoadErrorKind::HttpStatus(code) => write!(f, "HTTP {code}: {}", self.message),
            LoadErrorKind::Timeout => write!(f, "timed out: {}", self.message),
            LoadErrorKind::Network => write!(f, "network error: {}", self.message),
            LoadErrorKind::TooLarge { max_bytes, actual } => match actual {
                Some(actual) => write!(
                    f,
                    "document too large: {actual} bytes exceeds the {max_bytes} byte limit"
                ),
                None => write!(f, "document exceeds the {max_bytes} byte limit"),
            },
            LoadErrorKind::MalformedDocument => {
                write!(f, "malformed document: {}", self.message)
            }
            LoadErrorKind::Cancelled => write!(f, "cancelled: {}", self.message),
            LoadErrorKind::Engine => write!(f, "engine error: {}", self.message),
        }
    }
}

impl std::error::Error for LoadError {}

/// Cooperative cancellation flag shared between the session and the
/// engine's load task. Idempotent and safe to trip after completion.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub enum TaskEvent {
    Progress { loaded: u64, total: u64 },
    Finished(Result<Box<dyn DocumentHandle>, LoadError>),
}

impl fmt::Debug for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progress { loaded, total } => f
                .debug_struct("Progress")
                .field("loaded", loaded)
                .field("total", total)
                .finish(),
            Self::Finished(Ok(document)) => {
                write!(f, "Finished(Ok({} pages))", document.page_count())
            }
            Self::Finished(Err(err)) => write!(f, "Finished(Err({err:?}))"),
        }
    }
}

/// An in-flight load handed out by the engine: an ordered event stream
/// (progress events, then exactly one terminal event) plus the cancel flag.
/// Dropping the task discards any events still queued.
pub struct LoadTask {
    events: UnboundedReceiver<TaskEvent>,
    cancel: CancelHandle,
}

impl LoadTask {
    /// Creates the channel pair an engine wires a load through.
    pub fn channel() -> (UnboundedSender<TaskEvent>, LoadTask) {
        let (tx, rx) = unbounded_channel();
        let task = LoadTask {
            events: rx,
            cancel: CancelHandle::new(),
        };
        (tx, task)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn recv_event(&mut self) -> Option<TaskEvent> {
        self.events.recv().await
    }

    pub fn try_recv_event(&mut self) -> Option<TaskEvent> {
        self.events.try_recv().ok()
    }
}

/// Opaque handle to a successfully loaded document. Owns the parsed
/// document; dropping it is the release.
pub trait DocumentHandle: Send {
    fn doc_id(&self) -> u64;
    fn page_count(&self) -> usize;
    fn page_dimensions(&self, page: usize) -> AppResult<(f32, f32)>;
    fn byte_len(&self) -> usize;
}

impl fmt::Debug for dyn DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("doc_id", &self.doc_id())
            .field("page_count", &self.page_count())
            .finish_non_exhaustive()
    }
}

pub trait DocumentEngine: Send + Sync {
    /// Starts loading `source` and returns the in-flight task. Never
    /// blocks and never fails directly; failures arrive as the task's
    /// terminal event.
    fn begin_load(&self, source: Source) -> LoadTask;
}
