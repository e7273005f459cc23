use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

use hayro::hayro_syntax::Pdf;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{AppError, AppResult};
use crate::source::Source;

use super::fetch::RemoteFetcher;
use super::traits::{
    CancelHandle, DocumentEngine, DocumentHandle, EngineConfig, LoadError, LoadErrorKind,
    LoadTask, TaskEvent,
};

/// Default engine: fetches remote sources over HTTP, parses with hayro on
/// a blocking thread, and hands back `HayroDocument` handles.
pub struct HayroEngine {
    fetcher: RemoteFetcher,
    runtime: EngineRuntime,
}

impl HayroEngine {
    pub fn new(config: EngineConfig) -> AppResult<Self> {
        let fetcher = RemoteFetcher::new(&config)
            .map_err(|err| AppError::config(err, "building the HTTP client"))?;
        Ok(Self {
            fetcher,
            runtime: EngineRuntime::new(),
        })
    }
}

impl DocumentEngine for HayroEngine {
    fn begin_load(&self, source: Source) -> LoadTask {
        let (events, task) = LoadTask::channel();
        let cancel = task.cancel_handle();
        let fetcher = self.fetcher.clone();
        self.runtime.spawn(async move {
            let outcome = run_load(source, fetcher, &cancel, &events).await;
            let _ = events.send(TaskEvent::Finished(outcome));
        });
        task
    }
}

struct EngineRuntime {
    _owned: Option<Runtime>,
    handle: Handle,
}

impl EngineRuntime {
    fn new() -> Self {
        if let Ok(handle) = Handle::try_current() {
            return Self {
                _owned: None,
                handle,
            };
        }

        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("mgl-engine")
            .build()
            .expect("engine runtime should initialize");
        let handle = runtime.handle().clone();
        Self {
            _owned: Some(runtime),
            handle,
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(task);
    }
}

async fn run_load(
    source: Source,
    fetcher: RemoteFetcher,
    cancel: &CancelHandle,
    events: &UnboundedSender<TaskEvent>,
) -> Result<Box<dyn DocumentHandle>, LoadError> {
    let identity = source.identity_key();
    let bytes: Arc<Vec<u8>> = match source {
        Source::Bytes(buffer) => {
            let len = buffer.len() as u64;
            let _ = events.send(TaskEvent::Progress {
                loaded: len,
                total: len,
            });
            buffer.shared()
        }
        Source::RemoteUrl(url) => Arc::new(fetcher.fetch(&url, cancel, events).await?),
    };

    if cancel.is_cancelled() {
        return Err(LoadError::cancelled());
    }

    let started = Instant::now();
    let parsed = tokio::task::spawn_blocking(move || parse_document(&identity, bytes))
        .await
        .map_err(|err| LoadError::engine(format!("parse task failed: {err}")))??;
    log::debug!(
        "parsed document with {} pages in {:?}",
        parsed.page_count(),
        started.elapsed()
    );

    if cancel.is_cancelled() {
        return Err(LoadError::cancelled());
    }
    Ok(Box::new(parsed))
}

fn parse_document(identity: &str, bytes: Arc<Vec<u8>>) -> Result<HayroDocument, LoadError> {
    if !bytes.as_slice().starts_with(b"%PDF-") {
        return Err(LoadError::new(
            LoadErrorKind::MalformedDocument,
            "input does not carry a PDF header",
        ));
    }

    let byte_len = bytes.len();
    let doc_id = calculate_doc_id(identity, byte_len);
    let pdf = Pdf::new(bytes).map_err(|_| {
        LoadError::new(
            LoadErrorKind::MalformedDocument,
            "failed to parse PDF with hayro",
        )
    })?;

    Ok(HayroDocument {
        doc_id,
        byte_len,
        pdf,
    })
}

pub struct HayroDocument {
    doc_id: u64,
    byte_len: usize,
    pdf: Pdf,
}

impl std::fmt::Debug for HayroDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HayroDocument")
            .field("doc_id", &self.doc_id)
            .field("byte_len", &self.byte_len)
            .finish_non_exhaustive()
    }
}

impl DocumentHandle for HayroDocument {
    fn doc_id(&self) -> u64 {
        self.doc_id
    }

    fn page_count(&self) -> usize {
        self.pdf.pages().len()
    }

    fn page_dimensions(&self, page: usize) -> AppResult<(f32, f32)> {
        let page_ref = self
            .pdf
            .pages()
            .get(page)
            .ok_or(AppError::invalid_argument("page index is out of range"))?;
        Ok(page_ref.render_dimensions())
    }

    fn byte_len(&self) -> usize {
        self.byte_len
    }
}

fn calculate_doc_id(identity: &str, byte_len: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    identity.hash(&mut hasher);
    byte_len.hash(&mut hasher);
    hasher.finish()
}
