use std::fmt;
use std::future;
use std::sync::Arc;

use crate::engine::{DocumentEngine, DocumentHandle, LoadError, LoadTask, TaskEvent};
use crate::source::Source;

use super::progress::ProgressSnapshot;

/// Observable state of the current load. Exactly one variant holds at any
/// moment; progress, document, and error can never coexist.
pub enum LoadPhase {
    Idle,
    Loading { progress: Option<ProgressSnapshot> },
    Ready { document: Box<dyn DocumentHandle> },
    Failed { error: LoadError },
}

impl fmt::Debug for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Loading { progress } => f.debug_struct("Loading").field("progress", progress).finish(),
            Self::Ready { document } => write!(f, "Ready({} pages)", document.page_count()),
            Self::Failed { error } => f.debug_tuple("Failed").field(error).finish(),
        }
    }
}

/// A task event tagged with the generation it belongs to. Produced by
/// [`LoadSession::next_event`] and fed back through
/// [`LoadSession::apply_event`].
#[derive(Debug)]
pub struct SessionEvent {
    generation: u64,
    event: TaskEvent,
}

struct ActiveLoad {
    generation: u64,
    task: LoadTask,
}

impl Drop for ActiveLoad {
    fn drop(&mut self) {
        self.task.cancel();
    }
}

/// Owns the load lifecycle for one source slot: at most one in-flight task,
/// a generation counter guarding against superseded completions, and the
/// phase the UI renders from. Dropping the session cancels any in-flight
/// task and releases a held document.
pub struct LoadSession {
    engine: Arc<dyn DocumentEngine>,
    source: Option<Source>,
    generation: u64,
    active: Option<ActiveLoad>,
    phase: LoadPhase,
}

impl LoadSession {
    pub fn new(engine: Arc<dyn DocumentEngine>) -> Self {
        Self {
            engine,
            source: None,
            generation: 0,
            active: None,
            phase: LoadPhase::Idle,
        }
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading { .. })
    }

    pub fn document(&self) -> Option<&dyn DocumentHandle> {
        match &self.phase {
            LoadPhase::Ready { document } => Some(document.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LoadError> {
        match &self.phase {
            LoadPhase::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Replaces the current source. Equal values are a no-op. Otherwise the
    /// previous task is cancelled and discarded, a held document is
    /// released, progress and error are cleared, and a fresh load starts
    /// (or the session goes idle for `None`).
    pub fn set_source(&mut self, source: Option<Source>) -> bool {
        if self.source == source {
            return false;
        }

        self.generation = self.generation.saturating_add(1);
        self.active = None;
        self.phase = match &source {
            Some(_) => LoadPhase::Loading { progress: None },
            None => LoadPhase::Idle,
        };
        self.source = source;

        if let Some(source) = self.source.clone() {
            log::info!("loading {}", source.label());
            let task = self.engine.begin_load(source);
            self.active = Some(ActiveLoad {
                generation: self.generation,
                task,
            });
        }
        true
    }

    /// Awaits the next event of the active task. Pends forever while no
    /// task is active, so it composes into a `select!` loop. A channel that
    /// closes without a terminal event is reported as an engine failure.
    pub async fn next_event(&mut self) -> SessionEvent {
        let Some(active) = self.active.as_mut() else {
            return future::pending().await;
        };
        let generation = active.generation;
        match active.task.recv_event().await {
            Some(event) => SessionEvent { generation, event },
            None => SessionEvent {
                generation,
                event: TaskEvent::Finished(Err(LoadError::engine(
                    "load task ended without a terminal event",
                ))),
            },
        }
    }

    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        let active = self.active.as_mut()?;
        let generation = active.generation;
        let event = active.task.try_recv_event()?;
        Some(SessionEvent { generation, event })
    }

    /// Applies a received event to the phase. Returns whether state
    /// changed. Events from a superseded generation are ignored, and a
    /// cancellation outcome is suppressed rather than stored as a failure.
    pub fn apply_event(&mut self, event: SessionEvent) -> bool {
        if event.generation != self.generation {
            return false;
        }

        match event.event {
            TaskEvent::Progress { loaded, total } => {
                let LoadPhase::Loading { progress } = &mut self.phase else {
                    return false;
                };
                *progress = ProgressSnapshot::accept(loaded, total);
                true
            }
            TaskEvent::Finished(outcome) => {
                self.active = None;
                match outcome {
                    Ok(document) => {
                        log::info!("document ready: {} pages", document.page_count());
                        self.phase = LoadPhase::Ready { document };
                    }
                    Err(error) if error.is_cancellation() => {
                        log::debug!("load cancelled");
                        self.phase = LoadPhase::Idle;
                    }
                    Err(error) => {
                        log::warn!("load failed: {error}");
                        self.phase = LoadPhase::Failed { error };
                    }
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::sync::mpsc::UnboundedSender;

    use crate::engine::{
        CancelHandle, DocumentEngine, DocumentHandle, LoadError, LoadErrorKind, LoadTask,
        TaskEvent,
    };
    use crate::error::AppResult;
    use crate::source::Source;

    use super::{LoadPhase, LoadSession, SessionEvent};

    struct FakeLoad {
        events: Option<UnboundedSender<TaskEvent>>,
        cancel: CancelHandle,
    }

    #[derive(Default)]
    struct FakeEngine {
        loads: Mutex<Vec<FakeLoad>>,
    }

    impl FakeEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn load_count(&self) -> usize {
            self.loads.lock().expect("fake engine lock").len()
        }

        fn is_cancelled(&self, index: usize) -> bool {
            self.loads.lock().expect("fake engine lock")[index]
                .cancel
                .is_cancelled()
        }

        fn send(&self, index: usize, event: TaskEvent) -> bool {
            let loads = self.loads.lock().expect("fake engine lock");
            match &loads[index].events {
                Some(events) => events.send(event).is_ok(),
                None => false,
            }
        }

        fn close(&self, index: usize) {
            self.loads.lock().expect("fake engine lock")[index]
                .events
                .take();
        }
    }

    impl DocumentEngine for FakeEngine {
        fn begin_load(&self, _source: Source) -> LoadTask {
            let (events, task) = LoadTask::channel();
            self.loads.lock().expect("fake engine lock").push(FakeLoad {
                events: Some(events),
                cancel: task.cancel_handle(),
            });
            task
        }
    }

    struct FakeDocument {
        pages: usize,
        released: Arc<AtomicUsize>,
    }

    impl FakeDocument {
        fn boxed(pages: usize, released: &Arc<AtomicUsize>) -> Box<dyn DocumentHandle> {
            Box::new(Self {
                pages,
                released: Arc::clone(released),
            })
        }
    }

    impl DocumentHandle for FakeDocument {
        fn doc_id(&self) -> u64 {
            1
        }

        fn page_count(&self) -> usize {
            self.pages
        }

        fn page_dimensions(&self, _page: usize) -> AppResult<(f32, f32)> {
            Ok((612.0, 792.0))
        }

        fn byte_len(&self) -> usize {
            0
        }
    }

    impl Drop for FakeDocument {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn url(text: &str) -> Option<Source> {
        Some(Source::remote_url(text))
    }

    fn pump(session: &mut LoadSession) -> usize {
        let mut applied = 0;
        while let Some(event) = session.try_next_event() {
            if session.apply_event(event) {
                applied += 1;
            }
        }
        applied
    }

    fn snapshot(session: &LoadSession) -> Option<(u64, u64)> {
        match session.phase() {
            LoadPhase::Loading { progress } => {
                progress.map(|snapshot| (snapshot.loaded(), snapshot.total()))
            }
            _ => None,
        }
    }

    #[test]
    fn set_source_starts_a_single_load() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());

        assert!(session.set_source(url("https://example.com/a.pdf")));
        assert_eq!(engine.load_count(), 1);
        assert!(matches!(
            session.phase(),
            LoadPhase::Loading { progress: None }
        ));
        assert!(session.try_next_event().is_none());
    }

    #[test]
    fn source_change_cancels_the_previous_task_before_starting_the_next() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());

        session.set_source(url("https://example.com/a.pdf"));
        assert!(!engine.is_cancelled(0));

        session.set_source(url("https://example.com/b.pdf"));
        assert!(engine.is_cancelled(0));
        assert_eq!(engine.load_count(), 2);
        assert!(!engine.is_cancelled(1));
        assert!(matches!(
            session.phase(),
            LoadPhase::Loading { progress: None }
        ));
    }

    #[test]
    fn progress_then_success_reaches_ready_with_no_retained_progress() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());
        session.set_source(url("https://example.com/a.pdf"));

        engine.send(
            0,
            TaskEvent::Progress {
                loaded: 10,
                total: 100,
            },
        );
        pump(&mut session);
        assert_eq!(snapshot(&session), Some((10, 100)));

        engine.send(
            0,
            TaskEvent::Progress {
                loaded: 100,
                total: 100,
            },
        );
        pump(&mut session);
        assert_eq!(snapshot(&session), Some((100, 100)));

        let released = Arc::new(AtomicUsize::new(0));
        engine.send(
            0,
            TaskEvent::Finished(Ok(FakeDocument::boxed(12, &released))),
        );
        pump(&mut session);

        let document = session.document().expect("document should be ready");
        assert_eq!(document.page_count(), 12);
        assert_eq!(snapshot(&session), None);
        assert_eq!(released.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_progress_clears_the_snapshot() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());
        session.set_source(url("https://example.com/a.pdf"));

        engine.send(
            0,
            TaskEvent::Progress {
                loaded: 10,
                total: 100,
            },
        );
        pump(&mut session);
        assert_eq!(snapshot(&session), Some((10, 100)));

        engine.send(
            0,
            TaskEvent::Progress {
                loaded: 150,
                total: 100,
            },
        );
        pump(&mut session);
        assert_eq!(snapshot(&session), None);
        assert!(session.is_loading());
    }

    #[test]
    fn failure_surfaces_the_error_and_a_restart_clears_it() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());
        session.set_source(url("https://example.com/a.pdf"));

        engine.send(
            0,
            TaskEvent::Finished(Err(LoadError::new(LoadErrorKind::Network, "boom"))),
        );
        pump(&mut session);
        let error = session.error().expect("failure should be stored");
        assert_eq!(error.kind, LoadErrorKind::Network);

        session.set_source(url("https://example.com/b.pdf"));
        assert!(session.error().is_none());
        assert!(matches!(
            session.phase(),
            LoadPhase::Loading { progress: None }
        ));
    }

    #[test]
    fn stale_generation_events_are_ignored() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());
        session.set_source(url("https://example.com/a.pdf"));
        let stale_generation = session.generation();

        session.set_source(url("https://example.com/b.pdf"));

        let released = Arc::new(AtomicUsize::new(0));
        let stale = SessionEvent {
            generation: stale_generation,
            event: TaskEvent::Finished(Ok(FakeDocument::boxed(3, &released))),
        };
        assert!(!session.apply_event(stale));
        assert!(matches!(
            session.phase(),
            LoadPhase::Loading { progress: None }
        ));
        // the unapplied handle was dropped with the event
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancellation_outcome_never_surfaces_as_a_failure() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());
        session.set_source(url("https://example.com/a.pdf"));

        engine.send(0, TaskEvent::Finished(Err(LoadError::cancelled())));
        let applied = pump(&mut session);
        assert_eq!(applied, 1);
        assert!(session.error().is_none());
        assert!(matches!(session.phase(), LoadPhase::Idle));
    }

    #[test]
    fn superseded_success_does_not_leak_its_document() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());
        session.set_source(url("https://example.com/a.pdf"));

        let released = Arc::new(AtomicUsize::new(0));
        engine.send(
            0,
            TaskEvent::Finished(Ok(FakeDocument::boxed(5, &released))),
        );

        // supersede without ever applying the queued success
        session.set_source(url("https://example.com/b.pdf"));
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(engine.is_cancelled(0));
    }

    #[test]
    fn teardown_releases_a_ready_document_exactly_once() {
        let engine = FakeEngine::new();
        let released = Arc::new(AtomicUsize::new(0));
        {
            let mut session = LoadSession::new(engine.clone());
            session.set_source(url("https://example.com/a.pdf"));
            engine.send(
                0,
                TaskEvent::Finished(Ok(FakeDocument::boxed(5, &released))),
            );
            pump(&mut session);
            assert!(session.document().is_some());
            assert_eq!(released.load(Ordering::SeqCst), 0);
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn teardown_mid_flight_cancels_the_task() {
        let engine = FakeEngine::new();
        {
            let mut session = LoadSession::new(engine.clone());
            session.set_source(url("https://example.com/a.pdf"));
            assert!(!engine.is_cancelled(0));
        }
        assert!(engine.is_cancelled(0));
    }

    #[test]
    fn equal_source_values_are_a_no_op() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());

        assert!(session.set_source(url("https://example.com/a.pdf")));
        let generation = session.generation();

        assert!(!session.set_source(url("https://example.com/a.pdf")));
        assert_eq!(engine.load_count(), 1);
        assert_eq!(session.generation(), generation);

        let bytes = Source::from_bytes(vec![1, 2, 3]);
        assert!(session.set_source(Some(bytes.clone())));
        assert!(!session.set_source(Some(Source::from_bytes(vec![1, 2, 3]))));
        assert_eq!(engine.load_count(), 2);
        drop(bytes);
    }

    #[test]
    fn clearing_the_source_cancels_and_goes_idle() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());
        session.set_source(url("https://example.com/a.pdf"));

        assert!(session.set_source(None));
        assert!(engine.is_cancelled(0));
        assert!(matches!(session.phase(), LoadPhase::Idle));
        assert!(session.try_next_event().is_none());
    }

    #[tokio::test]
    async fn closed_channel_without_terminal_event_becomes_an_engine_failure() {
        let engine = FakeEngine::new();
        let mut session = LoadSession::new(engine.clone());
        session.set_source(url("https://example.com/a.pdf"));

        engine.close(0);
        let event = session.next_event().await;
        assert!(session.apply_event(event));
        let error = session.error().expect("failure should be stored");
        assert_eq!(error.kind, LoadErrorKind::Engine);
    }
}
