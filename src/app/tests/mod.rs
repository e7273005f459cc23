
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;

use crate::engine::{CancelHandle, DocumentEngine, DocumentHandle, LoadTask, TaskEvent};
use crate::error::AppResult;
use crate::source::Source;

struct FakeLoad {
    events: Option<UnboundedSender<TaskEvent>>,
    cancel: CancelHandle,
}

#[derive(Default)]
pub(super) struct FakeEngine {
    loads: Mutex<Vec<FakeLoad>>,
}

impl FakeEngine {
    pub(super) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(super) fn load_count(&self) -> usize {
        self.loads.lock().expect("fake engine lock").len()
    }

    pub(super) fn is_cancelled(&self, index: usize) -> bool {
        self.loads.lock().expect("fake engine lock")[index]
            .cancel
            .is_cancelled()
    }

    pub(super) fn send(&self, index: usize, event: TaskEvent) -> bool {
        let loads = self.loads.lock().expect("fake engine lock");
        match &loads[index].events {
            Some(events) => events.send(event).is_ok(),
            None => false,
        }
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

pub(super) struct FakeDocument {
    pages: usize,
}

impl FakeDocument {
    pub(super) fn boxed(pages: usize) -> Box<dyn DocumentHandle> {
        Box::new(Self { pages })
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
        4096
    }
}
