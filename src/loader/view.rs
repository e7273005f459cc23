use crate::engine::{DocumentHandle, LoadError};

use super::progress::ProgressSnapshot;
use super::session::LoadPhase;

/// What the UI should show for a phase. Exactly one of these holds; the
/// caller's match arms take the role of view callbacks.
pub enum LoadView<'a> {
    /// Nothing to show yet: no source, or loading without usable progress.
    Placeholder,
    Progress(&'a ProgressSnapshot),
    Document(&'a dyn DocumentHandle),
    Error(&'a LoadError),
}

/// Pure view selection: an error wins, then progress, then a ready
/// document. The precedence is structural in the phase type rather than
/// re-derived from flags.
pub fn dispatch(phase: &LoadPhase) -> LoadView<'_> {
    match phase {
        LoadPhase::Failed { error } => LoadView::Error(error),
        LoadPhase::Loading {
            progress: Some(progress),
        } => LoadView::Progress(progress),
        LoadPhase::Ready { document } => LoadView::Document(document.as_ref()),
        LoadPhase::Idle | LoadPhase::Loading { progress: None } => LoadView::Placeholder,
    }
}
