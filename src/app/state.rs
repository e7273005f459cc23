#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Viewing,
    Prompting,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: Mode,
    pub status: StatusState,
    /// Display name of the source currently driving the session, if any.
    pub source_label: Option<String>,
    /// 0-based index into the current document's highlight list.
    pub selected_highlight: usize,
    /// 1-based page the highlight cursor sits on. New highlights land here.
    pub cursor_page: usize,
    /// Highlight id requested by a `#highlight-<id>` fragment or the CLI.
    /// Consumed the first time a document becomes ready.
    pub pending_target: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: Mode::Viewing,
            status: StatusState::default(),
            source_label: None,
            selected_highlight: 0,
            cursor_page: 1,
            pending_target: None,
        }
    }
}
