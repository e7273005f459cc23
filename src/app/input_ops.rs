use std::fs;
use std::path::Path;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::highlights::Highlight;
use crate::highlights::fragment::format_highlight_fragment;
use crate::source::{Source, resolve_url_input};

use super::core::App;
use super::prompt::{Prompt, PromptKeyResult, PromptPurpose};
use super::state::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Quit,
    PromptUrl,
    PromptFile,
    CloseDocument,
    NextHighlight,
    PrevHighlight,
    NextPage,
    PrevPage,
    AddComment,
    EditComment,
    DeleteHighlight,
    ClearHighlights,
    ShowLink,
}

pub(crate) fn map_viewing_key(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }

    match key.code {
        KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Char('u') => Some(Command::PromptUrl),
        KeyCode::Char('o') => Some(Command::PromptFile),
        KeyCode::Char('w') => Some(Command::CloseDocument),
        KeyCode::Char('j') | KeyCode::Down => Some(Command::NextHighlight),
        KeyCode::Char('k') | KeyCode::Up => Some(Command::PrevHighlight),
        KeyCode::Char(']') | KeyCode::PageDown => Some(Command::NextPage),
        KeyCode::Char('[') | KeyCode::PageUp => Some(Command::PrevPage),
        KeyCode::Char('a') => Some(Command::AddComment),
        KeyCode::Char('e') => Some(Command::EditComment),
        KeyCode::Char('d') => Some(Command::DeleteHighlight),
        KeyCode::Char('X') => Some(Command::ClearHighlights),
        KeyCode::Char('y') => Some(Command::ShowLink),
        _ => None,
    }
}

pub(crate) struct InputEventOutcome {
    pub(crate) quit_requested: bool,
    pub(crate) redraw: bool,
}

impl InputEventOutcome {
    fn none() -> Self {
        Self {
            quit_requested: false,
            redraw: false,
        }
    }

    fn redraw() -> Self {
        Self {
            quit_requested: false,
            redraw: true,
        }
    }
}

impl App {
    pub(crate) fn handle_input_event(&mut self, event: Event) -> InputEventOutcome {
        match event {
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) => {
                self.handle_key_event(key)
            }
            Event::Resize(_, _) => InputEventOutcome::redraw(),
            _ => InputEventOutcome::none(),
        }
    }

    pub(crate) fn handle_key_event(&mut self, key: KeyEvent) -> InputEventOutcome {
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }
        match map_viewing_key(key) {
            Some(command) => self.execute(command),
            None => InputEventOutcome::none(),
        }
    }

    fn execute(&mut self, command: Command) -> InputEventOutcome {
        match command {
            Command::Quit => {
                return InputEventOutcome {
                    quit_requested: true,
                    redraw: false,
                };
            }
            Command::PromptUrl => {
                let seed = match self.session.source() {
                    Some(Source::RemoteUrl(url)) => url.clone(),
                    _ => String::new(),
                };
                self.open_prompt(PromptPurpose::OpenUrl, &seed);
            }
            Command::PromptFile => self.open_prompt(PromptPurpose::OpenFile, ""),
            Command::CloseDocument => {
                self.change_source(None, None);
            }
            Command::NextHighlight => self.move_selection(1),
            Command::PrevHighlight => self.move_selection(-1),
            Command::NextPage => self.move_cursor_page(1),
            Command::PrevPage => self.move_cursor_page(-1),
            Command::AddComment => {
                if self.session.document().is_some() {
                    let page = self.state.cursor_page;
                    self.open_prompt(PromptPurpose::NewComment { page }, "");
                } else {
                    self.state.status.message = "no document".to_string();
                }
            }
            Command::EditComment => {
                let seed = self
                    .selected_highlight()
                    .map(|highlight| (highlight.id.clone(), highlight.comment.clone()));
                match seed {
                    Some((highlight_id, comment)) => {
                        self.open_prompt(PromptPurpose::EditComment { highlight_id }, &comment);
                    }
                    None => self.state.status.message = "no highlight selected".to_string(),
                }
            }
            Command::DeleteHighlight => self.delete_selected_highlight(),
            Command::ClearHighlights => self.clear_highlights(),
            Command::ShowLink => self.show_selected_link(),
        }
        InputEventOutcome::redraw()
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> InputEventOutcome {
        let Some(prompt) = self.prompt.as_mut() else {
            return InputEventOutcome::none();
        };
        match prompt.handle_key(key) {
            PromptKeyResult::Consumed => {}
            PromptKeyResult::Cancelled => self.close_prompt(),
            PromptKeyResult::Submitted { purpose, text } => {
                self.close_prompt();
                self.submit_prompt(purpose, text);
            }
        }
        InputEventOutcome::redraw()
    }

    fn open_prompt(&mut self, purpose: PromptPurpose, seed: &str) {
        self.prompt = Some(Prompt::open(purpose, seed));
        self.state.mode = Mode::Prompting;
    }

    fn close_prompt(&mut self) {
        self.prompt = None;
        self.state.mode = Mode::Viewing;
    }

    fn submit_prompt(&mut self, purpose: PromptPurpose, text: String) {
        match purpose {
            PromptPurpose::OpenUrl => self.open_url_input(&text),
            PromptPurpose::OpenFile => self.open_file_input(text.trim()),
            PromptPurpose::NewComment { page } => self.add_comment(page, text),
            PromptPurpose::EditComment { highlight_id } => {
                self.apply_comment_edit(&highlight_id, text);
            }
        }
    }

    /// Replaces the session source and resets per-document cursor state.
    /// Returns whether anything actually changed.
    pub fn change_source(&mut self, source: Option<Source>, label: Option<String>) -> bool {
        let changed = self.session.set_source(source);
        if !changed {
            return false;
        }

        self.state.source_label = label.or_else(|| self.session.source().map(Source::label));
        self.state.selected_highlight = 0;
        self.state.cursor_page = 1;
        self.state.status.message = match &self.state.source_label {
            Some(label) => format!("opening {label}"),
            None => "document closed".to_string(),
        };
        true
    }

    fn open_url_input(&mut self, raw: &str) {
        let resolved = resolve_url_input(raw);
        self.state.pending_target = resolved.highlight_target;
        if !self.change_source(resolved.source, None) {
            // same document; a fragment can still move the selection
            self.try_apply_pending_target();
        }
    }

    fn open_file_input(&mut self, path: &str) {
        if path.is_empty() {
            self.state.status.message = "no file given".to_string();
            return;
        }
        match fs::read(path) {
            Ok(bytes) => {
                let label = Path::new(path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string());
                self.state.pending_target = None;
                self.change_source(Some(Source::from_bytes(bytes)), Some(label));
            }
            Err(err) => {
                log::warn!("could not read {path}: {err}");
                self.state.status.message = format!("could not read {path}: {err}");
            }
        }
    }

    fn add_comment(&mut self, page: usize, text: String) {
        let Some(key) = self.current_store_key() else {
            self.state.status.message = "no document".to_string();
            return;
        };
        self.highlights.add(&key, Highlight::new(page, text));
        // new entries are prepended
        self.state.selected_highlight = 0;
        self.state.status.message = format!("comment added on page {page}");
    }

    fn apply_comment_edit(&mut self, highlight_id: &str, text: String) {
        let Some(key) = self.current_store_key() else {
            return;
        };
        if self.highlights.edit_comment(&key, highlight_id, text) {
            self.state.status.message = "comment updated".to_string();
        } else {
            self.state.status.message = "highlight is gone".to_string();
        }
    }

    fn delete_selected_highlight(&mut self) {
        let target = self
            .selected_highlight()
            .map(|highlight| highlight.id.clone());
        let (Some(key), Some(id)) = (self.current_store_key(), target) else {
            self.state.status.message = "no highlight selected".to_string();
            return;
        };
        if self.highlights.remove(&key, &id) {
            let len = self.highlights.highlights(&key).len();
            self.state.selected_highlight =
                self.state.selected_highlight.min(len.saturating_sub(1));
            self.state.status.message = "highlight removed".to_string();
        }
    }

    fn clear_highlights(&mut self) {
        let Some(key) = self.current_store_key() else {
            self.state.status.message = "no document".to_string();
            return;
        };
        let removed = self.highlights.clear(&key);
        self.state.selected_highlight = 0;
        self.state.status.message = format!("{removed} highlights cleared");
    }

    fn show_selected_link(&mut self) {
        let target = self
            .selected_highlight()
            .map(|highlight| highlight.id.clone());
        let Some(id) = target else {
            self.state.status.message = "no highlight selected".to_string();
            return;
        };
        let fragment = format_highlight_fragment(&id);
        self.state.status.message = match self.session.source() {
            Some(Source::RemoteUrl(url)) => format!("{url}{fragment}"),
            _ => fragment,
        };
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.current_highlight_count();
        if len == 0 {
            self.state.status.message = "no highlights".to_string();
            return;
        }
        let current = self.state.selected_highlight;
        self.state.selected_highlight = if delta < 0 {
            current.saturating_sub(1)
        } else {
            (current + 1).min(len - 1)
        };
        self.sync_cursor_to_selection();
    }

    fn move_cursor_page(&mut self, delta: isize) {
        let Some(pages) = self
            .session
            .document()
            .map(|document| document.page_count())
        else {
            self.state.status.message = "no document".to_string();
            return;
        };
        let current = self.state.cursor_page;
        self.state.cursor_page = if delta < 0 {
            current.saturating_sub(1).max(1)
        } else {
            (current + 1).min(pages.max(1))
        };
    }

    fn sync_cursor_to_selection(&mut self) {
        let page = self.selected_highlight().map(|highlight| highlight.page);
        if let Some(page) = page {
            self.state.cursor_page = page;
        }
    }

    /// Moves selection and page cursor to the pending `#highlight-<id>`
    /// target. The target is consumed on the first attempt against a ready
    /// document, whether or not the highlight still exists.
    pub(crate) fn try_apply_pending_target(&mut self) {
        if self.state.pending_target.is_none() || self.session.document().is_none() {
            return;
        }
        let Some(target) = self.state.pending_target.take() else {
            return;
        };
        let Some(key) = self.current_store_key() else {
            return;
        };

        match self.highlights.position(&key, &target) {
            Some(index) => {
                self.state.selected_highlight = index;
                self.sync_cursor_to_selection();
                self.state.status.message = format!("jumped to highlight {target}");
            }
            None => {
                log::debug!("highlight target {target} not found");
                self.state.status.message = format!("highlight not found: {target}");
            }
        }
    }

    pub(crate) fn current_store_key(&self) -> Option<String> {
        self.session.source().map(Source::identity_key)
    }

    pub(crate) fn selected_highlight(&self) -> Option<&Highlight> {
        let key = self.current_store_key()?;
        self.highlights
            .highlights(&key)
            .get(self.state.selected_highlight)
    }

    fn current_highlight_count(&self) -> usize {
        match self.current_store_key() {
            Some(key) => self.highlights.highlights(&key).len(),
            None => 0,
        }
    }
}
