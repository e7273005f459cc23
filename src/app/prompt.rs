use crossterm::event::{Event, KeyCode, KeyEvent};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

/// What the open prompt will do with its text on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PromptPurpose {
    OpenUrl,
    OpenFile,
    NewComment { page: usize },
    EditComment { highlight_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PromptKeyResult {
    Consumed,
    Cancelled,
    Submitted { purpose: PromptPurpose, text: String },
}

/// One-line free-text prompt at the bottom of the screen.
///
/// Holds the `tui_input` editing state; everything else about the key is
/// decided here so the caller only sees cancel/submit.
#[derive(Debug)]
pub(crate) struct Prompt {
    purpose: PromptPurpose,
    input: Input,
}

impl Prompt {
    pub(crate) fn open(purpose: PromptPurpose, seed: &str) -> Self {
        Self {
            purpose,
            input: Input::new(seed.to_string()),
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        match self.purpose {
            PromptPurpose::OpenUrl => "open url or doi",
            PromptPurpose::OpenFile => "open file",
            PromptPurpose::NewComment { .. } => "new comment",
            PromptPurpose::EditComment { .. } => "edit comment",
        }
    }

    pub(crate) fn value(&self) -> &str {
        self.input.value()
    }

    pub(crate) fn cursor(&self) -> usize {
        self.input.visual_cursor()
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> PromptKeyResult {
        match key.code {
            KeyCode::Esc => PromptKeyResult::Cancelled,
            KeyCode::Enter => PromptKeyResult::Submitted {
                purpose: self.purpose.clone(),
                text: self.input.value().to_string(),
            },
            _ => {
                self.input.handle_event(&Event::Key(key));
                PromptKeyResult::Consumed
            }
        }
    }
}
