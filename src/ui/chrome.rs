use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Paragraph, Wrap};

use crate::app::{AppState, Mode};

pub fn draw_status(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    page_count: Option<usize>,
    highlight_count: usize,
) {
    let mode = match state.mode {
        Mode::Viewing => "VIEW",
        Mode::Prompting => "PROMPT",
    };

    let context = match page_count {
        Some(pages) => {
            let page_total = pages.max(1);
            let page_now = state.cursor_page.min(page_total);
            format!("page {page_now}/{page_total} | {highlight_count} highlights")
        }
        None => "no document".to_string(),
    };
    let message = if state.status.message.is_empty() {
        "-"
    } else {
        state.status.message.as_str()
    };

    let status_text = format!("{context} | {message} | {mode}");
    let status = Paragraph::new(status_text)
        .style(Style::default())
        .wrap(Wrap { trim: true });
    frame.render_widget(status, area);
}
