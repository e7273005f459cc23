mod chrome;
mod layout;
mod views;

pub use chrome::draw_status;
pub use layout::{UiLayout, split_layout};

use ratatui::Frame;

use crate::app::App;

/// Renders one frame from the current app state.
pub fn draw(frame: &mut Frame<'_>, app: &App) {
    let layout = split_layout(frame.area(), app.prompt.is_some());

    views::draw_body(frame, layout.body, app);
    if let (Some(area), Some(prompt)) = (layout.prompt, app.prompt.as_ref()) {
        views::draw_prompt_line(frame, area, prompt);
    }

    let page_count = app
        .session
        .document()
        .map(|document| document.page_count());
    let highlight_count = app
        .current_store_key()
        .map(|key| app.highlights.highlights(&key).len())
        .unwrap_or(0);
    chrome::draw_status(frame, layout.status, &app.state, page_count, highlight_count);
}
