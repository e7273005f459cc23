use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::{App, Prompt};
use crate::engine::{DocumentHandle, LoadError};
use crate::highlights::Highlight;
use crate::loader::{LoadView, ProgressSnapshot, dispatch, format_bytes};

use super::layout::centered_rect;

pub(crate) fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &App) {
    match dispatch(app.session.phase()) {
        LoadView::Placeholder => draw_placeholder(frame, area, app),
        LoadView::Progress(progress) => draw_progress_box(frame, area, progress),
        LoadView::Error(error) => draw_error_box(frame, area, error),
        LoadView::Document(document) => draw_document(frame, area, app, document),
    }
}

fn draw_placeholder(frame: &mut Frame<'_>, area: Rect, app: &App) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    if app.session.is_loading() {
        // a load is running but no usable progress has arrived yet
        let popup = centered_rect(area, area.width.min(34), area.height.min(5));
        let block = Block::default()
            .title("Loading")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Yellow));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        let message = Paragraph::new("Loading...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White));
        frame.render_widget(message, inner);
        return;
    }

    let lines = vec![
        Line::from("no document open"),
        Line::from(""),
        Line::from(vec![
            Span::styled("u", Style::default().fg(Color::White)),
            Span::styled("  open a url or doi", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::styled("o", Style::default().fg(Color::White)),
            Span::styled("  open a local file", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::styled("q", Style::default().fg(Color::White)),
            Span::styled("  quit", Style::default().fg(Color::DarkGray)),
        ]),
    ];
    let height = (lines.len() as u16).min(area.height);
    let popup = centered_rect(area, area.width.min(24), height);
    frame.render_widget(Paragraph::new(lines), popup);
}

fn draw_progress_box(frame: &mut Frame<'_>, area: Rect, progress: &ProgressSnapshot) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let popup = centered_rect(area, area.width.min(40), area.height.min(5));
    let block = Block::default()
        .title("Loading")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let lines = vec![
        Line::from(format!("Loading {}%", progress.percent())),
        Line::from(format!(
            "{} / {}",
            format_bytes(progress.loaded()),
            format_bytes(progress.total())
        )),
    ];
    let message = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White));
    frame.render_widget(message, inner);
}

fn draw_error_box(frame: &mut Frame<'_>, area: Rect, error: &LoadError) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let popup = centered_rect(area, area.width.min(60), area.height.min(7));
    let block = Block::default()
        .title("Load failed")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Red));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let message = Paragraph::new(error.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(message, inner);
}

fn draw_document(frame: &mut Frame<'_>, area: Rect, app: &App, document: &dyn DocumentHandle) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let title = app
        .state
        .source_label
        .clone()
        .unwrap_or_else(|| "document".to_string());
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height < 3 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // document facts
            Constraint::Length(1), // separator
            Constraint::Min(1),    // highlight list
        ])
        .split(inner);

    let page_size = match document
        .page_dimensions(app.state.cursor_page.saturating_sub(1))
        .ok()
    {
        Some((width, height)) => format!("{width:.0} x {height:.0} pt"),
        None => "unknown size".to_string(),
    };
    let facts = format!(
        " {} pages | {} | page {} is {}",
        document.page_count(),
        format_bytes(document.byte_len() as u64),
        app.state.cursor_page,
        page_size
    );
    frame.render_widget(
        Paragraph::new(facts).style(Style::default().fg(Color::DarkGray)),
        chunks[0],
    );

    frame.render_widget(
        Paragraph::new("─".repeat(inner.width as usize))
            .style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );

    draw_highlight_list(frame, chunks[2], app, inner.width as usize);
}

fn draw_highlight_list(frame: &mut Frame<'_>, area: Rect, app: &App, pad_width: usize) {
    let key = app.current_store_key();
    let highlights = key
        .as_deref()
        .map(|key| app.highlights.highlights(key))
        .unwrap_or(&[]);

    if highlights.is_empty() {
        frame.render_widget(
            Paragraph::new("no highlights yet; press a to comment on the current page")
                .style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let max_items = area.height as usize;
    if max_items == 0 {
        return;
    }
    let selected = app.state.selected_highlight.min(highlights.len() - 1);

    // keep the selection roughly centered once the list overflows
    let start = if highlights.len() <= max_items || selected < max_items / 2 {
        0
    } else if selected >= highlights.len() - max_items / 2 {
        highlights.len().saturating_sub(max_items)
    } else {
        selected.saturating_sub(max_items / 2)
    };

    let mut lines = Vec::new();
    for (offset, highlight) in highlights.iter().enumerate().skip(start).take(max_items) {
        lines.push(highlight_line(highlight, offset == selected, pad_width));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn highlight_line(highlight: &Highlight, selected: bool, width: usize) -> Line<'static> {
    let mut spans = Vec::new();
    if selected {
        spans.push(Span::styled(" ┃ ", Style::default().fg(Color::White)));
    } else {
        spans.push(Span::raw("   "));
    }

    let page_tag = format!("p{:<3}", highlight.page);
    let mut used = 3 + page_tag.chars().count() + 1 + highlight.comment.chars().count();
    spans.push(Span::styled(page_tag, Style::default().fg(Color::Cyan)));
    spans.push(Span::raw(" "));
    spans.push(Span::raw(highlight.comment.clone()));

    if !highlight.content.is_empty() {
        let excerpt = format!("  \"{}\"", truncate_chars(&highlight.content, 40));
        used += excerpt.chars().count();
        spans.push(Span::styled(excerpt, Style::default().fg(Color::DarkGray)));
    }

    let padding = " ".repeat(width.saturating_sub(used));
    spans.push(Span::raw(padding));

    let line_style = if selected {
        Style::default().bg(Color::Rgb(45, 45, 50))
    } else {
        Style::default()
    };
    Line::from(spans).style(line_style)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

pub(crate) fn draw_prompt_line(frame: &mut Frame<'_>, area: Rect, prompt: &Prompt) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let line = build_prompt_line(
        prompt.title(),
        prompt.value(),
        prompt.cursor(),
        area.width as usize,
    );
    frame.render_widget(Paragraph::new(line), area);
}

/// Software caret: the cell under the cursor is drawn reversed, and the
/// text is windowed so the caret never leaves the visible range.
fn build_prompt_line(title: &str, input: &str, cursor: usize, width: usize) -> Line<'static> {
    let prefix = format!(" {title}: ");
    let prefix_width = prefix.chars().count();
    let mut spans = vec![Span::styled(prefix, Style::default().fg(Color::White))];
    let max_text_width = width.saturating_sub(prefix_width);

    let chars: Vec<char> = input.chars().collect();
    let char_count = chars.len();
    let cursor = cursor.min(char_count);

    let mut start = 0usize;
    if max_text_width > 0 {
        if cursor >= max_text_width {
            start = cursor.saturating_sub(max_text_width.saturating_sub(1));
        }
        if start > char_count {
            start = char_count;
        }
    } else {
        start = char_count;
    }

    let text_width = max_text_width.max(1);
    let end = (start + text_width).min(char_count);
    let mut visible: Vec<char> = chars[start..end].to_vec();
    if visible.len() < text_width {
        visible.extend(std::iter::repeat_n(' ', text_width - visible.len()));
    }

    let caret_idx = cursor
        .saturating_sub(start)
        .min(text_width.saturating_sub(1));

    for (idx, ch) in visible.into_iter().enumerate() {
        if idx == caret_idx {
            spans.push(Span::styled(ch.to_string(), Style::default().reversed()));
        } else {
            spans.push(Span::raw(ch.to_string()));
        }
    }
    Line::from(spans)
}
