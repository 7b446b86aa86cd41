use chirp_card::{BodyView, CardView, DELETE_CONFIRMATION, MediaView};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::state::{AppState, InputMode};

const ACCENT: Color = Color::Cyan;
const BORDER: Color = Color::DarkGray;
const MUTED: Color = Color::DarkGray;
const WARNING: Color = Color::Yellow;
const ERROR: Color = Color::Red;

pub fn draw(frame: &mut Frame, state: &AppState, views: &[CardView]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(frame.area());

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[0]);

    draw_feed(frame, state, views, main_chunks[0]);
    draw_card(frame, views.get(state.selected), main_chunks[1]);
    draw_status_bar(frame, state, chunks[1]);

    if let Some(alert) = &state.alert {
        draw_modal(frame, " Alert ", alert, ERROR);
    } else {
        match state.input_mode {
            InputMode::ConfirmDelete => draw_modal(
                frame,
                " Delete ",
                &format!("{DELETE_CONFIRMATION}\n\n[y] yes   [n] no"),
                WARNING,
            ),
            InputMode::AttachPath => draw_modal(
                frame,
                " Attach photo (image/*) ",
                &format!("> {}", state.path_buffer),
                ACCENT,
            ),
            InputMode::Normal | InputMode::Editing => {}
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn draw_feed(frame: &mut Frame, state: &AppState, views: &[CardView], area: Rect) {
    let block = Block::default()
        .title(" Feed ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER));

    let mut items: Vec<ListItem> = views
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let preview = match &view.body {
                BodyView::Text(text) => first_line(text),
                BodyView::Editor { draft } => first_line(draft),
            };
            let mut spans = vec![
                Span::styled(
                    format!("{} ", view.author),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(preview.to_string()),
            ];
            if view.is_editing() {
                spans.push(Span::styled(" *", Style::default().fg(WARNING)));
            }
            let mut item = ListItem::new(Line::from(spans));
            if i == state.selected {
                item = item.style(Style::default().bg(Color::Rgb(40, 44, 52)));
            }
            item
        })
        .collect();

    if items.is_empty() {
        items.push(ListItem::new(Line::from(Span::styled(
            "No posts yet",
            Style::default().fg(MUTED),
        ))));
    }

    frame.render_widget(List::new(items).block(block), area);
}

fn draw_card(frame: &mut Frame, view: Option<&CardView>, area: Rect) {
    let Some(view) = view else {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER));
        let paragraph = Paragraph::new("Select a post")
            .style(Style::default().fg(MUTED))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let border = if view.is_editing() { ACCENT } else { BORDER };
    let block = Block::default()
        .title(format!(" {} ", view.author))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let mut lines: Vec<Line> = Vec::new();

    match &view.body {
        BodyView::Text(text) => {
            lines.extend(text.lines().map(|line| Line::from(line.to_string())));
        }
        BodyView::Editor { draft } => {
            let mut draft_lines: Vec<Line> = draft
                .split('\n')
                .map(|line| Line::from(line.to_string()))
                .collect();
            if let Some(last) = draft_lines.last_mut() {
                last.push_span(Span::styled("▏", Style::default().fg(ACCENT)));
            }
            lines.extend(draft_lines);
        }
    }
    lines.push(Line::default());

    match &view.media {
        MediaView::None => {}
        MediaView::Photo { url } => {
            lines.push(Line::from(vec![
                Span::styled("photo ", Style::default().fg(MUTED)),
                Span::styled(url.clone(), Style::default().add_modifier(Modifier::UNDERLINED)),
            ]));
        }
        MediaView::Picker { accept, selected } => {
            let chosen = selected.as_deref().unwrap_or("no file chosen");
            lines.push(Line::from(vec![
                Span::styled(format!("[choose photo ({accept})] "), Style::default().fg(ACCENT)),
                Span::raw(chosen.to_string()),
            ]));
        }
    }

    if let Some(controls) = &view.controls {
        let mut spans = vec![
            Span::styled(
                format!("[{}] {}", if view.is_editing() { "ctrl+s" } else { "e" }, controls.edit_label),
                Style::default().fg(ACCENT),
            ),
            Span::raw("  "),
        ];
        if view.is_editing() {
            spans.push(Span::styled("[ctrl+o] photo", Style::default().fg(ACCENT)));
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("[d] {}", controls.delete_label),
            Style::default().fg(ERROR),
        ));
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let mode = match state.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Editing => "EDIT",
        InputMode::AttachPath => "ATTACH",
        InputMode::ConfirmDelete => "DELETE",
    };
    let viewer = state.viewer.as_deref().unwrap_or("signed out");

    let mut text = format!(" {mode} │ {viewer} │ {} posts ", state.card_count);
    if let Some(status) = &state.status {
        text.push_str("│ ");
        text.push_str(status);
        text.push(' ');
    }

    let status = Paragraph::new(text).style(
        Style::default()
            .bg(Color::Rgb(40, 44, 52))
            .fg(ACCENT)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(status, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_modal(frame: &mut Frame, title: &str, text: &str, color: Color) {
    let height = text.lines().count() as u16 + 2;
    let area = centered(frame.area(), 60, height.max(3));

    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let paragraph = Paragraph::new(text.to_string())
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}
