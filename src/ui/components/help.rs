use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::{ui::centered_rect, wizard::MAX_SEEDS};
use super::super::theme::*;

pub fn render_help(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(64, 70, area);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(" ? Keybindings ", title_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(border_style(true))
        .style(normal_style());

    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(inner);

    let left = vec![
        section("Navigation"),
        Line::from(Span::raw("")),
        key_line("1 / 2 / 3", "Songs / Artists / Recommend"),
        key_line("← / →", "Previous / next period"),
        key_line("↑ / ↓", "Move"),
        key_line("Enter", "Open in Spotify"),
        key_line("Esc / b", "Back"),
        Line::from(Span::raw("")),
        section("Session"),
        Line::from(Span::raw("")),
        key_line("i", "Sign in"),
        key_line("o", "Sign out"),
        key_line("?", "Toggle this help"),
        key_line("q", "Quit"),
    ];

    let right = vec![
        section("Recommend"),
        Line::from(Span::raw("")),
        key_line("t / a", "Seed by songs / artists"),
        key_line("Enter", "Pick or edit seeds"),
        key_line("Space", "Toggle seed"),
        key_line("Enter / Esc", "Done picking"),
        key_line("x", "Clear"),
        key_line("s", "Submit"),
        Line::from(Span::raw("")),
        Line::from(Span::styled(
            format!("  Up to {MAX_SEEDS} seeds per request."),
            muted_style(),
        )),
    ];

    f.render_widget(Paragraph::new(left), cols[0]);
    f.render_widget(Paragraph::new(right), cols[1]);
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {title}"),
        hot_pink_style().add_modifier(Modifier::BOLD),
    ))
}

fn key_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled("  ", muted_style()),
        Span::styled(format!("{key:<12}"), accent_style()),
        Span::styled(desc.to_string(), normal_style()),
    ])
}
