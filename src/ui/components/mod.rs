pub mod help;
pub mod recommend;
pub mod results;
pub mod sidebar;
pub mod top_items;

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::theme::*;

pub(crate) fn make_block(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .title(Span::styled(title.to_string(), title_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style(focused))
        .style(normal_style().bg(BG))
}

/// Shown in place of any screen while nobody is signed in.
pub(crate) fn render_sign_in_prompt(f: &mut Frame, area: Rect, title: &str, what: &str) {
    let lines = vec![
        Line::from(Span::raw("")),
        Line::from(Span::styled(format!("  Please sign in to {what}."), normal_style())),
        Line::from(Span::raw("")),
        Line::from(vec![
            Span::styled("  Press ", dim_style()),
            Span::styled("i", accent_style()),
            Span::styled(" to sign in with Spotify", dim_style()),
        ]),
    ];
    let para = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(make_block(title, false));
    f.render_widget(para, area);
}

pub(crate) fn render_message(f: &mut Frame, area: Rect, title: &str, message: &str, is_error: bool) {
    let style = if is_error { error_style() } else { muted_style() };
    let para = Paragraph::new(Line::from(Span::styled(format!("  {message}"), style)))
        .block(make_block(title, !is_error));
    f.render_widget(para, area);
}

/// Cuts `s` to at most `max` terminal columns, marking the cut with `…`.
pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
