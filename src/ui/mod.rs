pub mod components;
pub mod theme;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::state::{ActiveScreen, AppState, AuthStatus};
use self::theme::*;
use self::components::{
    help::render_help,
    recommend::render_recommend,
    results::render_results,
    sidebar::render_sidebar,
    top_items::{render_top_artists, render_top_songs},
};

/// Root render function, called every frame
pub fn render(f: &mut Frame, state: &AppState) {
    let size = f.area();

    // ── Sidebar + content ────────────────────────────────────────────────
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(26), // sidebar
            Constraint::Min(0),     // main content
        ])
        .split(size);

    render_sidebar(f, chunks[0], state);

    match state.active_screen() {
        ActiveScreen::TopSongs   => render_top_songs(f, chunks[1], state),
        ActiveScreen::TopArtists => render_top_artists(f, chunks[1], state),
        ActiveScreen::Recommend  => render_recommend(f, chunks[1], state),
        ActiveScreen::Results    => render_results(f, chunks[1], state),
    }

    // ── Auth overlay while the browser handshake runs ─────────────────────
    if let AuthStatus::SigningIn { ref url } = state.auth {
        render_auth_overlay(f, size, url.as_deref());
    }

    if state.show_help {
        render_help(f, size);
    }

    // ── Notification toast ────────────────────────────────────────────────
    if let Some(ref notif) = state.notification {
        render_notification(f, size, notif.is_error, &notif.message);
    }
}

fn render_auth_overlay(f: &mut Frame, area: Rect, url: Option<&str>) {
    let popup = centered_rect(70, 50, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .title(Span::styled(" ● melodot · Spotify sign-in ", title_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(border_style(true))
        .style(normal_style().bg(BG_ALT));

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let lines = match url {
        Some(url) => vec![
            Line::from(Span::raw("")),
            Line::from(Span::styled("  Opening browser for Spotify login...", accent_style())),
            Line::from(Span::raw("")),
            Line::from(Span::styled("  If the browser didn't open, visit:", dim_style())),
            Line::from(Span::raw("")),
            Line::from(Span::styled(format!("  {url}"), hot_pink_style())),
            Line::from(Span::raw("")),
            Line::from(Span::styled("  Waiting for authorization...", dim_style())),
        ],
        None => vec![
            Line::from(Span::raw("")),
            Line::from(Span::styled("  Connecting to Spotify...", accent_style())),
        ],
    };

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false }),
        inner,
    );
}

fn render_notification(f: &mut Frame, area: Rect, is_error: bool, message: &str) {
    let toast_width = (message.width().min(60) as u16 + 6).min(area.width);
    let toast_area = Rect {
        x: area.width.saturating_sub(toast_width + 2),
        y: area.height.saturating_sub(4),
        width: toast_width,
        height: 3.min(area.height),
    };

    f.render_widget(Clear, toast_area);

    let style = if is_error { error_style() } else { success_style() };
    let icon = if is_error { "✖ " } else { "✔ " };

    let para = Paragraph::new(Line::from(vec![
        Span::styled(icon, style),
        Span::styled(message.to_string(), style),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(style),
    )
    .alignment(Alignment::Left);

    f.render_widget(para, toast_area);
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}
