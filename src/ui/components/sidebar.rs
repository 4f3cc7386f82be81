use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::state::{ActiveScreen, AppState, AuthStatus};
use super::super::theme::*;
use super::truncate_str;

const NAV_ITEMS: &[(&str, &str, ActiveScreen)] = &[
    ("1", "♫  Top Songs",   ActiveScreen::TopSongs),
    ("2", "★  Top Artists", ActiveScreen::TopArtists),
    ("3", "✦  Recommend",   ActiveScreen::Recommend),
];

pub fn render_sidebar(f: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(Span::styled(" ● melodot ", title_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style(false))
        .style(normal_style());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // tagline
            Constraint::Length(4), // nav items
            Constraint::Length(1), // separator
            Constraint::Length(4), // session
            Constraint::Min(0),    // location
        ])
        .split(inner);

    // ── Tagline ────────────────────────────────────────
    let tagline = Paragraph::new(Line::from(vec![
        Span::styled(" what you ", dim_style()),
        Span::styled("actually", hot_pink_style()),
        Span::styled(" play", dim_style()),
    ]));
    f.render_widget(tagline, chunks[0]);

    // ── Nav items ──────────────────────────────────────
    // results live under the recommend entry
    let active = match state.active_screen() {
        ActiveScreen::Results => ActiveScreen::Recommend,
        other => other,
    };
    let items: Vec<ListItem> = NAV_ITEMS
        .iter()
        .map(|(key, label, screen)| {
            let is_active = active == *screen;
            let prefix = if is_active { " ▶ " } else { "   " };
            let style = if is_active {
                Style::default().fg(BG).bg(PRIMARY).add_modifier(Modifier::BOLD)
            } else {
                normal_style()
            };
            let line = Line::from(vec![
                Span::styled(prefix, if is_active { Style::default().fg(BG).bg(PRIMARY) } else { muted_style() }),
                Span::styled(format!("[{key}] {label}"), style),
                Span::styled(" ".repeat(area.width.saturating_sub(19) as usize), style),
            ]);
            ListItem::new(line)
        })
        .collect();
    f.render_widget(List::new(items), chunks[1]);

    // ── Separator ──────────────────────────────────────
    let sep_width = chunks[2].width.saturating_sub(4) as usize;
    let sep = Paragraph::new(Line::from(Span::styled(
        format!("  {}", "─".repeat(sep_width)),
        muted_style(),
    )));
    f.render_widget(sep, chunks[2]);

    render_session(f, chunks[3], state);

    // ── Location ───────────────────────────────────────
    let location = state.route.to_string();
    let para = Paragraph::new(vec![
        Line::from(Span::styled("  Location", accent_style())),
        Line::from(Span::styled(
            format!("  {location}"),
            muted_style(),
        )),
    ])
    .wrap(Wrap { trim: false });
    f.render_widget(para, chunks[4]);
}

fn render_session(f: &mut Frame, area: Rect, state: &AppState) {
    let lines = match &state.auth {
        AuthStatus::SignedIn { expires_at } => {
            let left = (*expires_at - Utc::now()).num_seconds().max(0);
            let style = if left < 300 { gold_style() } else { dim_style() };
            let who = match &state.user_name {
                Some(name) => {
                    format!("  ● {}", truncate_str(name, area.width.saturating_sub(4) as usize))
                }
                None => "  ● Signed in".to_string(),
            };
            vec![
                Line::from(Span::styled(who, success_style())),
                Line::from(Span::styled(
                    format!("    expires in {}:{:02}", left / 60, left % 60),
                    style,
                )),
                Line::from(Span::styled("    o sign out", muted_style())),
            ]
        }
        AuthStatus::SigningIn { .. } => vec![Line::from(Span::styled(
            format!("  {} Signing in...", state.spinner()),
            accent_style(),
        ))],
        AuthStatus::SignedOut => vec![
            Line::from(Span::styled("  ○ Signed out", error_style())),
            Line::from(Span::styled("    i sign in", muted_style())),
        ],
    };
    f.render_widget(Paragraph::new(lines), area);
}
