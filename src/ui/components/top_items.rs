use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Tabs},
    Frame,
};
use strum::IntoEnumIterator;

use crate::{
    app::state::{AppState, TopListState},
    spotify::top_items::TimeWindow,
};
use super::{make_block, render_message, render_sign_in_prompt, truncate_str};
use super::super::theme::*;

pub fn render_top_songs(f: &mut Frame, area: Rect, state: &AppState) {
    if !state.is_signed_in() {
        render_sign_in_prompt(f, area, " ♫ Top Songs ", "view your top Spotify songs");
        return;
    }
    let list = &state.top_songs;
    let Some(body) = render_frame(f, area, state, list, " ♫ Top Songs ") else {
        return;
    };

    let title_width = (body.width as usize * 40 / 100).saturating_sub(1);
    let rows: Vec<Row> = list
        .items
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let is_sel = i == list.selected;
            let style = if is_sel { selected_style() } else { normal_style() };
            Row::new(vec![
                rank_cell(i, is_sel),
                Cell::from(truncate_str(&track.name, title_width)).style(style),
                Cell::from(track.artists.join(", ")).style(dim_style()),
                Cell::from(track.album.clone()).style(muted_style()),
            ])
            .style(style)
        })
        .collect();

    let header = Row::new(vec![
        Cell::from(" # ").style(header_style()),
        Cell::from("Title").style(header_style()),
        Cell::from("Artist").style(header_style()),
        Cell::from("Album").style(header_style()),
    ]);

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ],
    )
    .header(header)
    .block(make_block(&list_title(list, "songs"), true));
    f.render_widget(table, body);
}

pub fn render_top_artists(f: &mut Frame, area: Rect, state: &AppState) {
    if !state.is_signed_in() {
        render_sign_in_prompt(f, area, " ★ Top Artists ", "view your top Spotify artists");
        return;
    }
    let list = &state.top_artists;
    let Some(body) = render_frame(f, area, state, list, " ★ Top Artists ") else {
        return;
    };

    let rows: Vec<Row> = list
        .items
        .iter()
        .enumerate()
        .map(|(i, artist)| {
            let is_sel = i == list.selected;
            let style = if is_sel { selected_style() } else { normal_style() };
            let genres = artist.genres.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
            Row::new(vec![
                rank_cell(i, is_sel),
                Cell::from(artist.name.clone()).style(style),
                Cell::from(genres).style(dim_style()),
                Cell::from(popularity_bar(artist.popularity)).style(gold_style()),
            ])
            .style(style)
        })
        .collect();

    let header = Row::new(vec![
        Cell::from(" # ").style(header_style()),
        Cell::from("Artist").style(header_style()),
        Cell::from("Genres").style(header_style()),
        Cell::from("Popularity").style(header_style()),
    ]);

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Percentage(35),
            Constraint::Percentage(45),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(make_block(&list_title(list, "artists"), true));
    f.render_widget(table, body);
}

/// Draws the window tabs and any loading or empty state. Returns the area left
/// for the table when there are items to show.
fn render_frame<T>(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    list: &TopListState<T>,
    title: &str,
) -> Option<Rect> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let titles: Vec<Line> = TimeWindow::iter()
        .map(|w| Line::from(Span::raw(w.title())))
        .collect();
    let selected = TimeWindow::iter().position(|w| w == list.window).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(dim_style())
        .highlight_style(selected_style())
        .divider(Span::styled("│", muted_style()))
        .block(make_block(title, false));
    f.render_widget(tabs, chunks[0]);

    if list.is_loading && list.items.is_empty() {
        let para = Paragraph::new(Line::from(Span::styled(
            format!("  {} Loading...", state.spinner()),
            dim_style(),
        )))
        .block(make_block(title, true));
        f.render_widget(para, chunks[1]);
        return None;
    }

    if list.items.is_empty() {
        render_message(f, chunks[1], title, "No items found.", false);
        return None;
    }

    Some(chunks[1])
}

fn list_title<T>(list: &TopListState<T>, noun: &str) -> String {
    let mut title = format!(" {} {noun} · {} ", list.items.len(), list.window.title());
    if list.is_stale {
        title.push_str("· cached ");
    }
    if list.is_loading {
        title.push_str("· refreshing ");
    }
    title
}

fn rank_cell(i: usize, is_sel: bool) -> Cell<'static> {
    let num = if is_sel { " ▶".to_string() } else { format!("{:>3}", i + 1) };
    Cell::from(num).style(if is_sel { success_style() } else { muted_style() })
}

fn popularity_bar(popularity: u32) -> String {
    let filled = (popularity.min(100) as usize + 5) / 10;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}
