use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::state::AppState;
use super::{make_block, render_message};
use super::super::theme::*;

const TITLE: &str = " ✦ Recommendations ";

pub fn render_results(f: &mut Frame, area: Rect, state: &AppState) {
    let results = &state.results;

    if let Some(ref error) = results.error {
        render_message(f, area, TITLE, error, true);
        return;
    }

    if results.is_loading {
        let para = Paragraph::new(Line::from(Span::styled(
            format!("  {} Asking Spotify for recommendations...", state.spinner()),
            dim_style(),
        )))
        .block(make_block(TITLE, true));
        f.render_widget(para, area);
        return;
    }

    if results.tracks.is_empty() {
        render_message(f, area, TITLE, "No recommendations found.", false);
        return;
    }

    let rows: Vec<Row> = results
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let is_sel = i == results.selected;
            let style = if is_sel { selected_style() } else { normal_style() };
            let num = if is_sel { " ▶".to_string() } else { format!("{:>3}", i + 1) };
            Row::new(vec![
                Cell::from(num).style(if is_sel { success_style() } else { muted_style() }),
                Cell::from(track.name.clone()).style(style),
                Cell::from(track.artist_line()).style(dim_style()),
            ])
            .style(style)
        })
        .collect();

    let header = Row::new(vec![
        Cell::from(" # ").style(header_style()),
        Cell::from("Title").style(header_style()),
        Cell::from("Artist").style(header_style()),
    ]);

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ],
    )
    .header(header)
    .block(make_block(
        &format!(" ✦ Recommendations ({}) · Esc back ", results.tracks.len()),
        true,
    ));
    f.render_widget(table, area);
}
