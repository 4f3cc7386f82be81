use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::{
    app::state::{AppState, RecommendState},
    wizard::{SeedType, WizardView, MAX_SEEDS},
};
use super::{make_block, render_sign_in_prompt, truncate_str};
use super::super::theme::*;

const TITLE: &str = " ✦ Recommend ";

pub fn render_recommend(f: &mut Frame, area: Rect, state: &AppState) {
    if !state.is_signed_in() {
        render_sign_in_prompt(f, area, TITLE, "get recommendations");
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let recommend = &state.recommend;
    match recommend.view() {
        WizardView::Start => {
            let para = Paragraph::new(Line::from(Span::styled(
                format!("  {} Loading your top songs and artists...", state.spinner()),
                dim_style(),
            )))
            .block(make_block(TITLE, true));
            f.render_widget(para, chunks[0]);
        }
        WizardView::ChoosingType => render_type_question(f, chunks[0], recommend),
        WizardView::ChoosingTracks => render_choosing(f, chunks[0], recommend, SeedType::Track),
        WizardView::ChoosingArtists => render_choosing(f, chunks[0], recommend, SeedType::Artist),
        WizardView::Summarized(seed_type) => render_summary(f, chunks[0], recommend, seed_type),
    }

    render_actions(f, chunks[1], recommend);
}

fn render_type_question(f: &mut Frame, area: Rect, recommend: &RecommendState) {
    let mut lines = vec![
        Line::from(Span::raw("")),
        Line::from(Span::styled(
            "  Do you want recommendations based on songs or artists?",
            normal_style(),
        )),
        Line::from(Span::raw("")),
    ];
    for (i, seed_type) in RecommendState::TYPE_CHOICES.iter().enumerate() {
        let is_sel = i == recommend.type_cursor;
        let (key, label) = match seed_type {
            SeedType::Track => ("t", "Songs"),
            SeedType::Artist => ("a", "Artists"),
        };
        lines.push(Line::from(vec![
            Span::styled(if is_sel { "  ▶ " } else { "    " }, success_style()),
            Span::styled(format!("[{key}] "), muted_style()),
            Span::styled(label, if is_sel { selected_style() } else { normal_style() }),
        ]));
    }
    if recommend.load_failed {
        lines.push(Line::from(Span::raw("")));
        lines.push(Line::from(Span::styled(
            "  Some of your top items could not be loaded. Reopen [3] to retry.",
            error_style(),
        )));
    }
    f.render_widget(Paragraph::new(lines).block(make_block(TITLE, true)), area);
}

fn render_choosing(f: &mut Frame, area: Rect, recommend: &RecommendState, seed_type: SeedType) {
    let noun = noun(seed_type);
    let wizard = &recommend.wizard;
    let options = recommend.options_for(seed_type);

    if !wizard.selector.open {
        let para = Paragraph::new(vec![
            Line::from(Span::raw("")),
            Line::from(Span::styled(format!("  No {noun} selected yet."), dim_style())),
            Line::from(vec![
                Span::styled("  Press ", dim_style()),
                Span::styled("Enter", accent_style()),
                Span::styled(format!(" to pick up to {MAX_SEEDS} {noun}."), dim_style()),
            ]),
        ])
        .block(make_block(TITLE, true));
        f.render_widget(para, area);
        return;
    }

    if options.is_empty() {
        let para = Paragraph::new(Line::from(Span::styled(
            format!("  No {noun} to choose from."),
            muted_style(),
        )))
        .block(make_block(TITLE, true));
        f.render_widget(para, area);
        return;
    }

    let width = area.width.saturating_sub(12) as usize;
    let items: Vec<ListItem> = options
        .iter()
        .map(|option| {
            let checked = wizard.selector.pending.contains(&option.value);
            let mark = if checked { "[x] " } else { "[ ] " };
            ListItem::new(Line::from(vec![
                Span::styled(mark, if checked { success_style() } else { muted_style() }),
                Span::styled(
                    truncate_str(&option.label, width),
                    if checked { normal_style() } else { dim_style() },
                ),
            ]))
        })
        .collect();

    let title = format!(
        " Select {noun} · {}/{MAX_SEEDS} ",
        wizard.selector.pending.len()
    );
    let list = List::new(items)
        .block(make_block(&title, true))
        .highlight_style(selected_style())
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default().with_selected(Some(wizard.selector.cursor));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_summary(f: &mut Frame, area: Rect, recommend: &RecommendState, seed_type: SeedType) {
    let sentence = recommend
        .wizard
        .summary_sentence(recommend.options_for(seed_type))
        .unwrap_or_default();
    let para = Paragraph::new(vec![
        Line::from(Span::raw("")),
        Line::from(Span::styled(format!("  {sentence}"), normal_style())),
        Line::from(Span::raw("")),
        Line::from(vec![
            Span::styled("  Enter", accent_style()),
            Span::styled(format!(" edit {}", noun(seed_type)), dim_style()),
        ]),
    ])
    .wrap(Wrap { trim: false })
    .block(make_block(TITLE, true));
    f.render_widget(para, area);
}

fn render_actions(f: &mut Frame, area: Rect, recommend: &RecommendState) {
    let submit_style = if recommend.wizard.submit_ready() {
        success_style()
    } else {
        muted_style()
    };
    let hint = if recommend.wizard.selector.open {
        "  Space toggle · Enter done"
    } else {
        "  t songs · a artists"
    };
    let line = Line::from(vec![
        Span::styled(hint, dim_style()),
        Span::styled("   [x] Clear", hot_pink_style()),
        Span::styled("   [s] Submit", submit_style),
    ]);
    f.render_widget(Paragraph::new(line).block(make_block("", false)), area);
}

fn noun(seed_type: SeedType) -> &'static str {
    match seed_type {
        SeedType::Track => "songs",
        SeedType::Artist => "artists",
    }
}
