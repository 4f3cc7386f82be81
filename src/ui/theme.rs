use ratatui::style::{Color, Modifier, Style};

// ─── Color Palette ───────────────────────────────────────────────────────────
pub const BG:          Color = Color::Rgb(18,  18,  18);
pub const BG_ALT:      Color = Color::Rgb(24,  24,  28);
pub const SURFACE_SEL: Color = Color::Rgb(48,  34,  34);

pub const PRIMARY:     Color = Color::Rgb(243, 90,  75);  // coral
pub const ACCENT:      Color = Color::Rgb(30,  215, 96);  // spotify green
pub const HOT_PINK:    Color = Color::Rgb(241, 91,  181);
pub const GOLD:        Color = Color::Rgb(255, 210, 63);

pub const TEXT:        Color = Color::Rgb(230, 230, 230);
pub const TEXT_DIM:    Color = Color::Rgb(150, 150, 160);
pub const TEXT_MUTED:  Color = Color::Rgb(90,  90,  100);

pub const BORDER:      Color = Color::Rgb(60,  55,  60);
pub const BORDER_FOCUSED: Color = PRIMARY;

pub const ERROR:       Color = Color::Rgb(255, 90,  90);

// ─── Styles ──────────────────────────────────────────────────────────────────
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn accent_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(SURFACE_SEL)
        .fg(PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn normal_style() -> Style {
    Style::default().fg(TEXT)
}

pub fn dim_style() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn muted_style() -> Style {
    Style::default().fg(TEXT_MUTED)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(BORDER_FOCUSED)
    } else {
        Style::default().fg(BORDER)
    }
}

pub fn success_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn hot_pink_style() -> Style {
    Style::default().fg(HOT_PINK).add_modifier(Modifier::BOLD)
}

pub fn gold_style() -> Style {
    Style::default().fg(GOLD)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR).add_modifier(Modifier::BOLD)
}

pub fn header_style() -> Style {
    Style::default()
        .fg(BG)
        .bg(PRIMARY)
        .add_modifier(Modifier::BOLD)
}
