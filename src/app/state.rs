use chrono::{DateTime, Utc};

use crate::{
    app::route::Route,
    spotify::{
        top_items::{SeedOption, TimeWindow},
        RecommendedTrack, TopArtist, TopTrack,
    },
    wizard::{SeedType, WizardState, WizardView},
};

pub const GENERIC_ERROR: &str = "An error occurred. Please try again.";
pub const MISSING_TOKEN: &str = "Access token is missing.";
pub const RECOMMENDATIONS_FAILED: &str = "Failed to fetch recommendations.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveScreen {
    TopSongs,
    TopArtists,
    Recommend,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    SignedOut,
    SigningIn { url: Option<String> },
    SignedIn { expires_at: DateTime<Utc> },
}

/// One of the ranked lists, for the window in the current location.
#[derive(Debug, Clone)]
pub struct TopListState<T> {
    pub window: TimeWindow,
    pub items: Vec<T>,
    pub selected: usize,
    pub is_loading: bool,
    /// Items came from an expired cache entry after a failed refresh.
    pub is_stale: bool,
    pub request: u64,
}

impl<T> Default for TopListState<T> {
    fn default() -> Self {
        TopListState {
            window: TimeWindow::AllTime,
            items: Vec::new(),
            selected: 0,
            is_loading: false,
            is_stale: false,
            request: 0,
        }
    }
}

impl<T> TopListState<T> {
    pub fn start_loading(&mut self, window: TimeWindow, request: u64) {
        if self.window != window {
            self.items.clear();
            self.selected = 0;
        }
        self.window = window;
        self.is_loading = true;
        self.is_stale = false;
        self.request = request;
    }

    pub fn finish(&mut self, items: Vec<T>, is_stale: bool) {
        self.items = items;
        self.selected = self.selected.min(self.items.len().saturating_sub(1));
        self.is_loading = false;
        self.is_stale = is_stale;
    }

    pub fn fail(&mut self) {
        self.items.clear();
        self.selected = 0;
        self.is_loading = false;
        self.is_stale = false;
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let max = (self.items.len() - 1) as isize;
        self.selected = (self.selected as isize + delta).clamp(0, max) as usize;
    }

    pub fn current(&self) -> Option<&T> {
        self.items.get(self.selected)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendState {
    pub track_options: Option<Vec<SeedOption>>,
    pub artist_options: Option<Vec<SeedOption>>,
    pub is_loading: bool,
    pub load_failed: bool,
    /// Highlighted entry of the Track/Artist question.
    pub type_cursor: usize,
    pub wizard: WizardState,
}

impl RecommendState {
    pub const TYPE_CHOICES: [SeedType; 2] = [SeedType::Track, SeedType::Artist];

    /// Both lists must be in before the wizard starts.
    pub fn options_ready(&self) -> bool {
        self.track_options.is_some() && self.artist_options.is_some()
    }

    pub fn view(&self) -> WizardView {
        self.wizard.view(self.options_ready())
    }

    pub fn options_for(&self, seed_type: SeedType) -> &[SeedOption] {
        let options = match seed_type {
            SeedType::Track => &self.track_options,
            SeedType::Artist => &self.artist_options,
        };
        options.as_deref().unwrap_or(&[])
    }

    /// Options of the branch currently being chosen.
    pub fn current_options(&self) -> &[SeedOption] {
        match self.wizard.seed_type {
            Some(seed_type) => self.options_for(seed_type),
            None => &[],
        }
    }

    pub fn highlighted_type(&self) -> SeedType {
        Self::TYPE_CHOICES[self.type_cursor.min(Self::TYPE_CHOICES.len() - 1)]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultsState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub tracks: Vec<RecommendedTrack>,
    pub selected: usize,
    pub request: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Notification {
    pub message: String,
    pub remaining_ticks: u8,
    pub is_error: bool,
}

impl Notification {
    pub fn info(msg: impl Into<String>) -> Self {
        Notification { message: msg.into(), remaining_ticks: 30, is_error: false }
    }
    pub fn error(msg: impl Into<String>) -> Self {
        Notification { message: msg.into(), remaining_ticks: 40, is_error: true }
    }
}

pub struct AppState {
    pub route: Route,
    pub previous_route: Option<Route>,
    pub auth: AuthStatus,
    /// Display name of the signed-in account, once the profile has loaded.
    pub user_name: Option<String>,
    pub top_songs: TopListState<TopTrack>,
    pub top_artists: TopListState<TopArtist>,
    pub recommend: RecommendState,
    pub results: ResultsState,
    pub notification: Option<Notification>,
    pub show_help: bool,
    pub should_quit: bool,
    pub sign_in_requested: bool,
    pub tick: u64,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            route: Route::default(),
            previous_route: None,
            auth: AuthStatus::SignedOut,
            user_name: None,
            top_songs: TopListState::default(),
            top_artists: TopListState::default(),
            recommend: RecommendState::default(),
            results: ResultsState::default(),
            notification: None,
            show_help: false,
            should_quit: false,
            sign_in_requested: false,
            tick: 0,
        }
    }
}

impl AppState {
    pub fn active_screen(&self) -> ActiveScreen {
        match self.route {
            Route::TopSongs(_) => ActiveScreen::TopSongs,
            Route::TopArtists(_) => ActiveScreen::TopArtists,
            Route::Recommend => ActiveScreen::Recommend,
            Route::Results(_) => ActiveScreen::Results,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.auth, AuthStatus::SignedIn { .. })
    }

    pub fn navigate_to(&mut self, route: Route) {
        if self.route != route {
            self.previous_route = Some(self.route.clone());
            self.route = route;
        }
    }

    /// Drops everything fetched under the previous session.
    pub fn reset_data(&mut self) {
        self.user_name = None;
        self.top_songs = TopListState::default();
        self.top_artists = TopListState::default();
        self.recommend = RecommendState::default();
        self.results = ResultsState::default();
    }

    pub fn set_notification(&mut self, n: Notification) {
        self.notification = Some(n);
    }

    pub fn tick_notification(&mut self) {
        if let Some(ref mut n) = self.notification {
            if n.remaining_ticks > 0 {
                n.remaining_ticks -= 1;
            } else {
                self.notification = None;
            }
        }
    }

    pub fn spinner(&self) -> &'static str {
        const FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];
        FRAMES[(self.tick as usize) % FRAMES.len()]
    }
}
