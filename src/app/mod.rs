pub mod route;
pub mod state;

#[cfg(test)]
mod tests;

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, time};
use tracing::{debug, info, warn};

use crate::{
    app::{
        route::Route,
        state::{
            ActiveScreen, AppState, AuthStatus, Notification, ResultsState, GENERIC_ERROR,
            MISSING_TOKEN, RECOMMENDATIONS_FAILED,
        },
    },
    cache::{KeyValueStore, TimedCache},
    config::Config,
    error::FetchError,
    events::{map_key_to_action, KeyContext, UserAction},
    handoff::RecommendationQuery,
    session::{watcher::SessionExpired, ExpiryWatcher, Session, SessionProvider},
    spotify::{
        auth::wait_for_auth_code,
        authorize_url, build_auth_client, complete_auth,
        recommendations::RecommendationFetcher,
        restore_session,
        top_items::{SeedOption, TimeWindow, TopItemsFetcher},
        RecommendedTrack, SpotifyApi, TopArtist, TopTrack,
    },
    wizard::{SeedType, Toggle, WizardView, MAX_SEEDS},
};

const TICK_MS: u64 = 100;
/// Recommendation seeds come from the long-term lists.
const SEED_WINDOW: TimeWindow = TimeWindow::AllTime;

/// Outcome of a top-items load as the screens see it.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    Fresh(Vec<T>),
    /// The refresh failed; these came from an expired cache entry.
    Stale(Vec<T>),
    Failed(String),
}

/// Results of background work, tagged with the session generation they ran under.
#[derive(Debug)]
pub enum AppEvent {
    TopTracks {
        generation: u64,
        request: u64,
        loaded: Loaded<TopTrack>,
    },
    TopArtists {
        generation: u64,
        request: u64,
        loaded: Loaded<TopArtist>,
    },
    SeedOptions {
        generation: u64,
        tracks: Loaded<TopTrack>,
        artists: Loaded<TopArtist>,
    },
    Recommendations {
        generation: u64,
        request: u64,
        outcome: Result<Vec<RecommendedTrack>, FetchError>,
    },
}

impl AppEvent {
    fn generation(&self) -> u64 {
        match self {
            AppEvent::TopTracks { generation, .. }
            | AppEvent::TopArtists { generation, .. }
            | AppEvent::SeedOptions { generation, .. }
            | AppEvent::Recommendations { generation, .. } => *generation,
        }
    }
}

pub struct App {
    pub state: AppState,
    config: Config,
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn SpotifyApi>,
    sessions: SessionProvider,
    watcher: ExpiryWatcher,
    top_items: Arc<TopItemsFetcher>,
    recommender: Arc<RecommendationFetcher>,
    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
    expired_rx: mpsc::Receiver<SessionExpired>,
    next_request: u64,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>, api: Arc<dyn SpotifyApi>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(32);
        let (expired_tx, expired_rx) = mpsc::channel(4);
        let top_items = TopItemsFetcher::new(
            api.clone(),
            TimedCache::new(store.clone()),
            config.cache_ttl,
        );
        App {
            state: AppState::default(),
            sessions: SessionProvider::new(store.clone()),
            watcher: ExpiryWatcher::new(expired_tx),
            top_items: Arc::new(top_items),
            recommender: Arc::new(RecommendationFetcher::new(api.clone())),
            api,
            config,
            store,
            events_tx,
            events_rx,
            expired_rx,
            next_request: 0,
        }
    }

    pub async fn run<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut ratatui::Terminal<B>,
    ) -> Result<()> {
        // ── Session ──────────────────────────────────────────────────────────
        match restore_session(&self.store).await {
            Some(session) => self.sign_in_with(session),
            None => self.sign_in_interactive(terminal).await,
        }
        self.load_profile().await;
        self.enter_route();

        // ── Main event loop ───────────────────────────────────────────────────
        let mut tick_interval = time::interval(Duration::from_millis(TICK_MS));
        let mut event_stream = EventStream::new();

        loop {
            terminal.draw(|f| crate::ui::render(f, &self.state))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.state.tick = self.state.tick.wrapping_add(1);
                    self.state.tick_notification();
                }
                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                }
                Some(expired) = self.expired_rx.recv() => {
                    self.handle_expired(expired).await;
                }
                maybe_event = event_stream.next() => {
                    if let Some(Ok(Event::Key(key))) = maybe_event {
                        if let Some(action) = map_key_to_action(key, self.key_context()) {
                            self.handle_action(action).await;
                        }
                    }
                }
            }

            if self.state.sign_in_requested {
                self.state.sign_in_requested = false;
                self.sign_in_interactive(terminal).await;
                self.load_profile().await;
                self.enter_route();
            }

            if self.state.should_quit {
                break;
            }
        }

        self.watcher.disarm();
        Ok(())
    }

    // ── Session handling ──────────────────────────────────────────────────────
    async fn sign_in_interactive<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut ratatui::Terminal<B>,
    ) {
        self.state.auth = AuthStatus::SigningIn { url: None };
        match self.authenticate(terminal).await {
            Ok(session) => {
                self.sign_in_with(session);
                self.state
                    .set_notification(Notification::info("Connected to Spotify ✓"));
            }
            Err(e) => {
                warn!("Sign-in failed: {e:#}");
                self.state.auth = AuthStatus::SignedOut;
                self.state
                    .set_notification(Notification::error("Sign-in failed, press i to retry"));
            }
        }
    }

    async fn authenticate<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut ratatui::Terminal<B>,
    ) -> Result<Session> {
        let mut spotify = build_auth_client(&self.config);
        let url = authorize_url(&mut spotify)?;
        self.state.auth = AuthStatus::SigningIn { url: Some(url.clone()) };
        if let Err(e) = open::that(&url) {
            warn!("Could not open browser: {e}");
        }
        terminal.draw(|f| crate::ui::render(f, &self.state))?;

        let redirect = wait_for_auth_code(&self.config.redirect_bind_addr()).await?;
        complete_auth(&spotify, &redirect.code, &redirect.state, &self.store).await
    }

    pub fn sign_in_with(&mut self, session: Session) {
        self.state.reset_data();
        self.state.auth = AuthStatus::SignedIn {
            expires_at: session.expires_at,
        };
        let generation = self.sessions.sign_in(session.clone());
        self.watcher.arm(&session, generation);
        info!("Authenticated successfully");
    }

    /// Fetches the account's display name for the sidebar. Failure only costs the name.
    pub async fn load_profile(&mut self) {
        let token = match self.sessions.require(Utc::now()) {
            Ok(session) => session.access_token.clone(),
            Err(_) => return,
        };
        match self.api.current_user(&token).await {
            Ok(profile) => {
                info!("Signed in as {}", profile.id);
                self.state.user_name = Some(profile.label().to_string());
            }
            Err(e) => warn!("Could not load profile: {e}"),
        }
    }

    pub async fn sign_out(&mut self) {
        self.watcher.disarm();
        self.sessions.sign_out().await;
        self.state.auth = AuthStatus::SignedOut;
        self.state.reset_data();
    }

    async fn handle_expired(&mut self, expired: SessionExpired) {
        if expired.generation != self.sessions.generation() {
            debug!("Ignoring expiry of an older session");
            return;
        }
        warn!("Access token expired, signing out");
        self.sign_out().await;
        self.state.set_notification(Notification::error(
            "Session expired, press i to sign in again",
        ));
    }

    // ── Action handler ────────────────────────────────────────────────────────
    fn key_context(&self) -> KeyContext {
        if self.state.active_screen() == ActiveScreen::Recommend
            && self.state.recommend.wizard.selector.open
        {
            KeyContext::Selector
        } else {
            KeyContext::Normal
        }
    }

    pub async fn handle_action(&mut self, action: UserAction) {
        match action {
            UserAction::Quit => {
                self.state.should_quit = true;
            }
            UserAction::ToggleHelp => {
                self.state.show_help = !self.state.show_help;
            }
            UserAction::SwitchScreen(n) => {
                self.state.recommend.wizard.close_selector();
                let route = match n {
                    1 => Route::TopSongs(self.state.top_songs.window),
                    2 => Route::TopArtists(self.state.top_artists.window),
                    3 => Route::Recommend,
                    _ => return,
                };
                self.navigate(route);
            }
            UserAction::PrevTab => self.switch_window(-1),
            UserAction::NextTab => self.switch_window(1),
            UserAction::NavigateUp => self.move_cursor(-1),
            UserAction::NavigateDown => self.move_cursor(1),
            UserAction::Select => self.handle_select(),
            UserAction::Back => {
                if self.state.show_help {
                    self.state.show_help = false;
                } else if let Some(route) = self.state.previous_route.clone() {
                    self.state.recommend.wizard.close_selector();
                    self.navigate(route);
                } else if self.state.active_screen() == ActiveScreen::Results {
                    self.navigate(Route::Recommend);
                }
            }
            UserAction::ChooseSeedType(seed_type) => self.choose_seed_type(seed_type),
            UserAction::ToggleOption => self.toggle_option(),
            UserAction::CloseSelector => {
                self.state.recommend.wizard.close_selector();
            }
            UserAction::ClearWizard => {
                if self.state.active_screen() == ActiveScreen::Recommend {
                    self.state.recommend.wizard.clear();
                    self.state.recommend.type_cursor = 0;
                }
            }
            UserAction::SubmitWizard => self.submit_wizard(),
            UserAction::SignIn => {
                if !self.sessions.is_signed_in() {
                    self.state.sign_in_requested = true;
                }
            }
            UserAction::SignOut => {
                if self.sessions.is_signed_in() {
                    self.sign_out().await;
                    self.state.set_notification(Notification::info("Signed out"));
                }
            }
        }
    }

    // ── Navigation helpers ────────────────────────────────────────────────────
    /// Moves to `route` and starts whatever loads the new location needs.
    pub fn navigate(&mut self, route: Route) {
        info!("Navigating to {route}");
        self.state.navigate_to(route);
        self.enter_route();
    }

    fn switch_window(&mut self, delta: isize) {
        let Some(window) = self.state.route.window() else {
            return;
        };
        let windows = [TimeWindow::AllTime, TimeWindow::SixMonths, TimeWindow::OneMonth];
        let idx = windows.iter().position(|w| *w == window).unwrap_or(0) as isize;
        let next = windows[(idx + delta).rem_euclid(windows.len() as isize) as usize];
        let route = self.state.route.with_window(next);
        self.navigate(route);
    }

    fn move_cursor(&mut self, delta: isize) {
        match self.state.active_screen() {
            ActiveScreen::TopSongs => self.state.top_songs.move_selection(delta),
            ActiveScreen::TopArtists => self.state.top_artists.move_selection(delta),
            ActiveScreen::Recommend => {
                let recommend = &mut self.state.recommend;
                if recommend.wizard.selector.open {
                    let count = recommend.current_options().len();
                    recommend.wizard.move_cursor(delta, count);
                } else if recommend.view() == WizardView::ChoosingType {
                    let max = state::RecommendState::TYPE_CHOICES.len() as isize - 1;
                    recommend.type_cursor =
                        (recommend.type_cursor as isize + delta).clamp(0, max) as usize;
                }
            }
            ActiveScreen::Results => {
                let results = &mut self.state.results;
                let max = results.tracks.len().saturating_sub(1) as isize;
                results.selected = (results.selected as isize + delta).clamp(0, max) as usize;
            }
        }
    }

    fn handle_select(&mut self) {
        let uri = match self.state.active_screen() {
            ActiveScreen::TopSongs => self.state.top_songs.current().map(|t| t.uri.clone()),
            ActiveScreen::TopArtists => self.state.top_artists.current().map(|a| a.uri.clone()),
            ActiveScreen::Results => self
                .state
                .results
                .tracks
                .get(self.state.results.selected)
                .and_then(|t| t.id.as_ref())
                .map(|id| format!("spotify:track:{id}")),
            ActiveScreen::Recommend => {
                match self.state.recommend.view() {
                    WizardView::ChoosingType => {
                        let seed_type = self.state.recommend.highlighted_type();
                        self.choose_seed_type(seed_type);
                    }
                    WizardView::ChoosingTracks
                    | WizardView::ChoosingArtists
                    | WizardView::Summarized(_) => {
                        self.state.recommend.wizard.open_selector();
                    }
                    WizardView::Start => {}
                }
                None
            }
        };
        if let Some(uri) = uri {
            if let Err(e) = open::that(&uri) {
                warn!("Could not open {uri}: {e}");
                self.state
                    .set_notification(Notification::error("Could not open Spotify"));
            }
        }
    }

    // ── Wizard ────────────────────────────────────────────────────────────────
    fn choose_seed_type(&mut self, seed_type: SeedType) {
        let recommend = &mut self.state.recommend;
        if self.state.route != Route::Recommend || !recommend.options_ready() {
            return;
        }
        // leaving an open selector commits it before switching branches
        recommend.wizard.close_selector();
        recommend.wizard.choose_type(seed_type);
        recommend.type_cursor = state::RecommendState::TYPE_CHOICES
            .iter()
            .position(|t| *t == seed_type)
            .unwrap_or(0);
    }

    fn toggle_option(&mut self) {
        let recommend = &mut self.state.recommend;
        let options: Vec<SeedOption> = recommend.current_options().to_vec();
        if recommend.wizard.toggle_current(&options) == Toggle::LimitReached {
            self.state.set_notification(Notification::error(format!(
                "At most {MAX_SEEDS} seeds can be selected"
            )));
        }
    }

    fn submit_wizard(&mut self) {
        if self.state.active_screen() != ActiveScreen::Recommend {
            return;
        }
        self.state.recommend.wizard.close_selector();
        match self.state.recommend.wizard.submit() {
            Some(query) => self.navigate(Route::Results(query.encode())),
            None => self
                .state
                .set_notification(Notification::info("Pick at least one seed first")),
        }
    }

    // ── Spotify data loaders ──────────────────────────────────────────────────
    fn enter_route(&mut self) {
        self.state.show_help = false;
        if let Route::Results(query) = self.state.route.clone() {
            self.open_results(&query);
            return;
        }

        let session = match self.sessions.require(Utc::now()) {
            Ok(session) => session.clone(),
            Err(e) => {
                debug!("Not loading {}: {e}", self.state.route);
                return;
            }
        };
        match self.state.route.clone() {
            Route::TopSongs(window) => self.load_top_tracks(window, session),
            Route::TopArtists(window) => self.load_top_artists(window, session),
            Route::Recommend => {
                // a failed load is retried on the next visit
                let recommend = &self.state.recommend;
                if (!recommend.options_ready() || recommend.load_failed) && !recommend.is_loading {
                    self.load_seed_options(session);
                }
            }
            Route::Results(_) => {}
        }
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_request += 1;
        self.next_request
    }

    fn load_top_tracks(&mut self, window: TimeWindow, session: Session) {
        let request = self.next_request_id();
        self.state.top_songs.start_loading(window, request);
        let generation = self.sessions.generation();
        let fetcher = self.top_items.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let loaded = match fetcher.top_tracks(window, &session).await {
                Ok(items) => Loaded::Fresh(items),
                Err(e) => fallback(fetcher.cached_tracks(window).await, e),
            };
            let _ = tx
                .send(AppEvent::TopTracks { generation, request, loaded })
                .await;
        });
    }

    fn load_top_artists(&mut self, window: TimeWindow, session: Session) {
        let request = self.next_request_id();
        self.state.top_artists.start_loading(window, request);
        let generation = self.sessions.generation();
        let fetcher = self.top_items.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let loaded = match fetcher.top_artists(window, &session).await {
                Ok(items) => Loaded::Fresh(items),
                Err(e) => fallback(fetcher.cached_artists(window).await, e),
            };
            let _ = tx
                .send(AppEvent::TopArtists { generation, request, loaded })
                .await;
        });
    }

    /// Both seed lists load together; the wizard waits for the pair.
    fn load_seed_options(&mut self, session: Session) {
        self.state.recommend.is_loading = true;
        self.state.recommend.load_failed = false;
        let generation = self.sessions.generation();
        let fetcher = self.top_items.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let (tracks, artists) = tokio::join!(
                fetcher.top_tracks(SEED_WINDOW, &session),
                fetcher.top_artists(SEED_WINDOW, &session),
            );
            let tracks = match tracks {
                Ok(items) => Loaded::Fresh(items),
                Err(e) => fallback(fetcher.cached_tracks(SEED_WINDOW).await, e),
            };
            let artists = match artists {
                Ok(items) => Loaded::Fresh(items),
                Err(e) => fallback(fetcher.cached_artists(SEED_WINDOW).await, e),
            };
            let _ = tx
                .send(AppEvent::SeedOptions { generation, tracks, artists })
                .await;
        });
    }

    fn open_results(&mut self, raw_query: &str) {
        let request = self.next_request_id();
        self.state.results = ResultsState {
            request,
            ..Default::default()
        };

        let query = match RecommendationQuery::decode(raw_query) {
            Ok(query) => query,
            Err(e) => {
                warn!("Rejecting recommendation handoff: {e}");
                self.state.results.error = Some(GENERIC_ERROR.to_string());
                return;
            }
        };
        let session = match self.sessions.require(Utc::now()) {
            Ok(session) => session.clone(),
            Err(e) => {
                warn!("Cannot fetch recommendations: {e}");
                self.state.results.error = Some(MISSING_TOKEN.to_string());
                return;
            }
        };

        self.state.results.is_loading = true;
        let generation = self.sessions.generation();
        let recommender = self.recommender.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = recommender.fetch(&query, &session).await;
            let _ = tx
                .send(AppEvent::Recommendations { generation, request, outcome })
                .await;
        });
    }

    // ── Background results ────────────────────────────────────────────────────
    pub fn handle_event(&mut self, event: AppEvent) {
        if event.generation() != self.sessions.generation() {
            debug!("Dropping result from an earlier session");
            return;
        }

        match event {
            AppEvent::TopTracks { request, loaded, .. } => {
                if request != self.state.top_songs.request {
                    return;
                }
                match loaded {
                    Loaded::Fresh(items) => self.state.top_songs.finish(items, false),
                    Loaded::Stale(items) => {
                        self.state.top_songs.finish(items, true);
                        self.state.set_notification(Notification::error(
                            "Could not refresh, showing cached songs",
                        ));
                    }
                    Loaded::Failed(reason) => {
                        self.state.top_songs.fail();
                        self.state.set_notification(Notification::error(reason));
                    }
                }
            }
            AppEvent::TopArtists { request, loaded, .. } => {
                if request != self.state.top_artists.request {
                    return;
                }
                match loaded {
                    Loaded::Fresh(items) => self.state.top_artists.finish(items, false),
                    Loaded::Stale(items) => {
                        self.state.top_artists.finish(items, true);
                        self.state.set_notification(Notification::error(
                            "Could not refresh, showing cached artists",
                        ));
                    }
                    Loaded::Failed(reason) => {
                        self.state.top_artists.fail();
                        self.state.set_notification(Notification::error(reason));
                    }
                }
            }
            AppEvent::SeedOptions { tracks, artists, .. } => {
                let recommend = &mut self.state.recommend;
                recommend.is_loading = false;
                let mut failed = false;
                recommend.track_options = Some(seed_options(tracks, &mut failed));
                recommend.artist_options = Some(seed_options(artists, &mut failed));
                recommend.load_failed = failed;
                if failed {
                    self.state.set_notification(Notification::error(GENERIC_ERROR));
                }
            }
            AppEvent::Recommendations { request, outcome, .. } => {
                let results = &mut self.state.results;
                if request != results.request {
                    return;
                }
                results.is_loading = false;
                match outcome {
                    Ok(tracks) => {
                        results.tracks = tracks;
                        results.selected = 0;
                    }
                    Err(FetchError::Session(_)) => {
                        results.error = Some(MISSING_TOKEN.to_string());
                    }
                    Err(FetchError::Api(_)) => {
                        results.error = Some(RECOMMENDATIONS_FAILED.to_string());
                    }
                }
            }
        }
    }
}

fn fallback<T>(cached: Option<Vec<T>>, err: FetchError) -> Loaded<T> {
    match cached {
        Some(items) => {
            warn!("Refresh failed, serving stale cache: {err}");
            Loaded::Stale(items)
        }
        None => Loaded::Failed(format!("Could not load top items: {err}")),
    }
}

fn seed_options<T>(loaded: Loaded<T>, failed: &mut bool) -> Vec<SeedOption>
where
    for<'a> SeedOption: From<&'a T>,
{
    match loaded {
        Loaded::Fresh(items) | Loaded::Stale(items) => items.iter().map(SeedOption::from).collect(),
        Loaded::Failed(_) => {
            *failed = true;
            Vec::new()
        }
    }
}
