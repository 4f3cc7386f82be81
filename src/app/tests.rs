use super::*;
use crate::{
    cache::MemoryStore,
    error::ApiError,
    spotify::top_items::{cache_key, EntityType},
    test_support::{sample_tracks, MockApi},
    wizard::Toggle,
};
use chrono::Duration as ChronoDuration;

fn app_with(api: &Arc<MockApi>) -> (App, Arc<dyn KeyValueStore>) {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let app = App::new(Config::for_tests(), store.clone(), api.clone());
    (app, store)
}

fn live_session() -> Session {
    Session::new("tok", Utc::now() + ChronoDuration::hours(1))
}

/// Applies the next background result.
async fn pump(app: &mut App) {
    let event = time::timeout(Duration::from_secs(2), app.events_rx.recv())
        .await
        .expect("background result")
        .expect("channel open");
    app.handle_event(event);
}

fn assert_no_event(app: &mut App) {
    assert!(app.events_rx.try_recv().is_err());
}

#[tokio::test]
async fn signed_out_recommend_fetches_nothing() {
    let api = Arc::new(MockApi::with_items(5, 5));
    let (mut app, _) = app_with(&api);

    app.navigate(Route::Recommend);
    tokio::task::yield_now().await;

    assert!(!app.state.is_signed_in());
    assert!(!app.state.recommend.is_loading);
    assert_eq!(app.state.recommend.view(), WizardView::Start);
    assert_eq!(api.top_calls(), 0);
    assert_no_event(&mut app);
}

#[tokio::test]
async fn recommend_waits_for_both_lists_then_asks_for_type() {
    let api = Arc::new(MockApi::with_items(4, 3));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());

    app.navigate(Route::Recommend);
    assert!(app.state.recommend.is_loading);
    assert_eq!(app.state.recommend.view(), WizardView::Start);

    pump(&mut app).await;
    assert_eq!(api.top_calls(), 2);
    assert_eq!(api.last_window(), Some(TimeWindow::AllTime));
    assert_eq!(app.state.recommend.view(), WizardView::ChoosingType);
    assert_eq!(app.state.recommend.options_for(SeedType::Track).len(), 4);
    assert_eq!(app.state.recommend.options_for(SeedType::Artist).len(), 3);

    // coming back does not refetch
    app.navigate(Route::TopArtists(TimeWindow::AllTime));
    pump(&mut app).await;
    app.navigate(Route::Recommend);
    assert!(!app.state.recommend.is_loading);
    assert_eq!(api.top_calls(), 2);
}

#[tokio::test]
async fn failed_seed_lists_reload_on_next_visit() {
    let api = Arc::new(MockApi::flaky(2, 4, 3));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());

    app.navigate(Route::Recommend);
    pump(&mut app).await;
    assert!(app.state.recommend.load_failed);
    assert_eq!(app.state.recommend.view(), WizardView::ChoosingType);
    assert!(app.state.recommend.options_for(SeedType::Track).is_empty());

    app.navigate(Route::TopSongs(TimeWindow::AllTime));
    pump(&mut app).await;
    app.navigate(Route::Recommend);
    assert!(app.state.recommend.is_loading);
    pump(&mut app).await;

    // songs come from the entry the top songs screen just cached
    assert_eq!(api.top_calls(), 4);
    assert!(!app.state.recommend.load_failed);
    assert_eq!(app.state.recommend.options_for(SeedType::Track).len(), 4);
    assert_eq!(app.state.recommend.options_for(SeedType::Artist).len(), 3);
}

async fn ready_wizard(api: &Arc<MockApi>) -> App {
    let (mut app, _) = app_with(api);
    app.sign_in_with(live_session());
    app.navigate(Route::Recommend);
    pump(&mut app).await;
    app
}

#[tokio::test]
async fn picking_artists_summarizes_and_enables_submit() {
    let api = Arc::new(MockApi::with_items(3, 3));
    let mut app = ready_wizard(&api).await;

    app.handle_action(UserAction::ChooseSeedType(SeedType::Artist)).await;
    assert_eq!(app.key_context(), KeyContext::Selector);
    app.handle_action(UserAction::ToggleOption).await;
    app.handle_action(UserAction::NavigateDown).await;
    app.handle_action(UserAction::ToggleOption).await;
    app.handle_action(UserAction::CloseSelector).await;

    let recommend = &app.state.recommend;
    assert_eq!(recommend.view(), WizardView::Summarized(SeedType::Artist));
    assert_eq!(
        recommend
            .wizard
            .summary_sentence(recommend.options_for(SeedType::Artist))
            .as_deref(),
        Some("With the artists Artist 0, Artist 1 as a seed.")
    );
    assert!(recommend.wizard.can_submit());
}

#[tokio::test]
async fn clear_returns_to_type_question() {
    let api = Arc::new(MockApi::with_items(3, 3));
    let mut app = ready_wizard(&api).await;
    app.handle_action(UserAction::ChooseSeedType(SeedType::Artist)).await;
    app.handle_action(UserAction::ToggleOption).await;
    app.handle_action(UserAction::CloseSelector).await;

    app.handle_action(UserAction::ClearWizard).await;

    let recommend = &app.state.recommend;
    assert_eq!(recommend.view(), WizardView::ChoosingType);
    assert!(recommend.wizard.selected_artist_ids.is_empty());
    assert!(recommend.wizard.selected_track_ids.is_empty());
    assert!(!recommend.wizard.can_submit());
}

#[tokio::test]
async fn switching_screens_commits_open_selector() {
    let api = Arc::new(MockApi::with_items(3, 3));
    let mut app = ready_wizard(&api).await;
    app.handle_action(UserAction::ChooseSeedType(SeedType::Track)).await;
    app.handle_action(UserAction::ToggleOption).await;

    app.handle_action(UserAction::SwitchScreen(1)).await;
    pump(&mut app).await;
    app.handle_action(UserAction::SwitchScreen(3)).await;

    assert_eq!(
        app.state.recommend.view(),
        WizardView::Summarized(SeedType::Track)
    );
    assert_eq!(app.state.recommend.wizard.selected_track_ids, vec!["track0"]);
}

#[tokio::test]
async fn empty_handoff_errors_without_network() {
    let api = Arc::new(MockApi::with_items(3, 3));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());

    app.navigate(Route::Results(
        "selectedOption=&selectedSongs=%5B%5D&selectedArtists=%5B%5D".to_string(),
    ));

    assert_eq!(app.state.results.error.as_deref(), Some(GENERIC_ERROR));
    assert!(!app.state.results.is_loading);
    tokio::task::yield_now().await;
    assert_eq!(api.recommendation_calls(), 0);
    assert_no_event(&mut app);
}

#[tokio::test]
async fn failed_refresh_shows_stale_entry() {
    let api = Arc::new(MockApi::failing(ApiError::Status(503)));
    let (mut app, store) = app_with(&api);
    let two_hours_ago = Utc::now() - ChronoDuration::hours(2);
    TimedCache::new(store.clone())
        .put_at(
            &cache_key(EntityType::Track, TimeWindow::AllTime),
            &sample_tracks(3),
            two_hours_ago,
        )
        .await
        .unwrap();
    app.sign_in_with(live_session());

    app.navigate(Route::TopSongs(TimeWindow::AllTime));
    pump(&mut app).await;

    assert_eq!(api.top_calls(), 1);
    assert_eq!(app.state.top_songs.items.len(), 3);
    assert!(app.state.top_songs.is_stale);
    assert!(app.state.notification.as_ref().is_some_and(|n| n.is_error));

    // the stale entry is still there for the next load
    app.navigate(Route::TopSongs(TimeWindow::SixMonths));
    pump(&mut app).await;
    app.navigate(Route::TopSongs(TimeWindow::AllTime));
    pump(&mut app).await;
    assert_eq!(app.state.top_songs.items.len(), 3);
}

#[tokio::test]
async fn failed_load_without_cache_is_empty() {
    let api = Arc::new(MockApi::failing(ApiError::Transport("offline".into())));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());

    app.navigate(Route::TopArtists(TimeWindow::OneMonth));
    pump(&mut app).await;

    assert!(app.state.top_artists.items.is_empty());
    assert!(!app.state.top_artists.is_loading);
    assert!(!app.state.top_artists.is_stale);
}

#[tokio::test]
async fn tab_switch_rewrites_location_and_fetches_window() {
    let api = Arc::new(MockApi::with_items(2, 2));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());
    app.navigate(Route::TopSongs(TimeWindow::AllTime));
    pump(&mut app).await;

    app.handle_action(UserAction::NextTab).await;
    assert_eq!(app.state.route.to_string(), "/top-songs#last-6-months");
    pump(&mut app).await;
    assert_eq!(api.last_window(), Some(TimeWindow::SixMonths));

    app.handle_action(UserAction::PrevTab).await;
    app.handle_action(UserAction::PrevTab).await;
    assert_eq!(app.state.route.to_string(), "/top-songs#last-month");
}

#[tokio::test]
async fn only_latest_request_lands() {
    let api = Arc::new(MockApi::with_items(2, 2));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());

    app.navigate(Route::TopSongs(TimeWindow::AllTime));
    app.navigate(Route::TopSongs(TimeWindow::OneMonth));
    pump(&mut app).await;
    pump(&mut app).await;

    assert_eq!(app.state.top_songs.window, TimeWindow::OneMonth);
    assert!(!app.state.top_songs.is_loading);
    assert_eq!(app.state.top_songs.items.len(), 2);
}

#[tokio::test]
async fn results_from_before_sign_out_are_dropped() {
    let api = Arc::new(MockApi::with_items(2, 2));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());
    app.navigate(Route::TopSongs(TimeWindow::AllTime));

    app.handle_action(UserAction::SignOut).await;
    pump(&mut app).await;

    assert!(!app.state.is_signed_in());
    assert!(app.state.top_songs.items.is_empty());
}

#[tokio::test]
async fn submit_hands_off_and_loads_recommendations() {
    let api = Arc::new(MockApi::with_items(3, 3).with_recommendations(4));
    let mut app = ready_wizard(&api).await;
    app.handle_action(UserAction::ChooseSeedType(SeedType::Track)).await;
    app.handle_action(UserAction::ToggleOption).await;
    app.handle_action(UserAction::NavigateDown).await;
    app.handle_action(UserAction::NavigateDown).await;
    app.handle_action(UserAction::ToggleOption).await;

    // submitting straight from the open selector commits it first
    assert!(!app.state.recommend.wizard.can_submit());
    assert!(app.state.recommend.wizard.submit_ready());
    app.handle_action(UserAction::SubmitWizard).await;
    assert_eq!(app.state.active_screen(), ActiveScreen::Results);
    assert!(app.state.results.is_loading);
    pump(&mut app).await;

    assert_eq!(app.state.results.tracks.len(), 4);
    assert_eq!(
        api.last_seed(),
        Some(crate::handoff::Seed::Tracks(vec![
            "track0".to_string(),
            "track2".to_string()
        ]))
    );

    app.handle_action(UserAction::Back).await;
    assert_eq!(app.state.route, Route::Recommend);
}

#[tokio::test]
async fn recommendation_failure_shows_message() {
    let api = Arc::new(MockApi::failing(ApiError::Status(500)));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());
    let query = RecommendationQuery::new(crate::handoff::Seed::Artists(vec!["a".into()]));

    app.navigate(Route::Results(query.encode()));
    pump(&mut app).await;

    assert_eq!(app.state.results.error.as_deref(), Some(RECOMMENDATIONS_FAILED));
    assert!(app.state.results.tracks.is_empty());
}

#[tokio::test]
async fn results_without_session_report_missing_token() {
    let api = Arc::new(MockApi::with_items(0, 0));
    let (mut app, _) = app_with(&api);
    let query = RecommendationQuery::new(crate::handoff::Seed::Artists(vec!["a".into()]));

    app.navigate(Route::Results(query.encode()));

    assert_eq!(app.state.results.error.as_deref(), Some(MISSING_TOKEN));
    assert_eq!(api.recommendation_calls(), 0);
}

#[tokio::test]
async fn seed_limit_is_reported() {
    let api = Arc::new(MockApi::with_items(8, 0));
    let mut app = ready_wizard(&api).await;
    app.handle_action(UserAction::ChooseSeedType(SeedType::Track)).await;
    for _ in 0..MAX_SEEDS {
        app.handle_action(UserAction::ToggleOption).await;
        app.handle_action(UserAction::NavigateDown).await;
    }
    assert!(app.state.notification.is_none());

    let options = app.state.recommend.current_options().to_vec();
    assert_eq!(
        app.state.recommend.wizard.toggle_current(&options),
        Toggle::LimitReached
    );
    app.handle_action(UserAction::ToggleOption).await;
    assert!(app.state.notification.as_ref().is_some_and(|n| n.is_error));
}

#[tokio::test]
async fn back_returns_to_previous_location() {
    let api = Arc::new(MockApi::with_items(0, 0));
    let (mut app, _) = app_with(&api);
    app.navigate(Route::TopArtists(TimeWindow::SixMonths));
    app.navigate(Route::Recommend);

    app.handle_action(UserAction::ToggleHelp).await;
    app.handle_action(UserAction::Back).await;
    assert!(!app.state.show_help);
    assert_eq!(app.state.route, Route::Recommend);

    app.handle_action(UserAction::Back).await;
    assert_eq!(app.state.route, Route::TopArtists(TimeWindow::SixMonths));
    assert_eq!(app.state.previous_route, Some(Route::Recommend));
}

#[tokio::test]
async fn profile_name_follows_the_session() {
    let api = Arc::new(MockApi::with_items(0, 0));
    let (mut app, _) = app_with(&api);
    app.load_profile().await;
    assert!(app.state.user_name.is_none());

    app.sign_in_with(live_session());
    app.load_profile().await;
    assert_eq!(app.state.user_name.as_deref(), Some("Test Listener"));

    app.handle_action(UserAction::SignOut).await;
    assert!(app.state.user_name.is_none());
}

#[tokio::test]
async fn profile_failure_leaves_name_unset() {
    let api = Arc::new(MockApi::failing(ApiError::Unauthorized));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());

    app.load_profile().await;

    assert!(app.state.is_signed_in());
    assert!(app.state.user_name.is_none());
}

#[tokio::test]
async fn expiry_of_current_session_signs_out() {
    let api = Arc::new(MockApi::with_items(1, 1));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(live_session());
    let generation = app.sessions.generation();

    app.handle_expired(SessionExpired { generation: generation - 1 }).await;
    assert!(app.state.is_signed_in());

    app.handle_expired(SessionExpired { generation }).await;
    assert!(!app.state.is_signed_in());
    assert!(!app.watcher.is_armed());
}

#[tokio::test]
async fn watcher_reports_expiry_through_channel() {
    let api = Arc::new(MockApi::with_items(1, 1));
    let (mut app, _) = app_with(&api);
    app.sign_in_with(Session::new("tok", Utc::now() + ChronoDuration::milliseconds(20)));

    let expired = time::timeout(Duration::from_secs(2), app.expired_rx.recv())
        .await
        .expect("expiry signal")
        .expect("channel open");
    app.handle_expired(expired).await;
    assert_eq!(app.state.auth, AuthStatus::SignedOut);
}
